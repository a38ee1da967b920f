//! Mock transport shared by the verifier and stream tests.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use tensalis_contracts::{error::TensalisResult, request::Method};

use crate::traits::Transport;

/// One request the stub received.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) payload: Option<Value>,
}

type Responder = Box<dyn Fn(usize, Option<&Value>) -> TensalisResult<Value> + Send + Sync>;

/// A transport that records every call and answers from a closure.
///
/// The closure receives the zero-based call index and the payload.
pub(crate) struct StubTransport {
    pub(crate) calls: Arc<Mutex<Vec<RecordedCall>>>,
    responder: Responder,
}

impl StubTransport {
    pub(crate) fn new<F>(responder: F) -> Self
    where
        F: Fn(usize, Option<&Value>) -> TensalisResult<Value> + Send + Sync + 'static,
    {
        Self {
            calls: Arc::new(Mutex::new(vec![])),
            responder: Box::new(responder),
        }
    }

    /// A stub that answers every call with the same body.
    pub(crate) fn always(body: Value) -> Self {
        Self::new(move |_, _| Ok(body.clone()))
    }
}

impl Transport for StubTransport {
    fn send(&self, method: Method, path: &str, payload: Option<&Value>) -> TensalisResult<Value> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                method,
                path: path.to_string(),
                payload: payload.cloned(),
            });
            calls.len() - 1
        };
        (self.responder)(index, payload)
    }
}
