//! Scripted exchange and recording sleeper shared by the client tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use tensalis_contracts::request::Method;

use crate::exchange::{AttemptFailure, Exchange, RawResponse};
use crate::retry::Sleeper;

/// One attempt the scripted exchange received.
#[derive(Debug, Clone)]
pub(crate) struct Attempt {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) payload: Option<Value>,
}

/// An exchange that replays a fixed script of outcomes, one per attempt.
pub(crate) struct ScriptedExchange {
    script: Mutex<VecDeque<Result<RawResponse, AttemptFailure>>>,
    pub(crate) attempts: Arc<Mutex<Vec<Attempt>>>,
}

impl ScriptedExchange {
    pub(crate) fn new(script: Vec<Result<RawResponse, AttemptFailure>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            attempts: Arc::new(Mutex::new(vec![])),
        }
    }
}

impl Exchange for ScriptedExchange {
    fn execute(
        &self,
        method: Method,
        url: &str,
        payload: Option<&Value>,
    ) -> Result<RawResponse, AttemptFailure> {
        self.attempts.lock().unwrap().push(Attempt {
            method,
            url: url.to_string(),
            payload: payload.cloned(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted exchange ran out of outcomes")
    }
}

/// A sleeper that records requested durations instead of waiting.
#[derive(Default)]
pub(crate) struct RecordingSleeper {
    pub(crate) sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

pub(crate) fn ok(body: &str) -> Result<RawResponse, AttemptFailure> {
    Ok(RawResponse::new(200, body))
}

pub(crate) fn timeout() -> Result<RawResponse, AttemptFailure> {
    Err(AttemptFailure::Timeout("request timed out after 30s".to_string()))
}

pub(crate) fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().map(|s| Duration::from_secs(*s)).collect()
}
