//! Single-shot verification against the Tensalis API.
//!
//! `Verifier` owns a `Transport` and turns caller input into wire requests:
//!
//!   validate → normalize context → build payload → Transport::send → Verdict
//!
//! Input is validated before anything touches the network. A blank response
//! or an empty context is rejected with `TensalisError::Validation`; the
//! transport is never called for input that could not produce a meaningful
//! verdict. Transport errors are returned unchanged.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use tensalis_contracts::{
    context::Context,
    error::{TensalisError, TensalisResult},
    request::{
        BatchItem, BatchRequest, Method, VerifyRequest, HEALTH_PATH, USAGE_PATH, VERIFY_BATCH_PATH,
        VERIFY_PATH,
    },
    verdict::Verdict,
};

use crate::stream::VerifyStream;
use crate::traits::Transport;

/// Tokens between checks when the caller does not choose an interval.
pub const DEFAULT_CHECK_INTERVAL: usize = 50;

/// Issues verification requests through a `Transport`.
///
/// One verifier can serve any number of sequential calls and streaming
/// sessions; it holds no per-call state.
pub struct Verifier {
    transport: Box<dyn Transport>,
}

impl Verifier {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Verify `response` against `context`.
    ///
    /// `context` may be a single passage or a list of passages; both produce
    /// the same `reference_facts` array on the wire. `metadata`, when given,
    /// must be a JSON object and is forwarded for server-side logging. An
    /// empty object is treated as absent.
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank response, an empty context, or non-object metadata
    /// - any error the transport returns, unchanged
    /// - `InvalidResponse` if the server's body is not a verdict
    pub fn verify(
        &self,
        response: &str,
        context: impl Into<Context>,
        metadata: Option<&Value>,
    ) -> TensalisResult<Verdict> {
        let context = context.into();
        self.verify_against(response, &context, metadata)
    }

    /// Verify against an already-normalized context.
    ///
    /// The streaming engine calls this on every check so the session's
    /// context is never cloned or re-normalized.
    pub(crate) fn verify_against(
        &self,
        response: &str,
        context: &Context,
        metadata: Option<&Value>,
    ) -> TensalisResult<Verdict> {
        validate_response("response", response)?;
        validate_context("context", context)?;
        let metadata = normalize_metadata(metadata)?;

        let payload = encode_body(&VerifyRequest {
            response,
            reference_facts: context,
            metadata,
        })?;

        debug!(
            response_chars = response.len(),
            passages = context.len(),
            has_metadata = metadata.is_some(),
            "sending verification request"
        );

        let body = self.transport.send(Method::Post, VERIFY_PATH, Some(&payload))?;
        let verdict = Verdict::from_value(body)?;

        if verdict.is_blocked() {
            warn!(
                severity = ?verdict.severity(),
                reason = verdict.reason().unwrap_or("unspecified"),
                layer = verdict.layer().unwrap_or("unspecified"),
                "response blocked"
            );
        } else {
            debug!(status = %verdict.status(), latency_ms = ?verdict.latency_ms(), "verdict received");
        }

        Ok(verdict)
    }

    /// Verify several independent responses in one request.
    ///
    /// Every item is validated like `verify` before the request is sent.
    /// Results are returned in the order the server lists them; a response
    /// with no `results` key yields an empty list.
    pub fn verify_batch(&self, items: &[BatchItem]) -> TensalisResult<Vec<Verdict>> {
        if items.is_empty() {
            return Err(TensalisError::validation(
                "items",
                "batch must contain at least one item",
            ));
        }
        for (i, item) in items.iter().enumerate() {
            validate_response(&format!("items[{i}].response"), &item.response)?;
            validate_context(&format!("items[{i}].context"), &item.context)?;
        }

        let payload = encode_body(&BatchRequest { items })?;

        debug!(items = items.len(), "sending batch verification request");
        let body = self.transport.send(Method::Post, VERIFY_BATCH_PATH, Some(&payload))?;

        let results = match body.get("results") {
            None | Some(Value::Null) => return Ok(vec![]),
            Some(Value::Array(results)) => results.clone(),
            Some(other) => {
                return Err(TensalisError::InvalidResponse {
                    reason: format!("batch 'results' must be an array, got {other}"),
                })
            }
        };

        results.into_iter().map(Verdict::from_value).collect()
    }

    /// Start a streaming verification session over `chunks`.
    ///
    /// See [`VerifyStream`] for the checking cadence and termination rules.
    /// Nothing is pulled from `chunks` until the returned stream is polled.
    ///
    /// # Errors
    ///
    /// `Validation` if `context` is empty or `check_interval` is zero.
    pub fn verify_stream<I>(
        &self,
        chunks: I,
        context: impl Into<Context>,
        check_interval: usize,
    ) -> TensalisResult<VerifyStream<'_, I::IntoIter>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        VerifyStream::new(self, chunks.into_iter(), context.into(), check_interval)
    }

    /// Query the service's health endpoint.
    pub fn health(&self) -> TensalisResult<Value> {
        self.transport.send(Method::Get, HEALTH_PATH, None)
    }

    /// Query usage statistics for the configured API key.
    pub fn usage(&self) -> TensalisResult<Value> {
        self.transport.send(Method::Get, USAGE_PATH, None)
    }
}

/// Encode a request body.
///
/// Request bodies are strings, string lists and caller-validated JSON
/// objects, none of which can fail to encode. Should one ever fail, it is a
/// defect in this crate, not in the caller's input, so it is reported as
/// `InvalidResponse` rather than `Validation`.
fn encode_body<T: Serialize>(body: &T) -> TensalisResult<Value> {
    serde_json::to_value(body).map_err(|e| TensalisError::InvalidResponse {
        reason: format!("cannot encode request body: {e}"),
    })
}

fn validate_response(field: &str, response: &str) -> TensalisResult<()> {
    if response.trim().is_empty() {
        return Err(TensalisError::validation(field, "response text must not be empty"));
    }
    Ok(())
}

pub(crate) fn validate_context(field: &str, context: &Context) -> TensalisResult<()> {
    if context.is_empty() {
        return Err(TensalisError::validation(
            field,
            "context must contain at least one non-empty passage",
        ));
    }
    Ok(())
}

fn normalize_metadata(metadata: Option<&Value>) -> TensalisResult<Option<&Value>> {
    match metadata {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) if value.is_object() => Ok(Some(value)),
        Some(other) => Err(TensalisError::validation(
            "metadata",
            format!("metadata must be a JSON object, got {other}"),
        )),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use tensalis_contracts::{
        error::TensalisError,
        request::{BatchItem, Method},
        verdict::Severity,
    };

    use super::Verifier;
    use crate::test_support::StubTransport;

    fn verified() -> serde_json::Value {
        json!({ "status": "VERIFIED", "latency_ms": 5 })
    }

    // ── verify ────────────────────────────────────────────────────────────────

    #[test]
    fn test_verify_returns_verdict() {
        let transport = StubTransport::always(verified());
        let calls = transport.calls.clone();
        let verifier = Verifier::new(Box::new(transport));

        let verdict = verifier
            .verify("The sky is blue.", vec!["The sky appears blue during clear days."], None)
            .unwrap();

        assert!(verdict.is_verified());
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, Method::Post);
        assert_eq!(calls[0].path, "/verify");
    }

    /// The contradiction scenario from the service documentation.
    #[test]
    fn test_verify_blocked_contradiction() {
        let transport = StubTransport::always(json!({
            "status": "BLOCKED",
            "severity": "HIGH",
            "reason": "Contradiction detected"
        }));
        let verifier = Verifier::new(Box::new(transport));

        let verdict = verifier
            .verify("Returns within 90 days", vec!["Returns within 30 days"], None)
            .unwrap();

        assert!(verdict.is_blocked());
        assert_eq!(verdict.severity(), Some(Severity::High));
        assert_eq!(verdict.severity().unwrap().as_str(), "HIGH");
        assert_eq!(verdict.reason(), Some("Contradiction detected"));
    }

    #[test]
    fn test_string_context_sends_same_payload_as_list() {
        let transport = StubTransport::always(verified());
        let calls = transport.calls.clone();
        let verifier = Verifier::new(Box::new(transport));

        verifier.verify("Test response.", "Single context string.", None).unwrap();
        verifier.verify("Test response.", vec!["Single context string."], None).unwrap();

        let calls = calls.lock().unwrap();
        let from_str = calls[0].payload.as_ref().unwrap();
        let from_list = calls[1].payload.as_ref().unwrap();
        assert_eq!(from_str, from_list);
        assert_eq!(from_str["reference_facts"], json!(["Single context string."]));
    }

    #[test]
    fn test_verify_forwards_metadata() {
        let transport = StubTransport::always(verified());
        let calls = transport.calls.clone();
        let verifier = Verifier::new(Box::new(transport));

        let metadata = json!({ "user_id": "123", "session": "abc" });
        verifier.verify("Test response.", vec!["Test context."], Some(&metadata)).unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].payload.as_ref().unwrap()["metadata"], metadata);
    }

    #[test]
    fn test_verify_drops_empty_metadata() {
        let transport = StubTransport::always(verified());
        let calls = transport.calls.clone();
        let verifier = Verifier::new(Box::new(transport));

        verifier.verify("Test response.", "ctx", Some(&json!({}))).unwrap();

        let calls = calls.lock().unwrap();
        assert!(calls[0].payload.as_ref().unwrap().get("metadata").is_none());
    }

    #[test]
    fn test_non_object_metadata_rejected() {
        let transport = StubTransport::always(verified());
        let calls = transport.calls.clone();
        let verifier = Verifier::new(Box::new(transport));

        let result = verifier.verify("Test response.", "ctx", Some(&json!("tag")));

        assert!(matches!(result, Err(TensalisError::Validation { ref field, .. }) if field == "metadata"));
        assert!(calls.lock().unwrap().is_empty());
    }

    /// Empty input must be rejected before the transport sees anything.
    #[test]
    fn test_empty_input_rejected_without_network_call() {
        let transport = StubTransport::always(verified());
        let calls = transport.calls.clone();
        let verifier = Verifier::new(Box::new(transport));

        match verifier.verify("   ", "ctx", None) {
            Err(TensalisError::Validation { field, .. }) => assert_eq!(field, "response"),
            other => panic!("expected Validation on response, got {:?}", other),
        }
        match verifier.verify("answer", Vec::<String>::new(), None) {
            Err(TensalisError::Validation { field, .. }) => assert_eq!(field, "context"),
            other => panic!("expected Validation on context, got {:?}", other),
        }

        assert!(calls.lock().unwrap().is_empty(), "transport must not be called");
    }

    #[test]
    fn test_transport_error_propagates_unchanged() {
        let transport = StubTransport::new(|_, _| {
            Err(TensalisError::Api {
                status: 400,
                message: "Invalid request".to_string(),
                body: json!({ "error": "Invalid request" }),
            })
        });
        let verifier = Verifier::new(Box::new(transport));

        match verifier.verify("test", "test", None) {
            Err(TensalisError::Api { status, message, .. }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid request");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    // ── verify_batch ──────────────────────────────────────────────────────────

    #[test]
    fn test_verify_batch_returns_results_in_order() {
        let transport = StubTransport::always(json!({
            "results": [
                { "status": "VERIFIED" },
                { "status": "BLOCKED", "severity": "HIGH" }
            ]
        }));
        let calls = transport.calls.clone();
        let verifier = Verifier::new(Box::new(transport));

        let results = verifier
            .verify_batch(&[
                BatchItem::new("Answer 1", vec!["Fact 1"]),
                BatchItem::new("Answer 2", "Fact 2"),
            ])
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_verified());
        assert!(results[1].is_blocked());

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].path, "/verify/batch");
        assert_eq!(
            calls[0].payload.as_ref().unwrap(),
            &json!({
                "items": [
                    { "response": "Answer 1", "context": ["Fact 1"] },
                    { "response": "Answer 2", "context": ["Fact 2"] }
                ]
            })
        );
    }

    #[test]
    fn test_verify_batch_missing_results_is_empty() {
        let verifier = Verifier::new(Box::new(StubTransport::always(json!({}))));
        let results = verifier.verify_batch(&[BatchItem::new("a", "b")]).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_verify_batch_validates_each_item() {
        let transport = StubTransport::always(json!({ "results": [] }));
        let calls = transport.calls.clone();
        let verifier = Verifier::new(Box::new(transport));

        assert!(matches!(
            verifier.verify_batch(&[]),
            Err(TensalisError::Validation { .. })
        ));

        match verifier.verify_batch(&[BatchItem::new("ok", "fact"), BatchItem::new("ok", "")]) {
            Err(TensalisError::Validation { field, .. }) => assert_eq!(field, "items[1].context"),
            other => panic!("expected Validation, got {:?}", other),
        }

        assert!(calls.lock().unwrap().is_empty());
    }

    // ── health / usage ────────────────────────────────────────────────────────

    #[test]
    fn test_health_and_usage_use_get_without_body() {
        let transport = StubTransport::new(|index, _| {
            Ok(if index == 0 {
                json!({ "status": "healthy", "latency_ms": 2 })
            } else {
                json!({ "requests_today": 1000, "limit": 10000 })
            })
        });
        let calls = transport.calls.clone();
        let verifier = Verifier::new(Box::new(transport));

        let health = verifier.health().unwrap();
        let usage = verifier.usage().unwrap();

        assert_eq!(health["status"], "healthy");
        assert_eq!(usage["requests_today"], 1000);

        let calls = calls.lock().unwrap();
        assert_eq!((calls[0].method, calls[0].path.as_str()), (Method::Get, "/health"));
        assert_eq!((calls[1].method, calls[1].path.as_str()), (Method::Get, "/usage"));
        assert!(calls.iter().all(|c| c.payload.is_none()));
    }

    #[test]
    fn test_blocked_verdict_survives_malformed_optional_fields() {
        let transport = StubTransport::always(json!({
            "status": "BLOCKED",
            "severity": "SEVERE",
            "latency_ms": 12.5
        }));
        let verifier = Verifier::new(Box::new(transport));

        let verdict = verifier.verify("answer", "fact", None).unwrap();

        assert!(verdict.is_blocked());
        assert_eq!(verdict.severity(), None);
        assert_eq!(verdict.raw()["severity"], "SEVERE");
    }

    #[test]
    fn test_unencodable_body_is_not_a_validation_error() {
        let body = std::collections::BTreeMap::from([((1u8, 2u8), "value")]);

        let err = super::encode_body(&body).unwrap_err();

        assert!(matches!(err, TensalisError::InvalidResponse { .. }), "got {:?}", err);
    }
}
