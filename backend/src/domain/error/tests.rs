//! Tests for domain error construction and serialisation.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn trace_id() -> TraceId {
    TRACE_ID.parse().expect("fixture is a valid UUID")
}

#[rstest]
#[case::invalid_request(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case::invalid_transition(Error::invalid_transition("no edge"), ErrorCode::InvalidTransition)]
#[case::conflict(Error::conflict("raced"), ErrorCode::Conflict)]
#[case::dependency_failure(Error::dependency_failure("catalog 500"), ErrorCode::DependencyFailure)]
#[case::dependency_timeout(Error::dependency_timeout("catalog slow"), ErrorCode::DependencyTimeout)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn try_new_rejects_blank_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert_eq!(result, Err(ErrorValidationError::EmptyMessage));
}

#[rstest]
fn new_substitutes_a_message_for_blank_input() {
    let error = Error::new(ErrorCode::Conflict, "");
    assert_eq!(error.message(), "conflict");
}

#[rstest]
fn try_with_trace_id_rejects_blank_values() {
    let result = Error::internal("boom").try_with_trace_id(" ");
    assert_eq!(result, Err(ErrorValidationError::EmptyTraceId));
}

#[rstest]
fn trace_id_is_absent_out_of_scope() {
    assert!(Error::internal("boom").trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope(trace_id: TraceId) {
    let error = TraceId::scope(trace_id, async { Error::not_found("missing") }).await;
    assert_eq!(error.trace_id(), Some(TRACE_ID));
}

#[rstest]
#[tokio::test]
async fn decoding_ignores_the_ambient_trace_id(trace_id: TraceId) {
    let payload = json!({"code": "conflict", "message": "raced"});
    let decoded: Error = TraceId::scope(trace_id, async move {
        serde_json::from_value(payload).expect("payload decodes")
    })
    .await;
    assert!(decoded.trace_id().is_none());
}

#[rstest]
fn serialises_camel_case_envelope() {
    let error = Error::invalid_request("bad")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"field": "items"}));

    let value = serde_json::to_value(&error).expect("serialise error");
    assert_eq!(
        value,
        json!({
            "code": "invalid_request",
            "message": "bad",
            "traceId": TRACE_ID,
            "details": {"field": "items"},
        })
    );
}

#[rstest]
fn decoding_rejects_blank_messages() {
    let payload = json!({"code": "not_found", "message": ""});
    assert!(serde_json::from_value::<Error>(payload).is_err());
}
