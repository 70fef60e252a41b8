//! Tests for HTTP error mapping.

use super::*;
use crate::domain::Error;
use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use rstest_bdd_macros::{given, then, when};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[fixture]
fn internal_error_case(expected_trace_id: String) -> Error {
    Error::internal("pool exhausted while reading order 42")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"sql": "select *"}))
}

#[fixture]
fn transition_error_case(expected_trace_id: String) -> Error {
    Error::invalid_transition("cannot transition order from pending to preparing")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"from": "pending", "to": "preparing"}))
}

#[rstest]
#[case::invalid_request(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case::unauthorized(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case::forbidden(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case::not_found(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case::invalid_transition(Error::invalid_transition("no edge"), StatusCode::BAD_REQUEST)]
#[case::conflict(Error::conflict("lost race"), StatusCode::CONFLICT)]
#[case::dependency_failure(Error::dependency_failure("catalog 500"), StatusCode::BAD_GATEWAY)]
#[case::service_unavailable(Error::service_unavailable("db down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case::dependency_timeout(Error::dependency_timeout("catalog slow"), StatusCode::GATEWAY_TIMEOUT)]
#[case::internal(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
}

async fn assert_error_response(
    error: Error,
    expected_status: StatusCode,
    expected_trace_id: Option<&str>,
) -> Error {
    let response = ResponseError::error_response(&error);
    assert_eq!(response.status(), expected_status);

    let header = response.headers().get(TRACE_ID_HEADER);
    match expected_trace_id {
        Some(expected) => {
            let trace_id = header
                .expect("trace-id header is set by error_response")
                .to_str()
                .expect("trace-id not valid UTF-8");
            assert_eq!(trace_id, expected);
        }
        None => assert!(header.is_none(), "trace-id header should not be present"),
    }

    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");

    serde_json::from_slice(&bytes).expect("Error JSON deserialisation succeeds")
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_trace_id(
    #[from(internal_error_case)] internal_error: Error,
    expected_trace_id: String,
) {
    let redacted = assert_error_response(
        internal_error,
        StatusCode::INTERNAL_SERVER_ERROR,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(redacted.code(), ErrorCode::InternalError);
    assert_eq!(redacted.message(), "Internal server error");
    assert!(redacted.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn transition_errors_keep_message_and_details(
    #[from(transition_error_case)] transition_error: Error,
    expected_trace_id: String,
) {
    let payload = assert_error_response(
        transition_error,
        StatusCode::BAD_REQUEST,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(payload.code(), ErrorCode::InvalidTransition);
    assert_eq!(
        payload.message(),
        "cannot transition order from pending to preparing"
    );
    assert_eq!(
        payload.details(),
        Some(&json!({"from": "pending", "to": "preparing"}))
    );
}

#[rstest]
#[actix_web::test]
async fn error_without_trace_id_omits_trace_header() {
    let error = Error::conflict("Order was modified concurrently");

    let payload = assert_error_response(error, StatusCode::CONFLICT, None).await;
    assert_eq!(payload.code(), ErrorCode::Conflict);
    assert_eq!(payload.trace_id(), None);
    assert_eq!(payload.details(), None);
}

#[given("a catalog timeout error code")]
fn a_catalog_timeout_error_code() -> ErrorCode {
    ErrorCode::DependencyTimeout
}

#[when("the adapter maps the code to an HTTP status")]
fn the_adapter_maps_the_code_to_http_status(code: ErrorCode) -> StatusCode {
    super::status_for(code)
}

#[then("the status is 504 Gateway Timeout")]
fn the_status_is_504_gateway_timeout(status: StatusCode) {
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}

#[given("an internal error template")]
fn an_internal_error_template() -> (ErrorCode, &'static str) {
    (ErrorCode::InternalError, "boom")
}

#[when("the adapter redacts the client payload")]
fn the_adapter_redacts_the_client_payload(template: (ErrorCode, &'static str)) -> String {
    let (code, message) = template;
    let error = if let ErrorCode::InternalError = code {
        Error::internal(message)
    } else {
        Error::invalid_request(message)
    }
    .with_trace_id(TRACE_ID)
    .with_details(json!({"secret": true}));

    super::redact_if_internal(&error).message().to_owned()
}

#[then("clients see the generic internal error message")]
fn clients_see_the_generic_internal_error_message(message: String) {
    assert_eq!(message, "Internal server error");
}

#[rstest]
fn catalog_timeouts_surface_as_gateway_timeouts() {
    let code = a_catalog_timeout_error_code();
    let status = the_adapter_maps_the_code_to_http_status(code);
    the_status_is_504_gateway_timeout(status);
}

#[rstest]
fn internal_details_never_reach_clients() {
    let template = an_internal_error_template();
    let message = the_adapter_redacts_the_client_payload(template);
    clients_see_the_generic_internal_error_message(message);
}

#[test]
fn from_actix_error_is_redacted_internal_error() {
    use actix_web::error;

    let actix_err = error::ErrorBadRequest("boom");
    let err: Error = actix_err.into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.trace_id(), None);
    assert_eq!(err.details(), None);
}

#[actix_web::test]
async fn malformed_json_bodies_render_structured_400() {
    let req = actix_web::test::TestRequest::default().to_http_request();
    let err = json_error_handler(JsonPayloadError::ContentType, &req);
    let response = err.error_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body()).await.expect("body");
    let payload: Error = serde_json::from_slice(&bytes).expect("error json");
    assert_eq!(payload.code(), ErrorCode::InvalidRequest);
    assert_eq!(payload.details(), Some(&json!({"code": "invalid_body"})));
}
