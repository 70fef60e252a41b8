//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay framework-agnostic and do not derive `ToSchema`; the
//! wrappers here mirror their wire shape for documentation only.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed, fails validation, or names an unknown product.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Bearer credential missing, expired, or invalid.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The order does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The requested status change is not allowed from the current status.
    #[schema(rename = "invalid_transition")]
    InvalidTransition,
    /// The order changed concurrently; reload and retry.
    #[schema(rename = "conflict")]
    Conflict,
    /// The product catalog failed or could not be reached.
    #[schema(rename = "dependency_failure")]
    DependencyFailure,
    /// The product catalog did not answer in time.
    #[schema(rename = "dependency_timeout")]
    DependencyTimeout,
    /// The order store is unavailable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// Every error response carries this envelope plus a `trace-id` header.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[serde(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "contact_phone is required")]
    message: String,
    /// Correlation identifier, echoed in the `trace-id` response header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Structured details such as the offending field and a validation code.
    details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::PartialSchema;

    fn schema_to_json<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises to JSON")
    }

    #[test]
    fn error_schema_uses_camel_case_trace_id() {
        assert_eq!(ErrorSchema::name(), "crate.domain.Error");
        let schema_json = schema_to_json::<ErrorSchema>();
        assert!(schema_json.contains("traceId"), "{schema_json}");
        assert!(!schema_json.contains("trace_id"), "{schema_json}");
    }

    #[rstest]
    #[case("invalid_request")]
    #[case("unauthorized")]
    #[case("forbidden")]
    #[case("not_found")]
    #[case("invalid_transition")]
    #[case("conflict")]
    #[case("dependency_failure")]
    #[case("dependency_timeout")]
    #[case("service_unavailable")]
    #[case("internal_error")]
    fn error_code_schema_lists_domain_code(#[case] code: &str) {
        assert_eq!(ErrorCodeSchema::name(), "crate.domain.ErrorCode");
        let schema_json = schema_to_json::<ErrorCodeSchema>();
        assert!(schema_json.contains(&format!("\"{code}\"")), "missing {code}");
    }
}
