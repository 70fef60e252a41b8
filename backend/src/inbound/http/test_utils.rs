//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::ports::{CredentialRejection, MockIdentityVerifier};
use crate::domain::{Principal, Role, UserId};

/// Bearer token accepted by [`token_verifier`] for the given role.
pub fn token_for(role: Role) -> String {
    format!("test-{}", role.as_str())
}

/// Verifier that accepts `test-<role>` tokens, issued to `<role>_1`.
///
/// Any other token is rejected as malformed.
pub fn token_verifier() -> Arc<MockIdentityVerifier> {
    let mut verifier = MockIdentityVerifier::new();
    verifier.expect_verify().returning(|token| {
        let role = token
            .strip_prefix("test-")
            .and_then(|name| name.parse::<Role>().ok())
            .ok_or_else(|| CredentialRejection::malformed("unrecognised test token"))?;
        let subject = UserId::new(format!("{}_1", role.as_str()))
            .map_err(|err| CredentialRejection::malformed(err.to_string()))?;
        Ok(Principal::new(subject, role, Utc::now() + Duration::hours(1)))
    });
    Arc::new(verifier)
}
