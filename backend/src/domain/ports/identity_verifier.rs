//! Port for verifying bearer credentials issued by the identity service.

use async_trait::async_trait;

use crate::domain::Principal;

use super::define_port_error;

define_port_error! {
    /// Reasons a credential is rejected.
    pub enum CredentialRejection {
        /// No credential was presented.
        Missing => "authentication credentials were not provided",
        /// The credential is past its expiry.
        Expired => "credential has expired",
        /// The credential could not be parsed or its signature is wrong.
        Malformed { message: String } => "invalid credential: {message}",
        /// The credential was issued for another audience or purpose.
        WrongAudience => "credential was not issued for this service",
    }
}

/// Port for turning a bearer token into a verified [`Principal`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token` and return the caller it identifies.
    async fn verify(&self, token: &str) -> Result<Principal, CredentialRejection>;
}

/// Fixture verifier that rejects every token.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdentityVerifier;

#[async_trait]
impl IdentityVerifier for FixtureIdentityVerifier {
    async fn verify(&self, _token: &str) -> Result<Principal, CredentialRejection> {
        Err(CredentialRejection::malformed(
            "no identity verifier configured",
        ))
    }
}
