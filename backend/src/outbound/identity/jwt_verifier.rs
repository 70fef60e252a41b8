//! HS256 JWT verification for the `IdentityVerifier` port.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use mockable::Clock;
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

use crate::domain::ports::{CredentialRejection, IdentityVerifier};
use crate::domain::{Principal, Role, UserId};

type HmacSha256 = Hmac<Sha256>;

const ACCESS_TOKEN_TYPE: &str = "access";

/// Settings for [`JwtVerifier`].
#[derive(Clone)]
pub struct JwtVerifierConfig {
    /// Shared HS256 signing secret.
    pub secret: String,
    /// Required `aud` claim, when set.
    pub audience: Option<String>,
}

impl std::fmt::Debug for JwtVerifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifierConfig")
            .field("secret", &"<redacted>")
            .field("audience", &self.audience)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    fn contains(&self, expected: &str) -> bool {
        match self {
            Self::One(aud) => aud == expected,
            Self::Many(auds) => auds.iter().any(|aud| aud == expected),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    exp: i64,
    #[serde(rename = "type")]
    token_type: Option<String>,
    aud: Option<Audience>,
}

/// Verifies HS256-signed access tokens against a shared secret.
pub struct JwtVerifier {
    secret: Vec<u8>,
    audience: Option<String>,
    clock: Arc<dyn Clock>,
}

impl JwtVerifier {
    /// Build a verifier that checks expiry against `clock`.
    pub fn new(config: JwtVerifierConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret: config.secret.into_bytes(),
            audience: config.audience,
            clock,
        }
    }

    fn check_signature(
        &self,
        signing_input: &str,
        signature: &str,
    ) -> Result<(), CredentialRejection> {
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CredentialRejection::malformed("signature is not base64url"))?;
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|err| CredentialRejection::malformed(err.to_string()))?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| CredentialRejection::malformed("signature mismatch"))
    }

    fn check_claims(&self, claims: Claims) -> Result<Principal, CredentialRejection> {
        if claims
            .token_type
            .as_deref()
            .is_some_and(|kind| kind != ACCESS_TOKEN_TYPE)
        {
            return Err(CredentialRejection::wrong_audience());
        }
        if let Some(expected) = self.audience.as_deref()
            && !claims.aud.as_ref().is_some_and(|aud| aud.contains(expected))
        {
            return Err(CredentialRejection::wrong_audience());
        }

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| CredentialRejection::malformed("exp is out of range"))?;
        if expires_at <= self.clock.utc() {
            return Err(CredentialRejection::expired());
        }

        let subject = UserId::new(claims.sub)
            .map_err(|err| CredentialRejection::malformed(format!("sub: {err}")))?;
        let role = claims
            .role
            .parse::<Role>()
            .map_err(|err| CredentialRejection::malformed(format!("role: {err}")))?;
        Ok(Principal::new(subject, role, expires_at))
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(
    segment: &str,
    name: &str,
) -> Result<T, CredentialRejection> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| CredentialRejection::malformed(format!("{name} is not base64url")))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| CredentialRejection::malformed(format!("{name}: {err}")))
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, CredentialRejection> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CredentialRejection::missing());
        }
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CredentialRejection::malformed("expected three segments"));
        };

        let header: Header = decode_segment(header, "header")?;
        if header.alg != "HS256" {
            return Err(CredentialRejection::malformed(format!(
                "unsupported algorithm {}",
                header.alg
            )));
        }
        let signing_input_len = token.len() - signature.len() - 1;
        self.check_signature(&token[..signing_input_len], signature)?;

        let claims: Claims = decode_segment(payload, "payload")?;
        self.check_claims(claims).inspect_err(|rejection| {
            debug!(reason = %rejection, "bearer token rejected");
        })
    }
}
