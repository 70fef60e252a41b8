//! Bearer authentication for HTTP handlers.
//!
//! Handlers take an [`Authenticated`] argument; the extractor reads the
//! `Authorization: Bearer` header and verifies it through the
//! `IdentityVerifier` port held in [`HttpState`].

use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use serde_json::json;
use tracing::debug;

use crate::domain::ports::{CredentialRejection, IdentityVerifier};
use crate::domain::{Error, Principal};

use super::ApiResult;
use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Header value advertised on 401 responses.
pub const BEARER_CHALLENGE: &str = "Bearer";

fn rejection_code(rejection: &CredentialRejection) -> &'static str {
    match rejection {
        CredentialRejection::Missing => "missing_credentials",
        CredentialRejection::Expired => "token_expired",
        CredentialRejection::Malformed { .. } => "invalid_token",
        CredentialRejection::WrongAudience => "wrong_audience",
    }
}

fn map_rejection(rejection: &CredentialRejection) -> Error {
    let message = match rejection {
        CredentialRejection::Missing => "Authentication credentials were not provided",
        CredentialRejection::Expired => "Token has expired",
        CredentialRejection::Malformed { .. } | CredentialRejection::WrongAudience => {
            "Could not validate credentials"
        }
    };
    Error::unauthorized(message).with_details(json!({
        "code": rejection_code(rejection),
        "challenge": BEARER_CHALLENGE,
    }))
}

/// Extract the raw bearer token, if the header is present.
///
/// A present header that is not a bearer credential is treated as malformed.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, CredentialRejection> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| CredentialRejection::malformed("authorization header is not ASCII"))?;
    let token = value
        .get(..BEARER_PREFIX.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(BEARER_PREFIX))
        .map(|_| value[BEARER_PREFIX.len()..].trim())
        .ok_or_else(|| CredentialRejection::malformed("expected a bearer credential"))?;
    Ok(Some(token.to_owned()))
}

/// Verify an optional bearer token and return the caller.
pub async fn authenticate(
    verifier: &dyn IdentityVerifier,
    token: Option<&str>,
) -> ApiResult<Principal> {
    let Some(token) = token.filter(|token| !token.is_empty()) else {
        return Err(map_rejection(&CredentialRejection::missing()));
    };
    verifier.verify(token).await.map_err(|rejection| {
        debug!(reason = %rejection, "bearer authentication failed");
        map_rejection(&rejection)
    })
}

/// Verified caller extracted from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl Authenticated {
    /// Consume the extractor and return the principal.
    pub fn into_inner(self) -> Principal {
        self.0
    }
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = bearer_token(req.headers());
        Box::pin(async move {
            let state = state.ok_or_else(|| Error::internal("http state missing"))?;
            let token = token.map_err(|rejection| map_rejection(&rejection))?;
            let principal = authenticate(state.identity.as_ref(), token.as_deref()).await?;
            Ok(Self(principal))
        })
    }
}
