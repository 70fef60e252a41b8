//! Identity outbound adapters.
//!
//! Bearer tokens are HS256 JWTs minted by the identity service. Verification
//! is local: the signing secret is shared, so no network call is made.

mod jwt_verifier;

pub use jwt_verifier::{JwtVerifier, JwtVerifierConfig};
