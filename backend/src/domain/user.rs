//! Authenticated caller identity.
//!
//! Identity is issued by an external collaborator. The order service only
//! needs the subject identifier and role carried by a verified credential,
//! modelled here as [`Principal`].

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by [`UserId::new`] and [`Role::from_str`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    UnknownRole { value: String },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(
                f,
                "user id must be 1-64 letters, digits, hyphens, or underscores",
            ),
            Self::UnknownRole { value } => write!(f, "unknown role: {value}"),
        }
    }
}

impl std::error::Error for UserValidationError {}

static USER_ID_RE: OnceLock<Regex> = OnceLock::new();

fn user_id_regex() -> &'static Regex {
    USER_ID_RE.get_or_init(|| {
        Regex::new("^[A-Za-z0-9_-]{1,64}$")
            .unwrap_or_else(|error| panic!("user id regex failed to compile: {error}"))
    })
}

/// Stable subject identifier issued by the identity service.
///
/// The identity service owns the format, so only a conservative character set
/// and length are enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if !user_id_regex().is_match(&id) {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(id))
    }

    /// Generate a random identifier. Used by fixtures and tests.
    pub fn random() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Role asserted by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Seller,
    Admin,
}

impl Role {
    /// Sellers and admins may manage any order.
    pub fn is_elevated(self) -> bool {
        matches!(self, Self::Seller | Self::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            _ => Err(UserValidationError::UnknownRole {
                value: value.to_owned(),
            }),
        }
    }
}

/// Verified caller: subject, role, and credential expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    subject: UserId,
    role: Role,
    expires_at: DateTime<Utc>,
}

impl Principal {
    pub fn new(subject: UserId, role: Role, expires_at: DateTime<Utc>) -> Self {
        Self {
            subject,
            role,
            expires_at,
        }
    }

    pub fn subject(&self) -> &UserId {
        &self.subject
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_elevated(&self) -> bool {
        self.role.is_elevated()
    }

    /// Whether this caller may read or mutate an order owned by `owner`.
    pub fn can_access(&self, owner: &UserId) -> bool {
        self.is_elevated() || &self.subject == owner
    }
}
