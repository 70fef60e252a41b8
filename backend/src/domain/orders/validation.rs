//! Local validation rules for order drafts.
//!
//! Every rule here runs before the catalog is contacted, so a malformed
//! request never costs a network round trip.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Value, json};

/// Maximum number of lines in one order.
pub const MAX_ORDER_LINES: usize = 50;
/// Minimum delivery address length, in characters.
pub const ADDRESS_MIN: usize = 10;
/// Maximum delivery address length, in characters.
pub const ADDRESS_MAX: usize = 200;
/// Maximum length of delivery and line notes, in characters.
pub const NOTES_MAX: usize = 200;

/// Location of a free-text notes field inside a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotesField {
    Delivery,
    Line { index: usize },
}

impl NotesField {
    fn path(self) -> String {
        match self {
            Self::Delivery => "delivery_notes".to_owned(),
            Self::Line { index } => format!("items[{index}].notes"),
        }
    }
}

/// Reasons an order draft is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderValidationError {
    NoItems,
    TooManyItems { actual: usize },
    QuantityOutOfRange { index: usize, value: i64 },
    InvalidProductId { index: usize, value: String },
    DuplicateProduct { index: usize, product_id: String },
    AddressLength { actual: usize },
    AddressCharacters,
    InvalidPhone { value: String },
    NotesTooLong { field: NotesField, actual: usize },
    NotesCharacters { field: NotesField },
}

impl OrderValidationError {
    /// Request field the failure refers to.
    pub fn field(&self) -> String {
        match self {
            Self::NoItems | Self::TooManyItems { .. } => "items".to_owned(),
            Self::QuantityOutOfRange { index, .. } => format!("items[{index}].quantity"),
            Self::InvalidProductId { index, .. } | Self::DuplicateProduct { index, .. } => {
                format!("items[{index}].product_id")
            }
            Self::AddressLength { .. } | Self::AddressCharacters => "delivery_address".to_owned(),
            Self::InvalidPhone { .. } => "contact_phone".to_owned(),
            Self::NotesTooLong { field, .. } | Self::NotesCharacters { field } => field.path(),
        }
    }

    /// Stable machine-readable code for the failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoItems => "empty_items",
            Self::TooManyItems { .. } => "too_many_items",
            Self::QuantityOutOfRange { .. } => "quantity_out_of_range",
            Self::InvalidProductId { .. } => "invalid_product_id",
            Self::DuplicateProduct { .. } => "duplicate_product",
            Self::AddressLength { .. } => "address_length",
            Self::AddressCharacters => "address_characters",
            Self::InvalidPhone { .. } => "invalid_phone",
            Self::NotesTooLong { .. } => "notes_too_long",
            Self::NotesCharacters { .. } => "notes_characters",
        }
    }

    /// Structured detail payload for the boundary layer.
    pub fn details(&self) -> Value {
        let mut details = json!({ "field": self.field(), "code": self.code() });
        let value = match self {
            Self::QuantityOutOfRange { value, .. } => Some(json!(value)),
            Self::InvalidProductId { value, .. } | Self::InvalidPhone { value } => {
                Some(json!(value))
            }
            Self::DuplicateProduct { product_id, .. } => Some(json!(product_id)),
            _ => None,
        };
        if let (Some(value), Some(map)) = (value, details.as_object_mut()) {
            map.insert("value".to_owned(), value);
        }
        details
    }
}

impl fmt::Display for OrderValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoItems => write!(f, "order must contain at least one item"),
            Self::TooManyItems { actual } => write!(
                f,
                "order may contain at most {MAX_ORDER_LINES} items, got {actual}"
            ),
            Self::QuantityOutOfRange { index, value } => write!(
                f,
                "item {index}: quantity must be between 1 and 100, got {value}"
            ),
            Self::InvalidProductId { index, value } => {
                write!(f, "item {index}: invalid product id format: {value}")
            }
            Self::DuplicateProduct { product_id, .. } => {
                write!(f, "duplicate products are not allowed: {product_id}")
            }
            Self::AddressLength { actual } => write!(
                f,
                "delivery address must be between {ADDRESS_MIN} and {ADDRESS_MAX} characters, got {actual}"
            ),
            Self::AddressCharacters => write!(
                f,
                "delivery address may only contain letters, digits, spaces, and -'.,#&"
            ),
            Self::InvalidPhone { .. } => write!(
                f,
                "contact phone must be 9 to 15 digits with an optional leading +"
            ),
            Self::NotesTooLong { field, actual } => write!(
                f,
                "{} must be at most {NOTES_MAX} characters, got {actual}",
                field.path()
            ),
            Self::NotesCharacters { field } => write!(
                f,
                "{} may only contain letters, digits, spaces, and -',.!?",
                field.path()
            ),
        }
    }
}

impl std::error::Error for OrderValidationError {}

static ADDRESS_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();
static NOTES_RE: OnceLock<Regex> = OnceLock::new();
static PRODUCT_ID_RE: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("validation regex {pattern} failed to compile: {error}"))
    })
}

// Length is enforced separately; these patterns constrain characters only.
fn address_regex() -> &'static Regex {
    compiled(&ADDRESS_RE, r"^[\p{L}\p{N} \-'.,#&]+$")
}

fn phone_regex() -> &'static Regex {
    compiled(&PHONE_RE, r"^\+?[0-9]{9,15}$")
}

fn notes_regex() -> &'static Regex {
    compiled(&NOTES_RE, r"^[\p{L}\p{N} \-',.!?]*$")
}

fn product_id_regex() -> &'static Regex {
    compiled(&PRODUCT_ID_RE, r"^[0-9a-fA-F]{24}$")
}

pub(crate) fn is_well_formed_product_id(value: &str) -> bool {
    product_id_regex().is_match(value)
}

/// Trim and check a delivery address.
pub(crate) fn validate_address(raw: &str) -> Result<String, OrderValidationError> {
    let trimmed = raw.trim();
    let length = trimmed.chars().count();
    if !(ADDRESS_MIN..=ADDRESS_MAX).contains(&length) {
        return Err(OrderValidationError::AddressLength { actual: length });
    }
    if !address_regex().is_match(trimmed) {
        return Err(OrderValidationError::AddressCharacters);
    }
    Ok(trimmed.to_owned())
}

/// Trim and check a contact phone number.
pub(crate) fn validate_phone(raw: &str) -> Result<String, OrderValidationError> {
    let trimmed = raw.trim();
    if !phone_regex().is_match(trimmed) {
        return Err(OrderValidationError::InvalidPhone {
            value: raw.to_owned(),
        });
    }
    Ok(trimmed.to_owned())
}

/// Trim and check optional notes. Blank notes collapse to `None`.
pub(crate) fn validate_notes(
    raw: Option<&str>,
    field: NotesField,
) -> Result<Option<String>, OrderValidationError> {
    let Some(trimmed) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    let length = trimmed.chars().count();
    if length > NOTES_MAX {
        return Err(OrderValidationError::NotesTooLong {
            field,
            actual: length,
        });
    }
    if !notes_regex().is_match(trimmed) {
        return Err(OrderValidationError::NotesCharacters { field });
    }
    Ok(Some(trimmed.to_owned()))
}
