//! Client-supplied order drafts and their validated form.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::money::Quantity;
use super::validation::{
    MAX_ORDER_LINES, NotesField, OrderValidationError, is_well_formed_product_id,
    validate_address, validate_notes, validate_phone,
};

/// Catalog product reference: 24 hexadecimal characters, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductId(String);

impl ProductId {
    /// Returns `None` when `raw` is not a well-formed catalog identifier.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        is_well_formed_product_id(trimmed).then(|| Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProductId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid product id format: {value}"))
    }
}

impl From<ProductId> for String {
    fn from(value: ProductId) -> Self {
        value.0
    }
}

/// One requested line, exactly as the client sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineDraft {
    pub product_id: String,
    pub quantity: i64,
    pub notes: Option<String>,
}

/// Unvalidated order request. Prices are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub items: Vec<OrderLineDraft>,
    pub delivery_address: String,
    pub contact_phone: String,
    pub delivery_notes: Option<String>,
}

/// Trimmed delivery contact details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryDetails {
    address: String,
    phone: String,
    notes: Option<String>,
}

impl DeliveryDetails {
    /// Validate raw delivery fields.
    pub fn new(
        address: &str,
        phone: &str,
        notes: Option<&str>,
    ) -> Result<Self, OrderValidationError> {
        Ok(Self {
            address: validate_address(address)?,
            phone: validate_phone(phone)?,
            notes: validate_notes(notes, NotesField::Delivery)?,
        })
    }

    /// Rebuild from stored values without re-running validation.
    pub(crate) fn from_stored(address: String, phone: String, notes: Option<String>) -> Self {
        Self {
            address,
            phone,
            notes,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// A line that passed local validation but is not yet priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLine {
    product_id: ProductId,
    quantity: Quantity,
    notes: Option<String>,
}

impl ValidatedLine {
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub(crate) fn into_parts(self) -> (ProductId, Quantity, Option<String>) {
        (self.product_id, self.quantity, self.notes)
    }
}

/// An order request that satisfies every local rule.
///
/// # Examples
/// ```
/// use order_service::domain::{OrderDraft, OrderLineDraft, ValidatedOrder};
///
/// let draft = OrderDraft {
///     items: vec![OrderLineDraft {
///         product_id: "64b7f0c2a1e4d5f6a7b8c9d0".into(),
///         quantity: 2,
///         notes: None,
///     }],
///     delivery_address: "221B Baker Street, London".into(),
///     contact_phone: "+447700900123".into(),
///     delivery_notes: None,
/// };
/// let validated = ValidatedOrder::try_from(draft).expect("valid draft");
/// assert_eq!(validated.lines().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    lines: Vec<ValidatedLine>,
    delivery: DeliveryDetails,
}

impl ValidatedOrder {
    pub fn lines(&self) -> &[ValidatedLine] {
        &self.lines
    }

    pub fn delivery(&self) -> &DeliveryDetails {
        &self.delivery
    }

    pub(crate) fn into_parts(self) -> (Vec<ValidatedLine>, DeliveryDetails) {
        (self.lines, self.delivery)
    }
}

fn validate_line(
    index: usize,
    draft: OrderLineDraft,
) -> Result<ValidatedLine, OrderValidationError> {
    let product_id =
        ProductId::parse(&draft.product_id).ok_or(OrderValidationError::InvalidProductId {
            index,
            value: draft.product_id.clone(),
        })?;
    let quantity = Quantity::new(draft.quantity).ok_or(OrderValidationError::QuantityOutOfRange {
        index,
        value: draft.quantity,
    })?;
    let notes = validate_notes(draft.notes.as_deref(), NotesField::Line { index })?;
    Ok(ValidatedLine {
        product_id,
        quantity,
        notes,
    })
}

impl TryFrom<OrderDraft> for ValidatedOrder {
    type Error = OrderValidationError;

    fn try_from(draft: OrderDraft) -> Result<Self, Self::Error> {
        if draft.items.is_empty() {
            return Err(OrderValidationError::NoItems);
        }
        if draft.items.len() > MAX_ORDER_LINES {
            return Err(OrderValidationError::TooManyItems {
                actual: draft.items.len(),
            });
        }

        let mut seen = HashSet::with_capacity(draft.items.len());
        let mut lines = Vec::with_capacity(draft.items.len());
        for (index, item) in draft.items.into_iter().enumerate() {
            let line = validate_line(index, item)?;
            if !seen.insert(line.product_id.clone()) {
                return Err(OrderValidationError::DuplicateProduct {
                    index,
                    product_id: line.product_id.to_string(),
                });
            }
            lines.push(line);
        }

        let delivery = DeliveryDetails::new(
            &draft.delivery_address,
            &draft.contact_phone,
            draft.delivery_notes.as_deref(),
        )?;
        Ok(Self { lines, delivery })
    }
}

#[cfg(test)]
mod tests {
    //! Draft validation coverage.

    use super::*;
    use rstest::{fixture, rstest};

    const PRODUCT_A: &str = "64b7f0c2a1e4d5f6a7b8c9d0";
    const PRODUCT_B: &str = "64b7f0c2a1e4d5f6a7b8c9d1";

    fn line(product_id: &str, quantity: i64) -> OrderLineDraft {
        OrderLineDraft {
            product_id: product_id.to_owned(),
            quantity,
            notes: None,
        }
    }

    #[fixture]
    fn draft() -> OrderDraft {
        OrderDraft {
            items: vec![line(PRODUCT_A, 1), line(PRODUCT_B, 3)],
            delivery_address: "  221B Baker Street, London ".to_owned(),
            contact_phone: "+447700900123".to_owned(),
            delivery_notes: Some("Leave with the concierge.".to_owned()),
        }
    }

    #[rstest]
    fn valid_draft_is_trimmed(draft: OrderDraft) {
        let validated = ValidatedOrder::try_from(draft).expect("valid draft");
        assert_eq!(validated.delivery().address(), "221B Baker Street, London");
        assert_eq!(validated.lines()[1].quantity().get(), 3);
    }

    #[rstest]
    fn empty_items_are_rejected(mut draft: OrderDraft) {
        draft.items.clear();
        assert_eq!(
            ValidatedOrder::try_from(draft),
            Err(OrderValidationError::NoItems)
        );
    }

    #[rstest]
    fn more_than_fifty_items_are_rejected(mut draft: OrderDraft) {
        draft.items = (0..=MAX_ORDER_LINES)
            .map(|n| line(&format!("{n:024x}"), 1))
            .collect();
        assert_eq!(
            ValidatedOrder::try_from(draft),
            Err(OrderValidationError::TooManyItems { actual: 51 })
        );
    }

    #[rstest]
    #[case(0)]
    #[case(101)]
    #[case(-1)]
    fn quantity_out_of_range_names_the_line(mut draft: OrderDraft, #[case] quantity: i64) {
        draft.items[1].quantity = quantity;
        assert_eq!(
            ValidatedOrder::try_from(draft),
            Err(OrderValidationError::QuantityOutOfRange {
                index: 1,
                value: quantity
            })
        );
    }

    #[rstest]
    fn malformed_product_id_is_rejected(mut draft: OrderDraft) {
        draft.items[0].product_id = "not-a-product".to_owned();
        let error = ValidatedOrder::try_from(draft).expect_err("bad id");
        assert_eq!(error.code(), "invalid_product_id");
        assert_eq!(error.field(), "items[0].product_id");
    }

    #[rstest]
    fn duplicate_products_are_rejected_case_insensitively(mut draft: OrderDraft) {
        draft.items[1].product_id = PRODUCT_A.to_ascii_uppercase();
        assert!(matches!(
            ValidatedOrder::try_from(draft),
            Err(OrderValidationError::DuplicateProduct { index: 1, .. })
        ));
    }

    #[rstest]
    fn bad_phone_is_rejected(mut draft: OrderDraft) {
        draft.contact_phone = "call me".to_owned();
        assert!(matches!(
            ValidatedOrder::try_from(draft),
            Err(OrderValidationError::InvalidPhone { .. })
        ));
    }

    #[rstest]
    fn product_id_serde_rejects_bad_shape() {
        let result: Result<ProductId, _> = serde_json::from_str("\"abc\"");
        assert!(result.is_err());
    }
}
