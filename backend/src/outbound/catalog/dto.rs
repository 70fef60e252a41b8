//! DTOs for decoding catalog JSON responses.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{Money, ProductSnapshot};

#[derive(Debug, Deserialize)]
pub(super) struct ProductEnvelopeDto {
    pub(super) product: ProductDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductDto {
    pub(super) name: String,
    pub(super) price: Decimal,
    #[serde(default = "default_available")]
    pub(super) is_available: bool,
}

fn default_available() -> bool {
    true
}

impl ProductEnvelopeDto {
    pub(super) fn into_snapshot(self) -> Result<ProductSnapshot, String> {
        let ProductDto {
            name,
            price,
            is_available,
        } = self.product;
        if name.trim().is_empty() {
            return Err("product name must not be blank".to_owned());
        }
        let unit_price =
            Money::new(price).map_err(|err| format!("product {name} has invalid price: {err}"))?;
        Ok(ProductSnapshot {
            name,
            unit_price,
            is_available,
        })
    }
}
