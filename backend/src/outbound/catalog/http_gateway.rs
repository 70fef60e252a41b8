//! Reqwest-backed catalog gateway adapter.
//!
//! This adapter owns transport details only: URL construction, timeout and
//! HTTP error mapping, and JSON decoding into product snapshots.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use super::dto::ProductEnvelopeDto;
use crate::domain::ports::{CatalogGateway, CatalogGatewayError};
use crate::domain::{ProductId, ProductSnapshot};

const USER_AGENT: &str = concat!("order-service/", env!("CARGO_PKG_VERSION"));

/// Catalog gateway that performs one HTTP GET per product lookup.
pub struct HttpCatalogGateway {
    client: Client,
    base_url: Url,
}

impl HttpCatalogGateway {
    /// Build a gateway using a reqwest client with an explicit request timeout.
    ///
    /// ```rust,ignore
    /// let gateway = HttpCatalogGateway::new(base_url, Duration::from_secs(10))?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogGatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                CatalogGatewayError::service(format!(
                    "catalog base URL {} cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<(StatusCode, Vec<u8>), CatalogGatewayError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl CatalogGateway for HttpCatalogGateway {
    async fn fetch_product(
        &self,
        product_id: &ProductId,
    ) -> Result<ProductSnapshot, CatalogGatewayError> {
        let url = self.endpoint(&["products", product_id.as_str()])?;
        debug!(%product_id, "fetching catalog product");
        let (status, body) = self.get(url).await.inspect_err(|err| {
            warn!(%product_id, error = %err, "catalog lookup failed");
        })?;

        if status == StatusCode::NOT_FOUND {
            return Err(CatalogGatewayError::not_found(product_id.as_str()));
        }
        if !status.is_success() {
            let err = map_status_error(status, &body);
            warn!(%product_id, error = %err, "catalog lookup rejected");
            return Err(err);
        }
        parse_product(&body)
    }

    async fn probe(&self) -> Result<(), CatalogGatewayError> {
        let url = self.endpoint(&["health"])?;
        let (status, body) = self.get(url).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(map_status_error(status, &body))
        }
    }
}

fn parse_product(body: &[u8]) -> Result<ProductSnapshot, CatalogGatewayError> {
    let decoded: ProductEnvelopeDto = serde_json::from_slice(body).map_err(|error| {
        CatalogGatewayError::service(format!("invalid catalog JSON payload: {error}"))
    })?;
    decoded
        .into_snapshot()
        .map_err(CatalogGatewayError::service)
}

fn map_transport_error(error: reqwest::Error) -> CatalogGatewayError {
    if error.is_timeout() {
        CatalogGatewayError::timeout(error.to_string())
    } else if error.is_decode() {
        CatalogGatewayError::service(error.to_string())
    } else {
        CatalogGatewayError::unavailable(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> CatalogGatewayError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            CatalogGatewayError::timeout(message)
        }
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
            CatalogGatewayError::unavailable(message)
        }
        _ => CatalogGatewayError::service(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
