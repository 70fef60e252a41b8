//! Service configuration loaded via OrthoConfig.
//!
//! Values come from `ORDER_SERVICE_*` environment variables, command-line
//! flags, and optional configuration files. Unset values fall back to the
//! defaults below.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_CATALOG_URL: &str = "http://catalog:8000";
const DEFAULT_APP_NAME: &str = "Order Service";
const DEFAULT_ENVIRONMENT: &str = "development";

/// Errors raised when a configured value cannot be interpreted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid bind address {value}: {message}")]
    BindAddr { value: String, message: String },
    #[error("invalid catalog url {value}: {message}")]
    CatalogUrl { value: String, message: String },
    #[error("catalog timeout must be at least one second")]
    ZeroTimeout,
    #[error("db_max_connections must be at least one")]
    ZeroPoolSize,
}

/// Runtime configuration for the order service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ORDER_SERVICE")]
pub struct ServiceSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL. Without one the server uses fixture ports.
    pub database_url: Option<String>,
    /// Base URL of the product catalog service.
    pub catalog_url: Option<String>,
    /// Per-request catalog timeout in seconds.
    #[ortho_config(default = 10)]
    pub catalog_timeout_secs: u64,
    /// HS256 secret for bearer tokens. Without one every request is rejected.
    pub jwt_secret: Option<String>,
    /// Expected `aud` claim, when tokens carry one.
    pub jwt_audience: Option<String>,
    pub app_name: Option<String>,
    pub environment: Option<String>,
    /// Upper bound on pooled database connections.
    #[ortho_config(default = 10)]
    pub db_max_connections: u32,
}

impl ServiceSettings {
    /// Parse the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the value is not `host:port`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    /// Parse the configured catalog base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::CatalogUrl`] for malformed or non-HTTP URLs.
    pub fn catalog_url(&self) -> Result<Url, SettingsError> {
        let raw = self.catalog_url.as_deref().unwrap_or(DEFAULT_CATALOG_URL);
        let invalid = |message: String| SettingsError::CatalogUrl {
            value: raw.to_owned(),
            message,
        };
        let url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }
        Ok(url)
    }

    /// Catalog request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ZeroTimeout`] when configured as zero.
    pub fn catalog_timeout(&self) -> Result<Duration, SettingsError> {
        match self.catalog_timeout_secs {
            0 => Err(SettingsError::ZeroTimeout),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    /// Maximum database pool size.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ZeroPoolSize`] when configured as zero.
    pub fn db_max_connections(&self) -> Result<u32, SettingsError> {
        match self.db_max_connections {
            0 => Err(SettingsError::ZeroPoolSize),
            size => Ok(size),
        }
    }

    /// Service name reported by the health endpoint.
    pub fn app_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or(DEFAULT_APP_NAME)
    }

    /// Deployment environment reported by the health endpoint.
    pub fn environment(&self) -> &str {
        self.environment.as_deref().unwrap_or(DEFAULT_ENVIRONMENT)
    }

    /// The JWT secret, ignoring blank values.
    pub fn jwt_secret(&self) -> Option<&str> {
        self.jwt_secret.as_deref().filter(|secret| !secret.trim().is_empty())
    }

    /// The database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}
