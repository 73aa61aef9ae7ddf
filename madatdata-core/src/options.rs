//! Client construction options.
//!
//! `ClientOptions` is consumed once by a client constructor, which derives
//! its transport configuration from it eagerly. Nothing reads the options
//! again after construction.

use crate::security::CredentialOptions;
use std::time::Duration;

/// Environment variable naming an outbound proxy for local debugging.
pub const PROXY_ENV_VAR: &str = "MITM";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Options shared by every backend client.
///
/// # Security
/// `Display` omits the credential entirely; `Debug` only shows its kind.
///
/// # Example
/// ```rust
/// use madatdata_core::{ClientOptions, security::CredentialOptions};
///
/// let options = ClientOptions::new()
///     .with_credential(CredentialOptions::token("t0k3n".to_string()))
///     .with_endpoint("http://localhost:8080/q");
///
/// assert!(options.credential.is_some());
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Credential bundle, or `None` for anonymous access
    pub credential: Option<CredentialOptions>,
    /// Backend URL override (connection string for the Postgres variant)
    pub endpoint: Option<String>,
    /// Proxy address; falls back to the `MITM` environment variable
    pub proxy: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            credential: None,
            endpoint: None,
            proxy: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl std::fmt::Display for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ClientOptions(endpoint={}, auth={})",
            self.endpoint
                .as_deref()
                .map_or_else(|| "<default>".to_string(), crate::error::redact_database_url),
            self.credential
                .as_ref()
                .map_or("anonymous", CredentialOptions::kind)
        )
    }
}

impl ClientOptions {
    /// Creates anonymous options with default transport settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the credential.
    pub fn with_credential(mut self, credential: CredentialOptions) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Builder method to override the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Builder method to set an explicit proxy.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Builder method to set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Proxy address to use: the explicit option, else `MITM` from the
    /// environment. Empty values count as unset.
    pub fn resolved_proxy(&self) -> Option<String> {
        self.proxy
            .clone()
            .or_else(|| std::env::var(PROXY_ENV_VAR).ok())
            .filter(|p| !p.trim().is_empty())
    }

    /// Validates option values that do not depend on the backend.
    ///
    /// # Errors
    /// Returns a configuration error for a zero timeout, a blank
    /// credential, or an empty endpoint override.
    pub fn validate(&self) -> crate::Result<()> {
        if self.timeout.is_zero() {
            return Err(crate::error::MadatdataError::configuration(
                "timeout must be greater than 0",
            ));
        }

        if let Some(credential) = &self.credential {
            if credential.is_blank() {
                return Err(crate::error::MadatdataError::configuration(format!(
                    "{} credential has an empty field",
                    credential.kind()
                )));
            }
        }

        if let Some(endpoint) = &self.endpoint {
            if endpoint.trim().is_empty() {
                return Err(crate::error::MadatdataError::configuration(
                    "endpoint cannot be empty",
                ));
            }
        }

        Ok(())
    }
}
