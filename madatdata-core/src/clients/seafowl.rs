//! Seafowl client over HTTP.

use super::{Backend, Client, http::HttpTransport};
use crate::{
    ClientOptions, Result,
    error::MadatdataError,
    models::ExecuteOutcome,
    security::{CredentialOptions, headers},
};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::debug;

/// Query endpoint of a locally running Seafowl instance.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/q";

/// Seafowl client.
///
/// Reads are anonymous; a `Token` credential is sent as the bearer password
/// Seafowl requires for writes. API key pairs are a Splitgraph concept and
/// are rejected at construction.
#[derive(Debug, Clone)]
pub struct SeafowlClient {
    transport: HttpTransport,
}

impl SeafowlClient {
    /// Creates a client, resolving endpoint and auth headers eagerly.
    ///
    /// # Errors
    /// Returns a configuration error for a malformed endpoint or proxy, or
    /// when given an API key credential.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let headers = match &options.credential {
            Some(CredentialOptions::Token { token }) => headers::bearer_headers(token)?,
            Some(other) => {
                return Err(MadatdataError::configuration(format!(
                    "Seafowl does not accept {} credentials",
                    other.kind()
                )));
            }
            None => HeaderMap::new(),
        };
        let endpoint = options.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let transport = HttpTransport::new(endpoint, headers, &options)?;

        debug!("Created Seafowl client for {}", transport.endpoint());
        Ok(Self { transport })
    }
}

#[async_trait]
impl Client for SeafowlClient {
    async fn execute(&self, query: &str) -> ExecuteOutcome {
        self.transport.post_sql(query).await
    }

    fn backend(&self) -> Backend {
        Backend::Seafowl
    }

    fn endpoint(&self) -> String {
        crate::error::redact_database_url(self.transport.endpoint().as_str())
    }
}
