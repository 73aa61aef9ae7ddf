//! Splitgraph Data Delivery Network client over HTTP.

use super::{Backend, Client, http::HttpTransport};
use crate::{ClientOptions, Result, models::ExecuteOutcome, security::headers};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::debug;

/// Public DDN HTTP query endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://data.splitgraph.com/sql/query/ddn";

/// Splitgraph DDN client.
///
/// Accepts API key pairs (sent as `X-API-Key` / `X-API-Secret`) and bearer
/// tokens. Without a credential, queries run anonymously.
#[derive(Debug, Clone)]
pub struct SplitgraphClient {
    transport: HttpTransport,
}

impl SplitgraphClient {
    /// Creates a client, resolving endpoint and auth headers eagerly.
    ///
    /// # Errors
    /// Returns a configuration error for a malformed endpoint, proxy, or
    /// credential.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let headers = match &options.credential {
            Some(credential) => headers::credential_headers(credential)?,
            None => HeaderMap::new(),
        };
        let endpoint = options.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let transport = HttpTransport::new(endpoint, headers, &options)?;

        debug!("Created Splitgraph client for {}", transport.endpoint());
        Ok(Self { transport })
    }
}

#[async_trait]
impl Client for SplitgraphClient {
    async fn execute(&self, query: &str) -> ExecuteOutcome {
        self.transport.post_sql(query).await
    }

    fn backend(&self) -> Backend {
        Backend::Splitgraph
    }

    fn endpoint(&self) -> String {
        crate::error::redact_database_url(self.transport.endpoint().as_str())
    }
}
