//! Query client trait and factory for interchangeable backends.
//!
//! Every backend implements [`Client`], whose single operation resolves a
//! SQL string into an [`ExecuteOutcome`]. Backends are selected once, at
//! construction time, through [`create_client`].
//!
//! # Module Structure
//! - `http`: shared JSON-over-HTTP transport
//! - `splitgraph`, `seafowl`: HTTP backends
//! - `postgres`: Postgres-wire backend (fixed-response placeholder)

use crate::{
    ClientOptions, Result,
    error::MadatdataError,
    models::{ExecuteOutcome, QueryError},
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::str::FromStr;

/// Supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Splitgraph,
    Seafowl,
    Postgres,
}

impl Backend {
    /// All backends, in display order.
    pub const ALL: [Backend; 3] = [Backend::Splitgraph, Backend::Seafowl, Backend::Postgres];

    /// Name accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Splitgraph => "splitgraph",
            Backend::Seafowl => "seafowl",
            Backend::Postgres => "postgres",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = MadatdataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "splitgraph" | "ddn" => Ok(Backend::Splitgraph),
            "seafowl" => Ok(Backend::Seafowl),
            "postgres" | "postgresql" | "pg" => Ok(Backend::Postgres),
            other => Err(MadatdataError::configuration(format!(
                "Unknown backend '{}' (expected splitgraph, seafowl or postgres)",
                other
            ))),
        }
    }
}

/// Query execution capability shared by every backend.
///
/// # Contract
/// `execute` never panics and never surfaces backend or network failures
/// through anything other than the `Err` side of the returned outcome.
///
/// # Object Safety
/// This trait is object-safe, allowing `Box<dyn Client>` and
/// `Arc<dyn Client>`.
#[async_trait]
pub trait Client: Send + Sync {
    /// Sends raw SQL text to the backend.
    async fn execute(&self, query: &str) -> ExecuteOutcome;

    /// Backend this client talks to.
    fn backend(&self) -> Backend;

    /// Endpoint description with credentials redacted.
    fn endpoint(&self) -> String;
}

/// Typed execution helpers available on every [`Client`].
#[async_trait]
pub trait ClientExt: Client {
    /// Executes `query` and decodes the rows into `T`.
    ///
    /// Rows that do not fit `T` produce a decode [`QueryError`].
    async fn execute_as<T>(&self, query: &str) -> ExecuteOutcome<T>
    where
        T: DeserializeOwned + Send,
    {
        let result = self.execute(query).await?;
        result.into_typed::<T>()
    }
}

impl<C: Client + ?Sized> ClientExt for C {}

/// Factory function creating a client for `backend`.
///
/// # Errors
/// Returns an error if:
/// - The options are malformed for this backend
/// - The backend was compiled out (see the `http` and `postgresql` features)
pub fn create_client(backend: Backend, options: ClientOptions) -> Result<Box<dyn Client>> {
    match backend {
        #[cfg(feature = "http")]
        Backend::Splitgraph => Ok(Box::new(splitgraph::SplitgraphClient::new(options)?)),
        #[cfg(feature = "http")]
        Backend::Seafowl => Ok(Box::new(seafowl::SeafowlClient::new(options)?)),
        #[cfg(not(feature = "http"))]
        Backend::Splitgraph | Backend::Seafowl => {
            let _ = options;
            Err(MadatdataError::unsupported_feature(
                format!("{} client", backend),
                "Compile with --features http to enable HTTP backends",
            ))
        }
        #[cfg(feature = "postgresql")]
        Backend::Postgres => Ok(Box::new(postgres::PostgresClient::new(options)?)),
        #[cfg(not(feature = "postgresql"))]
        Backend::Postgres => {
            let _ = options;
            Err(MadatdataError::unsupported_feature(
                "Postgres client",
                "Compile with --features postgresql to enable the Postgres-wire backend",
            ))
        }
    }
}

/// Converts a failure chain into a multi-line diagnostic trace.
pub(crate) fn error_trace(error: &(dyn std::error::Error + 'static)) -> String {
    let mut trace = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        trace.push_str("\n  caused by: ");
        trace.push_str(&cause.to_string());
        source = cause.source();
    }
    trace
}

/// Wraps a transport-level failure into a query error.
pub(crate) fn transport_error(error: &(dyn std::error::Error + 'static)) -> QueryError {
    QueryError::transport(error.to_string(), error_trace(error))
}

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub mod splitgraph;

#[cfg(feature = "http")]
pub mod seafowl;

#[cfg(feature = "postgresql")]
pub mod postgres;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QueryErrorKind, QueryResult};

    #[test]
    fn test_backend_from_str() {
        assert_eq!("splitgraph".parse::<Backend>().unwrap(), Backend::Splitgraph);
        assert_eq!("Seafowl".parse::<Backend>().unwrap(), Backend::Seafowl);
        assert_eq!("postgresql".parse::<Backend>().unwrap(), Backend::Postgres);
        assert_eq!(" pg ".parse::<Backend>().unwrap(), Backend::Postgres);
        assert!("mysql".parse::<Backend>().is_err());
    }

    #[test]
    fn test_backend_display_round_trips() {
        for backend in Backend::ALL {
            assert_eq!(backend.to_string().parse::<Backend>().unwrap(), backend);
        }
    }

    #[test]
    fn test_error_trace_includes_sources() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let outer = MadatdataError::io("connecting", inner);
        let trace = error_trace(&outer);

        assert!(trace.starts_with("I/O operation failed: connecting"));
        assert!(trace.contains("caused by: refused"));

        let error = transport_error(&outer);
        assert_eq!(error.kind, QueryErrorKind::Transport);
        assert!(!error.success);
    }

    struct FixedClient;

    #[async_trait]
    impl Client for FixedClient {
        async fn execute(&self, _query: &str) -> ExecuteOutcome {
            let body = serde_json::json!({
                "success": true,
                "command": "SELECT",
                "rowCount": 1,
                "rows": [{"id": 7, "name": "seven"}]
            });
            serde_json::from_value::<QueryResult>(body)
                .map_err(|e| QueryError::decode("bad fixture", e.to_string()))
        }

        fn backend(&self) -> Backend {
            Backend::Splitgraph
        }

        fn endpoint(&self) -> String {
            "fixed://".to_string()
        }
    }

    #[tokio::test]
    async fn test_execute_as_decodes_rows() {
        #[derive(serde::Deserialize)]
        struct Item {
            id: u32,
            name: String,
        }

        let client: Box<dyn Client> = Box::new(FixedClient);
        let result = client.execute_as::<Item>("SELECT 1").await.unwrap();
        assert_eq!(result.rows[0].id, 7);
        assert_eq!(result.rows[0].name, "seven");
    }

    #[tokio::test]
    async fn test_execute_as_shape_mismatch() {
        let outcome = FixedClient.execute_as::<Vec<String>>("SELECT 1").await;
        let error = outcome.unwrap_err();
        assert_eq!(error.kind, QueryErrorKind::Decode);
    }
}
