//! Pluggable query clients for Splitgraph and Seafowl.
//!
//! This crate provides the contract shared by every backend and the
//! building blocks layered on top of it:
//!
//! - [`ClientOptions`] and [`security::CredentialOptions`] describe where and
//!   how to authenticate
//! - [`Client`] resolves raw SQL into an [`ExecuteOutcome`], whichever
//!   backend sits behind it
//! - [`db::Db`] dispatches imports to named plugins
//! - [`hook::SqlProvider`] shares one client between many query handles
//!
//! # Error model
//! Backend and network failures are values ([`QueryError`]) and never
//! escape `execute`. Contract violations (malformed options, unknown
//! plugins) are [`MadatdataError`]s returned at the offending call site.
//!
//! # Example
//! ```rust,no_run
//! use madatdata_core::{Backend, ClientOptions, create_client};
//!
//! # async fn run() -> madatdata_core::Result<()> {
//! let client = create_client(Backend::Splitgraph, ClientOptions::new())?;
//! match client.execute("SELECT 1 AS n").await {
//!     Ok(result) => println!("{} row(s)", result.row_count),
//!     Err(error) => eprintln!("{}", error),
//! }
//! # Ok(())
//! # }
//! ```

pub mod clients;
pub mod db;
pub mod error;
pub mod hook;
pub mod logging;
pub mod models;
pub mod options;
pub mod security;

// Re-export commonly used types
pub use clients::{Backend, Client, ClientExt, create_client};
pub use db::{Db, ImportOptions, ImportOutcome, Plugin, PluginMap};
pub use error::{MadatdataError, Result};
pub use hook::{SqlProvider, SqlQuery, SqlState};
pub use logging::init_logging;
pub use models::{
    ExecuteOutcome, Field, OutcomeEnvelope, QueryError, QueryErrorKind, QueryResult, Row,
};
pub use options::ClientOptions;
