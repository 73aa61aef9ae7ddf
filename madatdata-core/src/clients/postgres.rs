//! Postgres-wire client (placeholder implementation).
//!
//! The connection descriptor is derived and validated at construction, but
//! `execute` does not open a connection yet: every query resolves to the
//! same zero-row `SELECT` result. Callers and tests rely on that fixed
//! outcome, so it must stay stable until real wire execution lands.

use super::{Backend, Client};
use crate::{
    ClientOptions, Result,
    error::{MadatdataError, redact_database_url},
    models::{ExecuteOutcome, QueryResult},
};
use async_trait::async_trait;
use sqlx::postgres::PgConnectOptions;
use std::str::FromStr;
use tracing::debug;

/// Splitgraph DDN over the Postgres wire protocol.
pub const DEFAULT_CONNECTION_STRING: &str = "postgresql://data.splitgraph.com:5432/ddn";

/// Postgres-wire client (placeholder).
pub struct PostgresClient {
    connect_options: PgConnectOptions,
}

impl PostgresClient {
    /// Creates a client, parsing the connection string eagerly.
    ///
    /// An `ApiKey` credential becomes the user name and password; a `Token`
    /// credential becomes the password.
    ///
    /// # Errors
    /// Returns a configuration error if the options are invalid or the
    /// connection string does not parse. The string is redacted in the
    /// error message.
    pub fn new(options: ClientOptions) -> Result<Self> {
        options.validate()?;
        let connection_string = options
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_CONNECTION_STRING);

        let mut connect_options = PgConnectOptions::from_str(connection_string).map_err(|e| {
            MadatdataError::configuration(format!(
                "Invalid Postgres connection string {}: {}",
                redact_database_url(connection_string),
                e
            ))
        })?;

        if let Some(credential) = &options.credential {
            let (username, password) = credential.login();
            if let Some(username) = username {
                connect_options = connect_options.username(username);
            }
            connect_options = connect_options.password(password);
        }

        let client = Self { connect_options };
        debug!("Created Postgres client for {}", client.endpoint());
        Ok(client)
    }

    /// Fixed result returned for every query.
    pub fn placeholder_result() -> QueryResult {
        QueryResult {
            success: true,
            command: "SELECT".to_string(),
            fields: Vec::new(),
            row_count: 0,
            rows: Vec::new(),
            execution_time: "0ms".to_string(),
            execution_time_high_res: "0s 0ms".to_string(),
        }
    }
}

#[async_trait]
impl Client for PostgresClient {
    async fn execute(&self, query: &str) -> ExecuteOutcome {
        debug!(
            "Postgres placeholder answering query of length {}",
            query.len()
        );
        Ok(Self::placeholder_result())
    }

    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    fn endpoint(&self) -> String {
        format!(
            "postgresql://{}:{}/{}",
            self.connect_options.get_host(),
            self.connect_options.get_port(),
            self.connect_options.get_database().unwrap_or_default()
        )
    }
}
