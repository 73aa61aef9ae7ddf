//! Built-in `csv` import plugin.
//!
//! Validates a CSV source URL and a Splitgraph `namespace/repository`
//! destination table, and reports the resolved import. It does not contact
//! an ingestion service yet; like the Postgres-wire client, it answers
//! with a descriptor of what would be imported.

use super::{ImportOptions, ImportOutcome, Plugin};
use crate::{ClientOptions, models::QueryError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

/// Name the plugin is registered under.
pub const PLUGIN_NAME: &str = "csv";

#[derive(Debug, Deserialize)]
struct CsvSource {
    url: String,
}

#[derive(Debug, Deserialize)]
struct TableDestination {
    namespace: String,
    repository: String,
    table: String,
}

/// CSV import connector.
#[derive(Debug, Clone)]
pub struct CsvPlugin {
    credential_kind: Option<&'static str>,
}

impl CsvPlugin {
    /// Creates the plugin. Only the presence of a credential is retained.
    pub fn new(options: &ClientOptions) -> Self {
        Self {
            credential_kind: options.credential.as_ref().map(|c| c.kind()),
        }
    }
}

fn parse_options<T: for<'de> Deserialize<'de>>(
    value: &ImportOptions,
    what: &str,
) -> Result<T, QueryError> {
    serde_json::from_value(value.clone()).map_err(|e| {
        QueryError::backend(
            format!("Invalid {} options for the csv plugin", what),
            Some(e.to_string()),
        )
    })
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[async_trait]
impl Plugin for CsvPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    async fn import_data(
        &self,
        source: &ImportOptions,
        destination: &ImportOptions,
    ) -> ImportOutcome {
        let Some(credential_kind) = self.credential_kind else {
            return Err(QueryError::backend(
                "csv import requires a credential",
                None,
            ));
        };

        let source: CsvSource = parse_options(source, "source")?;
        let destination: TableDestination = parse_options(destination, "destination")?;

        let url = Url::parse(&source.url).map_err(|e| {
            QueryError::backend("csv source url is not a valid URL", Some(e.to_string()))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(QueryError::backend(
                format!("csv source scheme '{}' is not http or https", url.scheme()),
                None,
            ));
        }

        for (field, value) in [
            ("namespace", &destination.namespace),
            ("repository", &destination.repository),
            ("table", &destination.table),
        ] {
            if !is_identifier(value) {
                return Err(QueryError::backend(
                    format!("csv destination {} '{}' is not a valid identifier", field, value),
                    None,
                ));
            }
        }

        debug!(
            "csv import of {} into {}/{}",
            url.host_str().unwrap_or(""),
            destination.namespace,
            destination.repository
        );

        Ok(json!({
            "success": true,
            "plugin": PLUGIN_NAME,
            "source": {"url": url.as_str()},
            "destination": {
                "repository": format!("{}/{}", destination.namespace, destination.repository),
                "table": destination.table,
            },
            "auth": credential_kind,
        }))
    }
}
