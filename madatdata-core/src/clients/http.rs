//! JSON-over-HTTP transport shared by the Splitgraph and Seafowl clients.
//!
//! The transport is built once from [`ClientOptions`]: endpoint URL, auth
//! headers, proxy and timeout are all resolved at construction, so a bad
//! option fails there instead of on the first query.

use super::transport_error;
use crate::{
    ClientOptions, Result,
    error::MadatdataError,
    models::{ExecuteOutcome, QueryError, QueryResult},
};
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, warn};
use url::Url;

/// Request body sent to every HTTP backend.
#[derive(Debug, Serialize)]
struct SqlRequest<'a> {
    sql: &'a str,
}

/// Resolved HTTP transport: endpoint, client and default headers.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds a transport posting to `endpoint` with `headers` on every request.
    ///
    /// # Errors
    /// Returns a configuration error if the endpoint is not an absolute
    /// http(s) URL, the proxy address is unusable, or the HTTP client cannot
    /// be built.
    pub fn new(endpoint: &str, headers: HeaderMap, options: &ClientOptions) -> Result<Self> {
        options.validate()?;
        let endpoint = parse_endpoint(endpoint)?;

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .user_agent(concat!("madatdata/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = options.resolved_proxy() {
            let proxy_url = Url::parse(proxy.trim()).map_err(|e| {
                MadatdataError::configuration(format!("Invalid proxy address: {}", e))
            })?;
            let proxy = reqwest::Proxy::all(proxy_url.as_str()).map_err(|e| {
                MadatdataError::configuration(format!("Unusable proxy address: {}", e))
            })?;
            debug!(
                "Routing requests through proxy {}",
                crate::error::redact_database_url(proxy_url.as_str())
            );
            builder = builder.proxy(proxy);
        } else {
            // Direct connection; ignore HTTP_PROXY and friends
            builder = builder.no_proxy();
        }

        let client = builder.build().map_err(|e| {
            MadatdataError::configuration(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self { endpoint, client })
    }

    /// Endpoint the transport posts to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Posts `{"sql": query}` and maps the reply onto the result contract.
    pub async fn post_sql(&self, query: &str) -> ExecuteOutcome {
        let started = Instant::now();
        debug!(
            "POST {} (query length {})",
            self.endpoint.path(),
            query.len()
        );

        let response = match self
            .client
            .post(self.endpoint.clone())
            .json(&SqlRequest { sql: query })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Request to {} failed: {}", self.endpoint.host_str().unwrap_or(""), e);
                return Err(transport_error(&e));
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Reading response body failed: {}", e);
                return Err(transport_error(&e));
            }
        };
        debug!(
            "Response status={} bytes={} elapsed_ms={}",
            status,
            body.len(),
            started.elapsed().as_millis()
        );

        interpret_response(status, &body)
    }
}

/// Maps an HTTP status and raw body onto the result contract.
///
/// Non-2xx statuses and bodies carrying an error indicator become backend
/// errors; bodies that do not parse become decode errors.
pub(crate) fn interpret_response(status: reqwest::StatusCode, body: &[u8]) -> ExecuteOutcome {
    let status_line = format!("HTTP {}", status);

    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) if status.is_success() => {
            return Err(QueryError::decode(
                "Response body is not valid JSON",
                format!("{}: {}", status_line, e),
            ));
        }
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            let payload = if text.is_empty() {
                Value::String(status_line.clone())
            } else {
                Value::String(text)
            };
            warn!("Backend returned {}", status_line);
            return Err(QueryError::backend(payload, Some(status_line)));
        }
    };

    if !status.is_success() || has_error_indicator(&value) {
        warn!("Backend reported a query failure ({})", status_line);
        let payload = match value {
            Value::Object(mut map) => match map.remove("error") {
                Some(error) if !error.is_null() => error,
                _ => Value::Object(map),
            },
            other => other,
        };
        return Err(QueryError::backend(payload, Some(status_line)));
    }

    serde_json::from_value::<QueryResult>(value).map_err(|e| {
        QueryError::decode(
            "Response body does not match the query result shape",
            format!("{}: {}", status_line, e),
        )
    })
}

fn has_error_indicator(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            map.get("success") == Some(&Value::Bool(false))
                || map.get("error").is_some_and(|e| !e.is_null())
        }
        _ => false,
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint.trim()).map_err(|e| {
        MadatdataError::configuration(format!("Invalid endpoint URL: {}", e))
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(MadatdataError::configuration(format!(
            "Endpoint scheme '{}' is not http or https",
            other
        ))),
    }
}
