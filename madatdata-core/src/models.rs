//! Query result and error contract shared by every backend.
//!
//! Every client resolves `execute` into an [`ExecuteOutcome`]: a
//! [`QueryResult`] on success or a [`QueryError`] on any failure. The sum
//! type makes "exactly one of response/error" structural; the
//! [`OutcomeEnvelope`] gives the `{response, error}` wire shape for
//! consumers that expect two nullable fields.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default row shape: a JSON object keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// Outcome of a single `execute` call.
pub type ExecuteOutcome<R = Row> = Result<QueryResult<R>, QueryError>;

/// Column descriptor as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "tableID", default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<i64>,
    #[serde(rename = "columnID", default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<i64>,
    #[serde(rename = "dataTypeID", default, skip_serializing_if = "Option::is_none")]
    pub data_type_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type_modifier: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_type: Option<String>,
}

/// Successful query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<R = Row> {
    /// Always `true`; kept for wire compatibility
    #[serde(default = "success_flag")]
    pub success: bool,
    /// Statement tag, e.g. `SELECT`
    pub command: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    pub row_count: u64,
    #[serde(default = "Vec::new")]
    pub rows: Vec<R>,
    #[serde(default)]
    pub execution_time: String,
    #[serde(default)]
    pub execution_time_high_res: String,
}

/// Bodies that omit `success` are successful unless they say otherwise.
fn success_flag() -> bool {
    true
}

impl<R> QueryResult<R> {
    /// Maps each row into another shape, keeping the metadata.
    pub fn map_rows<T, F>(self, f: F) -> QueryResult<T>
    where
        F: FnMut(R) -> T,
    {
        QueryResult {
            success: self.success,
            command: self.command,
            fields: self.fields,
            row_count: self.row_count,
            rows: self.rows.into_iter().map(f).collect(),
            execution_time: self.execution_time,
            execution_time_high_res: self.execution_time_high_res,
        }
    }

    /// Column names in result order.
    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

impl QueryResult<Row> {
    /// Decodes every row into `T`.
    ///
    /// # Errors
    /// Returns a [`QueryErrorKind::Decode`] error naming the first row that
    /// does not match `T`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<QueryResult<T>, QueryError> {
        let mut rows = Vec::with_capacity(self.rows.len());
        for (index, row) in self.rows.into_iter().enumerate() {
            let typed = serde_json::from_value(Value::Object(row)).map_err(|e| {
                QueryError::decode(
                    format!("row {} does not match the requested shape", index),
                    e.to_string(),
                )
            })?;
            rows.push(typed);
        }

        Ok(QueryResult {
            success: self.success,
            command: self.command,
            fields: self.fields,
            row_count: self.row_count,
            rows,
            execution_time: self.execution_time,
            execution_time_high_res: self.execution_time_high_res,
        })
    }
}

/// Where a query failure came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryErrorKind {
    /// Network failure: DNS, connect, TLS, timeout
    Transport,
    /// The backend answered and reported a failure
    #[default]
    Backend,
    /// The backend answered with a body that does not fit the contract
    Decode,
}

impl std::fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryErrorKind::Transport => write!(f, "transport"),
            QueryErrorKind::Backend => write!(f, "backend"),
            QueryErrorKind::Decode => write!(f, "decode"),
        }
    }
}

/// Failed query, captured as a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryError {
    /// Always `false`; kept for wire compatibility
    pub success: bool,
    /// Backend payload or failure message
    pub error: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
    #[serde(default)]
    pub kind: QueryErrorKind,
}

impl QueryError {
    /// Creates an error of the given kind.
    pub fn new(kind: QueryErrorKind, error: impl Into<Value>, trace: Option<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            trace,
            kind,
        }
    }

    /// Network-level failure with a diagnostic trace.
    pub fn transport(message: impl Into<String>, trace: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::new(QueryErrorKind::Transport, message, Some(trace.into()))
    }

    /// Failure reported by the backend itself.
    pub fn backend(payload: impl Into<Value>, trace: Option<String>) -> Self {
        Self::new(QueryErrorKind::Backend, payload, trace)
    }

    /// Response body that does not fit the contract.
    pub fn decode(message: impl Into<String>, trace: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::new(QueryErrorKind::Decode, message, Some(trace.into()))
    }

    /// Human-readable message extracted from the error payload.
    pub fn message(&self) -> String {
        match &self.error {
            Value::String(s) => s.clone(),
            Value::Object(map) => map
                .get("message")
                .or_else(|| map.get("error"))
                .and_then(Value::as_str)
                .map_or_else(|| self.error.to_string(), str::to_string),
            other => other.to_string(),
        }
    }
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message())
    }
}

impl std::error::Error for QueryError {}

/// `{response, error}` pair in the two-nullable-field wire shape.
///
/// Only constructible from an outcome, so exactly one field is populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeEnvelope<T = QueryResult> {
    response: Option<T>,
    error: Option<QueryError>,
}

impl<T> OutcomeEnvelope<T> {
    /// Success side, if populated.
    pub fn response(&self) -> Option<&T> {
        self.response.as_ref()
    }

    /// Error side, if populated.
    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    /// Returns `true` when the error side is populated.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl<T: Serialize> OutcomeEnvelope<T> {
    /// Renders the envelope as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns [`crate::MadatdataError::Serialization`] if the response type
    /// fails to serialize.
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::MadatdataError::serialization("outcome envelope", e))
    }
}

impl<T> From<Result<T, QueryError>> for OutcomeEnvelope<T> {
    fn from(outcome: Result<T, QueryError>) -> Self {
        match outcome {
            Ok(response) => Self {
                response: Some(response),
                error: None,
            },
            Err(error) => Self {
                response: None,
                error: Some(error),
            },
        }
    }
}
