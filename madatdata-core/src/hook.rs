//! Data-fetching handle backed by a shared client.
//!
//! [`SqlProvider`] holds one long-lived client and hands out [`SqlQuery`]
//! handles that all share it. Each handle runs the state machine
//! `Idle -> Loading -> {Success, Failed}` and publishes its state on a
//! `tokio::sync::watch` channel.
//!
//! # Stale results
//! Every dispatch captures a generation number. Changing the query (or
//! dropping the handle) bumps the generation, and a result whose
//! generation is no longer current is discarded instead of committed. The
//! comparison runs under the state channel's lock, so a late result can
//! never overwrite the state of a newer query. Underlying requests are not
//! aborted, only ignored.

use crate::{
    clients::Client,
    models::{ExecuteOutcome, QueryError, QueryErrorKind, QueryResult},
};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Observable state of a [`SqlQuery`].
#[derive(Debug, Clone, PartialEq)]
pub enum SqlState {
    /// No query issued yet
    Idle,
    /// A query is in flight
    Loading,
    /// The latest query succeeded
    Success(QueryResult),
    /// The latest query failed
    Failed(QueryError),
}

impl SqlState {
    /// `true` while a query is in flight.
    pub fn loading(&self) -> bool {
        matches!(self, SqlState::Loading)
    }

    /// Result of the latest query, once it succeeded.
    pub fn response(&self) -> Option<&QueryResult> {
        match self {
            SqlState::Success(result) => Some(result),
            _ => None,
        }
    }

    /// Error of the latest query, once it failed.
    pub fn error(&self) -> Option<&QueryError> {
        match self {
            SqlState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ExecuteOutcome> for SqlState {
    fn from(outcome: ExecuteOutcome) -> Self {
        match outcome {
            Ok(result) => SqlState::Success(result),
            Err(error) => SqlState::Failed(error),
        }
    }
}

/// Supplies one shared client to every query handle created from it.
#[derive(Clone)]
pub struct SqlProvider {
    client: Arc<dyn Client>,
}

impl SqlProvider {
    /// Wraps a client for sharing.
    pub fn new(client: Arc<dyn Client>) -> Self {
        Self { client }
    }

    /// Shared client.
    pub fn client(&self) -> &Arc<dyn Client> {
        &self.client
    }

    /// Creates an idle handle.
    pub fn hook(&self) -> SqlQuery {
        SqlQuery {
            client: Arc::clone(&self.client),
            state: Arc::new(watch::Sender::new(SqlState::Idle)),
            generation: Arc::new(AtomicU64::new(0)),
            query: None,
        }
    }

    /// Creates a handle and immediately issues `query`.
    ///
    /// See [`SqlQuery::set_query`] for runtime requirements.
    pub fn use_sql(&self, query: impl Into<String>) -> SqlQuery {
        let mut handle = self.hook();
        handle.set_query(query);
        handle
    }
}

impl From<Box<dyn Client>> for SqlProvider {
    fn from(client: Box<dyn Client>) -> Self {
        Self::new(Arc::from(client))
    }
}

/// Per-consumer query handle.
pub struct SqlQuery {
    client: Arc<dyn Client>,
    state: Arc<watch::Sender<SqlState>>,
    generation: Arc<AtomicU64>,
    query: Option<String>,
}

impl SqlQuery {
    /// Switches the handle to `query`.
    ///
    /// Re-setting the current query is a no-op, so each distinct query
    /// issues exactly one `execute`. A new query resets the state to
    /// [`SqlState::Loading`] and discards whatever the previous one
    /// resolves to.
    ///
    /// The query runs on the current Tokio runtime. Without one, the handle
    /// settles immediately as [`SqlState::Failed`] with a transport error.
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if self.query.as_deref() == Some(query.as_str()) {
            return;
        }

        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self
                .generation
                .fetch_add(1, Ordering::SeqCst)
                .wrapping_add(1);
            *state = SqlState::Loading;
        });
        self.query = Some(query.clone());

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("No Tokio runtime to run the query on: {}", e);
                self.state.send_replace(SqlState::Failed(QueryError::new(
                    QueryErrorKind::Transport,
                    "query handle used outside a Tokio runtime",
                    Some(e.to_string()),
                )));
                return;
            }
        };

        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.generation);

        runtime.spawn(async move {
            let outcome = client.execute(&query).await;
            let committed = state.send_if_modified(|slot| {
                if current.load(Ordering::SeqCst) != generation {
                    return false;
                }
                *slot = SqlState::from(outcome);
                true
            });

            if !committed {
                debug!("Discarded stale result for generation {}", generation);
            }
        });
    }

    /// Query the handle currently tracks.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SqlState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every committed state change.
    pub fn subscribe(&self) -> watch::Receiver<SqlState> {
        self.state.subscribe()
    }

    /// Waits until the handle is no longer loading and returns that state.
    pub async fn settled(&self) -> SqlState {
        let mut receiver = self.state.subscribe();
        let settled = match receiver.wait_for(|state| !state.loading()).await {
            Ok(state) => state.clone(),
            // Unreachable while `self` holds a sender
            Err(_) => self.state(),
        };
        settled
    }
}

impl Drop for SqlQuery {
    fn drop(&mut self) {
        // Unmount: anything still in flight is stale
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
