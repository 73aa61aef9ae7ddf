//! Plugin dispatch for import connectors.
//!
//! A [`Db`] owns a read-only map of named [`Plugin`]s and routes
//! `import_data` calls to them. Dispatch does no transformation and no
//! validation beyond the existence of the named plugin: the plugin's
//! outcome is returned unchanged.
//!
//! Asking for an unregistered plugin is a caller error and fails
//! synchronously with [`MadatdataError::PluginNotFound`], before any
//! future exists. Import failures, on the other hand, are values on the
//! `Err` side of the [`ImportOutcome`].

use crate::{
    ClientOptions, Result,
    error::MadatdataError,
    models::QueryError,
};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub mod csv;

/// Opaque plugin options (source or destination).
pub type ImportOptions = Value;

/// Outcome of a plugin import: a response payload or a captured error.
pub type ImportOutcome = std::result::Result<Value, QueryError>;

/// Named import connector.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique name the plugin is registered under.
    fn name(&self) -> &str;

    /// Imports data described by `source` into `destination`.
    async fn import_data(
        &self,
        source: &ImportOptions,
        destination: &ImportOptions,
    ) -> ImportOutcome;
}

/// Plugin name to plugin, built once and read-only afterwards.
pub type PluginMap = BTreeMap<String, Arc<dyn Plugin>>;

/// Plugin-dispatching database handle.
pub struct Db {
    plugins: PluginMap,
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("plugins", &self.plugin_names())
            .finish()
    }
}

impl Db {
    /// Builds the plugin map.
    ///
    /// # Errors
    /// Returns [`MadatdataError::DuplicatePlugin`] if two plugins share a name.
    pub fn new<I>(plugins: I) -> Result<Self>
    where
        I: IntoIterator<Item = Arc<dyn Plugin>>,
    {
        let mut map = PluginMap::new();
        for plugin in plugins {
            let name = plugin.name().to_string();
            if map.contains_key(&name) {
                return Err(MadatdataError::duplicate_plugin(name));
            }
            map.insert(name, plugin);
        }

        debug!("Registered {} plugin(s)", map.len());
        Ok(Self { plugins: map })
    }

    /// Builds a `Db` with the built-in plugins bound to `options`.
    ///
    /// # Errors
    /// Propagates option validation failures.
    pub fn with_default_plugins(options: &ClientOptions) -> Result<Self> {
        options.validate()?;
        Self::new([Arc::new(csv::CsvPlugin::new(options)) as Arc<dyn Plugin>])
    }

    /// Registered plugin names, sorted.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    /// Looks up a plugin by name.
    pub fn plugin(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.get(name)
    }

    /// Routes an import to the named plugin.
    ///
    /// The lookup happens before any future is created, so an unknown name
    /// fails immediately at the call site.
    ///
    /// # Errors
    /// Returns [`MadatdataError::PluginNotFound`] if `plugin_name` is not
    /// registered.
    ///
    /// # Example
    /// ```rust
    /// use madatdata_core::{ClientOptions, db::Db};
    ///
    /// let db = Db::with_default_plugins(&ClientOptions::new()).unwrap();
    /// let source = serde_json::json!({});
    /// assert!(db.import_data("parquet", &source, &source).is_err());
    /// ```
    pub fn import_data<'a>(
        &'a self,
        plugin_name: &str,
        source: &'a ImportOptions,
        destination: &'a ImportOptions,
    ) -> Result<BoxFuture<'a, ImportOutcome>> {
        let plugin = self
            .plugins
            .get(plugin_name)
            .ok_or_else(|| MadatdataError::plugin_not_found(plugin_name))?;

        debug!("Dispatching import to plugin '{}'", plugin_name);
        Ok(plugin.import_data(source, destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoPlugin(&'static str);

    #[async_trait]
    impl Plugin for EchoPlugin {
        fn name(&self) -> &str {
            self.0
        }

        async fn import_data(
            &self,
            source: &ImportOptions,
            destination: &ImportOptions,
        ) -> ImportOutcome {
            if source.is_null() {
                return Err(QueryError::backend("source missing", None));
            }
            Ok(json!({"plugin": self.0, "source": source, "destination": destination}))
        }
    }

    fn echo_db() -> Db {
        Db::new([
            Arc::new(EchoPlugin("echo")) as Arc<dyn Plugin>,
            Arc::new(EchoPlugin("mirror")) as Arc<dyn Plugin>,
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_returns_plugin_outcome_unchanged() {
        let db = echo_db();
        let source = json!({"a": 1});
        let destination = json!({"b": 2});

        let response = db
            .import_data("mirror", &source, &destination)
            .unwrap()
            .await
            .unwrap();
        assert_eq!(
            response,
            json!({"plugin": "mirror", "source": {"a": 1}, "destination": {"b": 2}})
        );
    }

    #[tokio::test]
    async fn test_plugin_error_is_a_value() {
        let db = echo_db();
        let outcome = db
            .import_data("echo", &Value::Null, &Value::Null)
            .unwrap()
            .await;

        let error = outcome.unwrap_err();
        assert!(!error.success);
        assert_eq!(error.message(), "source missing");
    }

    #[test]
    fn test_unknown_plugin_fails_synchronously() {
        let db = echo_db();
        let options = json!({});

        // No runtime needed: the failure happens before any future exists
        let result = db.import_data("missing", &options, &options);
        assert!(matches!(
            result,
            Err(MadatdataError::PluginNotFound { ref name }) if name == "missing"
        ));
    }

    #[test]
    fn test_duplicate_plugin_names_rejected() {
        let result = Db::new([
            Arc::new(EchoPlugin("echo")) as Arc<dyn Plugin>,
            Arc::new(EchoPlugin("echo")) as Arc<dyn Plugin>,
        ]);
        assert!(matches!(result, Err(MadatdataError::DuplicatePlugin { .. })));
    }

    #[test]
    fn test_plugin_names_sorted() {
        let db = echo_db();
        assert_eq!(db.plugin_names(), vec!["echo", "mirror"]);
        assert!(db.plugin("echo").is_some());
        assert!(db.plugin("csv").is_none());
    }

    #[test]
    fn test_default_plugins() {
        let db = Db::with_default_plugins(&ClientOptions::new()).unwrap();
        assert_eq!(db.plugin_names(), vec!["csv"]);
    }
}
