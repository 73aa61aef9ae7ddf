//! Command-line launcher for Splitgraph and Seafowl queries.
//!
//! Results go to stdout as JSON; logs go to stderr.
//!
//! # Security Guarantees
//! - Secrets are never logged; endpoints are redacted before display
//! - Secrets can be entered interactively instead of on the command line

use clap::Parser;
use madatdata_cli::{Cli, Command, ConnectionArgs, CredentialSource, ImportArgs};
use madatdata_core::{Backend, ClientOptions, Db, OutcomeEnvelope, create_client, init_logging};
use serde::Serialize;
use std::process::ExitCode;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.global.verbose, cli.global.quiet)?;

    match &cli.command {
        Command::Query(args) => run_query(&cli.connection, &args.sql).await,
        Command::Import(args) => run_import(&cli.connection, args).await,
        Command::List => {
            list_available()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes one query and prints its envelope
async fn run_query(connection: &ConnectionArgs, sql: &str) -> anyhow::Result<ExitCode> {
    let (options, source) = connection.client_options()?;
    log_credential_source(source);

    let client = create_client(connection.backend, options).map_err(|e| {
        error!("Failed to create {} client: {}", connection.backend, e);
        e
    })?;

    info!("Querying {} at {}", client.backend(), client.endpoint());
    let envelope = OutcomeEnvelope::from(client.execute(sql).await);

    if let Some(error) = envelope.error() {
        error!("Query failed ({}): {}", error.kind, error.message());
    } else if let Some(response) = envelope.response() {
        info!("✓ {} returned {} row(s)", response.command, response.row_count);
    }

    print_envelope(&envelope)
}

/// Dispatches one import to a plugin and prints its envelope
async fn run_import(connection: &ConnectionArgs, args: &ImportArgs) -> anyhow::Result<ExitCode> {
    let (options, source) = connection.client_options()?;
    log_credential_source(source);

    let (source_options, destination_options) = args.options()?;
    let db = Db::with_default_plugins(&options)?;

    info!("Importing through plugin '{}'", args.plugin);
    let outcome = db
        .import_data(&args.plugin, &source_options, &destination_options)
        .map_err(|e| {
            error!("Available plugins: {}", db.plugin_names().join(", "));
            e
        })?
        .await;

    let envelope = OutcomeEnvelope::from(outcome);
    if let Some(error) = envelope.error() {
        error!("Import failed: {}", error.message());
    }

    print_envelope(&envelope)
}

fn print_envelope<T: Serialize>(envelope: &OutcomeEnvelope<T>) -> anyhow::Result<ExitCode> {
    println!("{}", envelope.to_json_pretty()?);

    Ok(if envelope.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn log_credential_source(source: CredentialSource) {
    match source {
        CredentialSource::Anonymous => debug!("No credential supplied, querying anonymously"),
        CredentialSource::Arguments => debug!("Using credential from arguments"),
        CredentialSource::Prompt => debug!("Using credential from prompt"),
    }
}

/// Lists backends and import plugins
fn list_available() -> anyhow::Result<()> {
    println!("Backends:");
    for backend in Backend::ALL {
        println!("  {:<11} {}", backend.as_str(), backend_status(backend));
    }

    let db = Db::with_default_plugins(&ClientOptions::new())?;
    println!();
    println!("Import plugins:");
    for name in db.plugin_names() {
        println!("  {}", name);
    }

    Ok(())
}

fn backend_status(backend: Backend) -> String {
    match backend {
        #[cfg(feature = "http")]
        Backend::Splitgraph => madatdata_core::clients::splitgraph::DEFAULT_ENDPOINT.to_string(),
        #[cfg(feature = "http")]
        Backend::Seafowl => madatdata_core::clients::seafowl::DEFAULT_ENDPOINT.to_string(),
        #[cfg(feature = "postgresql")]
        Backend::Postgres => format!(
            "{} (placeholder)",
            madatdata_core::clients::postgres::DEFAULT_CONNECTION_STRING
        ),
        #[allow(unreachable_patterns)]
        _ => "(not compiled in)".to_string(),
    }
}
