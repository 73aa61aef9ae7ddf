//! Argument parsing and credential resolution for the `madatdata` binary.
//!
//! Kept in a library target so the parsing rules can be tested without
//! running the binary.

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use madatdata_core::{Backend, ClientOptions, security::CredentialOptions};
use std::time::Duration;

/// CLI argument structure
#[derive(Parser, Debug)]
#[command(name = "madatdata")]
#[command(about = "Query Splitgraph and Seafowl from the command line")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "
madatdata - uniform SQL access to Splitgraph and Seafowl

Every query prints a JSON envelope with exactly one of `response` or
`error` populated. The exit code is non-zero when `error` is set.

BACKENDS:
- splitgraph  Splitgraph DDN over HTTP (default)
- seafowl     Seafowl over HTTP
- postgres    Postgres wire (placeholder: always returns zero rows)

ENVIRONMENT:
- SPLITGRAPH_API_KEY / SPLITGRAPH_API_SECRET  API key pair
- MADATDATA_TOKEN                             bearer token
- MITM                                        proxy for outbound HTTP

EXAMPLES:
  madatdata query 'SELECT 1'
  madatdata --backend seafowl --endpoint http://localhost:8080/q query 'SELECT 1'
  madatdata import csv --source '{\"url\":\"https://example.com/a.csv\"}' \\
      --destination '{\"namespace\":\"me\",\"repository\":\"r\",\"table\":\"t\"}'
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a SQL query and print the outcome
    Query(QueryArgs),
    /// Run an import through a named plugin
    Import(ImportArgs),
    /// List backends and plugins
    List,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// SQL text sent verbatim to the backend
    pub sql: String,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Plugin name (see `madatdata list`)
    pub plugin: String,

    /// Source options as a JSON object
    #[arg(long, default_value = "{}")]
    pub source: String,

    /// Destination options as a JSON object
    #[arg(long, default_value = "{}")]
    pub destination: String,
}

impl ImportArgs {
    /// Parses the source and destination options.
    ///
    /// # Errors
    /// Returns an error naming the argument that is not valid JSON.
    pub fn options(&self) -> anyhow::Result<(serde_json::Value, serde_json::Value)> {
        let source =
            serde_json::from_str(&self.source).context("--source is not valid JSON")?;
        let destination =
            serde_json::from_str(&self.destination).context("--destination is not valid JSON")?;
        Ok((source, destination))
    }
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all logging except errors")]
    pub quiet: bool,
}

/// Backend selection and credentials.
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Backend to query
    #[arg(long, global = true, default_value = "splitgraph", value_parser = parse_backend)]
    pub backend: Backend,

    /// Endpoint URL (connection string for the postgres backend)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Splitgraph API key
    #[arg(long, global = true, env = "SPLITGRAPH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Splitgraph API secret
    #[arg(long, global = true, env = "SPLITGRAPH_API_SECRET", hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Bearer token, ignored when an API key is given
    #[arg(long, global = true, env = "MADATDATA_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Prompt for the secret instead of reading it from flags or environment
    #[arg(long, global = true)]
    pub prompt_secret: bool,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,
}

fn parse_backend(s: &str) -> Result<Backend, String> {
    s.parse::<Backend>().map_err(|e| e.to_string())
}

/// Where a credential came from, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// No credential
    Anonymous,
    /// Flags or environment
    Arguments,
    /// Interactive prompt
    Prompt,
}

impl ConnectionArgs {
    /// Resolves the credential, prompting through `prompt` when asked to.
    ///
    /// # Errors
    /// Returns an error if an API key has no secret, or the prompt fails.
    pub fn credential_with<F>(
        &self,
        mut prompt: F,
    ) -> anyhow::Result<(Option<CredentialOptions>, CredentialSource)>
    where
        F: FnMut(&str) -> std::io::Result<String>,
    {
        if let Some(api_key) = &self.api_key {
            let (secret, source) = match (&self.api_secret, self.prompt_secret) {
                (_, true) => (
                    prompt("API secret: ").context("Failed to read API secret")?,
                    CredentialSource::Prompt,
                ),
                (Some(secret), false) => (secret.clone(), CredentialSource::Arguments),
                (None, false) => {
                    bail!("--api-key requires --api-secret, SPLITGRAPH_API_SECRET or --prompt-secret")
                }
            };
            return Ok((
                Some(CredentialOptions::api_key(api_key.clone(), secret)),
                source,
            ));
        }

        if self.prompt_secret {
            let token = prompt("Token: ").context("Failed to read token")?;
            return Ok((Some(CredentialOptions::token(token)), CredentialSource::Prompt));
        }

        Ok(match &self.token {
            Some(token) => (
                Some(CredentialOptions::token(token.clone())),
                CredentialSource::Arguments,
            ),
            None => (None, CredentialSource::Anonymous),
        })
    }

    /// Builds client options, prompting on the terminal if requested.
    ///
    /// # Errors
    /// Returns an error if the credential cannot be resolved or the timeout is zero.
    pub fn client_options(&self) -> anyhow::Result<(ClientOptions, CredentialSource)> {
        let (credential, source) =
            self.credential_with(|prompt| rpassword::prompt_password(prompt))?;
        if self.timeout == 0 {
            bail!("--timeout must be greater than 0");
        }

        let mut options = ClientOptions::new().with_timeout(Duration::from_secs(self.timeout));
        if let Some(credential) = credential {
            options = options.with_credential(credential);
        }
        if let Some(endpoint) = &self.endpoint {
            options = options.with_endpoint(endpoint.clone());
        }
        Ok((options, source))
    }
}
