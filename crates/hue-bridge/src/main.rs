//! `hue` command-line tool: entry point.
//!
//! Finds Hue bridges on the local network, performs the credential handshake,
//! and sends arbitrary REST requests.
//!
//! # Usage
//!
//! ```text
//! hue [--config <FILE>] <COMMAND>
//!
//! Commands:
//!   discover      Search the LAN for bridges and print their addresses
//!   create-user   Ask a bridge for a new username (press the link button first)
//!   request       Send one REST request and print the response body
//! ```
//!
//! # Configuration
//!
//! Defaults come from the config file (see
//! `hue_bridge::infrastructure::storage::config`).  Command-line flags win
//! over the file.  The log level is `RUST_LOG` when set, otherwise the
//! file's `log_level`.
//!
//! | Variable          | Flag            |
//! |-------------------|-----------------|
//! | `HUE_CONFIG`      | `--config`      |
//! | `HUE_BRIDGE`      | `--bridge`      |
//! | `HUE_USERNAME`    | `--username`    |

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hue_bridge::infrastructure::network::{discover, Bridge};
use hue_bridge::infrastructure::storage::config::{
    load_config, load_config_from, AppConfig, ConfigError,
};
use hue_core::RequestInput;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Hue-Over-IP bridge tool.
#[derive(Debug, Parser)]
#[command(name = "hue", about = "Discover Hue bridges and call their REST API", version)]
struct Cli {
    /// Config file to read instead of the platform default.
    #[arg(long, global = true, env = "HUE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search the LAN for bridges and print one address per line.
    Discover {
        /// Length of the discovery window in seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Ask a bridge for a new username.
    ///
    /// Press the link button on the bridge shortly before running this.
    CreateUser {
        /// Bridge address (`host` or `host:port`).
        #[arg(long, env = "HUE_BRIDGE")]
        bridge: String,

        /// Device type sent to the bridge, `<app>#<device>`.
        #[arg(long)]
        device_type: Option<String>,
    },

    /// Send one request and print the response body.
    Request {
        /// Bridge address (`host` or `host:port`).
        #[arg(long, env = "HUE_BRIDGE")]
        bridge: String,

        /// Username obtained from `create-user`.  Empty for unauthenticated calls.
        #[arg(long, env = "HUE_USERNAME", default_value = "")]
        username: String,

        #[arg(long, default_value = "GET")]
        method: String,

        /// Path below `/api/<username>/`, e.g. `lights/1/state`.
        #[arg(long, default_value = "")]
        path: String,

        /// JSON request body.
        #[arg(long)]
        body: Option<String>,
    },
}

impl Cli {
    /// Loads the config file.  An explicit `--config` must load; the platform
    /// default falls back to built-in defaults and reports why.
    fn load_app_config(&self) -> anyhow::Result<(AppConfig, Option<ConfigError>)> {
        match &self.config {
            Some(path) => {
                let config = load_config_from(path)
                    .with_context(|| format!("failed to load config from {}", path.display()))?;
                Ok((config, None))
            }
            None => match load_config() {
                Ok(config) => Ok((config, None)),
                Err(e) => Ok((AppConfig::default(), Some(e))),
            },
        }
    }
}

/// Parses `--body` into a JSON value.
fn parse_body(body: Option<&str>) -> anyhow::Result<Option<Value>> {
    body.map(|text| serde_json::from_str(text).context("--body is not valid JSON"))
        .transpose()
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// The runtime is built by hand so that it can be shut down without waiting
/// for a discovery search still running on the blocking pool.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (app_config, load_error) = cli.load_app_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&app_config.log_level)),
        )
        .init();

    if let Some(e) = load_error {
        warn!("could not load config file, using defaults: {e}");
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let result = runtime.block_on(run(cli.command, app_config));
    runtime.shutdown_background();
    result
}

async fn run(command: Command, app_config: AppConfig) -> anyhow::Result<()> {
    // First Ctrl+C cancels the running operation, a second one exits at once.
    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C signal: {e}");
            return;
        }
        info!("received Ctrl+C, cancelling");
        cancel_on_signal.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    match command {
        Command::Discover { timeout } => run_discover(&app_config, timeout, &cancel).await,
        Command::CreateUser { bridge, device_type } => {
            let bridge = Bridge::with_config(bridge, app_config.client_config())?;
            let created = bridge
                .create_user(&cancel, device_type.as_deref())
                .await
                .with_context(|| format!("failed to create user on {}", bridge.address()))?;
            println!("{}", created.username());
            Ok(())
        }
        Command::Request {
            bridge,
            username,
            method,
            path,
            body,
        } => {
            let bridge = Bridge::with_config(bridge, app_config.client_config())?;
            let client = bridge.client(username)?;
            let input = RequestInput {
                method,
                path,
                body: parse_body(body.as_deref())?,
            };
            let response = client
                .execute_request(&cancel, input)
                .await
                .context("request failed")?;
            println!("{}", response.text().await?);
            Ok(())
        }
    }
}

async fn run_discover(
    app_config: &AppConfig,
    timeout: Option<u64>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let mut config = app_config.discovery_config()?;
    if let Some(secs) = timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    info!(timeout = ?config.timeout, "searching for bridges");
    let search = tokio::task::spawn_blocking(move || discover(&config));

    // The blocking search cannot be interrupted; on cancel it is abandoned
    // and dropped with the runtime.
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => anyhow::bail!("discovery cancelled"),
        joined = search => joined.context("discovery task panicked")?,
    };

    let addresses = match result {
        Ok(addresses) => addresses,
        Err(e) => {
            for address in e.partial_result() {
                println!("{address}");
            }
            return Err(e).context("discovery failed");
        }
    };

    if addresses.is_empty() {
        info!("no bridges found");
    }
    for address in addresses {
        println!("{address}");
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
