//! pulsed — the Pulseboard daemon.
//!
//! Single binary that serves the metrics REST API and the dashboard
//! side by side:
//! - Metric store (redb)
//! - REST API at `/metrics`
//! - Dashboard at `/dashboard`, polling the API over HTTP
//!
//! # Usage
//!
//! ```text
//! pulsed serve --port 3000 --data-dir ./data
//! ```

mod config;
mod server;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use config::{FileConfig, Overrides, Settings};

const DEFAULT_LOG_FILTER: &str = "info,pulsed=debug,pulseboard=debug";
const CONFIG_FILE: &str = "pulseboard.toml";

#[derive(Parser)]
#[command(name = "pulsed", about = "Pulseboard metrics API and dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the metrics API and the dashboard.
    Serve {
        /// Port to listen on [default: 3000].
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for the metric store [default: ./data].
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Config file. `pulseboard.toml` is read if present.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Base URL the dashboard polls [default: the local server].
        #[arg(long)]
        api_url: Option<String>,

        /// Dashboard poll interval in milliseconds [default: 2000].
        #[arg(long)]
        poll_interval_ms: Option<u64>,

        /// Emit logs as JSON lines.
        #[arg(long)]
        log_json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            data_dir,
            config,
            api_url,
            poll_interval_ms,
            log_json,
        } => {
            init_tracing(log_json);
            let file = load_config(config)?;
            let settings = Settings::resolve(
                file,
                Overrides {
                    port,
                    data_dir,
                    api_url,
                    poll_interval_ms,
                },
            )?;
            run_serve(settings).await
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// An explicit `--config` must exist; the default file is optional.
fn load_config(explicit: Option<PathBuf>) -> anyhow::Result<FileConfig> {
    match explicit {
        Some(path) => {
            let file = FileConfig::from_file(&path)?;
            info!(path = ?path, "config loaded");
            Ok(file)
        }
        None => {
            let path = PathBuf::from(CONFIG_FILE);
            if path.exists() {
                let file = FileConfig::from_file(&path)?;
                info!(path = ?path, "config loaded");
                Ok(file)
            } else {
                Ok(FileConfig::default())
            }
        }
    }
}

async fn run_serve(settings: Settings) -> anyhow::Result<()> {
    info!("Pulseboard daemon starting");

    std::fs::create_dir_all(&settings.data_dir)?;
    let db_path = settings.data_dir.join("pulseboard.redb");

    let store = pulseboard_store::MetricStore::open(&db_path)?;
    info!(path = ?db_path, records = store.count()?, "metric store opened");

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "server listening");

    let client = pulseboard_dashboard::ApiClient::new(&settings.api_url)?;
    let dashboard = pulseboard_dashboard::Dashboard::start(client, settings.poll_interval);

    let router = server::build_app(store, &dashboard);

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    dashboard.stop().await;

    info!("Pulseboard daemon stopped");
    Ok(())
}
