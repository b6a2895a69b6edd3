//! Docktop - A live terminal dashboard for your Docker containers
//!
//! Polls the container runtime, aggregates per-container resource usage and
//! renders a fixed-layout view with details, logs and start/stop/restart
//! controls.

mod config;
mod core;
mod integrations;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::core::app::App;
use crate::integrations::docker::{with_timeout, DockerClient, RuntimeGateway};

#[derive(Parser)]
#[command(name = "docktop")]
#[command(author = "Docktop Contributors")]
#[command(version = "0.1.0")]
#[command(about = "A live terminal dashboard for your Docker containers", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Poll interval in milliseconds (overrides the config file)
    #[arg(short, long, value_name = "MS")]
    interval: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a one-shot table of containers and exit
    Ps,

    /// Write the default configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

fn setup_logging(verbosity: u8) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // The dashboard owns the terminal, so logs only ever go to a file
    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docktop")
        .join("logs");

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "docktop.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

/// Connect and ping before the terminal is touched
async fn connect(config: &Config) -> Result<Arc<dyn RuntimeGateway>> {
    let client = DockerClient::connect(config.docker.socket.as_deref())
        .context("cannot connect to Docker")?;
    with_timeout(config.docker.fetch_timeout(), client.ping())
        .await
        .context("Docker daemon is not responding")?;
    tracing::info!("connected to Docker");
    Ok(Arc::new(client))
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive for the duration of the program
    let _logging_guard = setup_logging(cli.verbose)?;

    if let Some(Commands::Init { force }) = cli.command {
        let path = cli
            .config
            .or_else(Config::default_path)
            .context("no configuration directory available")?;
        return config::init_config(&path, force);
    }

    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(interval) = cli.interval {
        config.docker.poll_interval_ms = interval;
    }

    let gateway = connect(&config).await?;

    match cli.command {
        Some(Commands::Ps) => {
            integrations::docker::print_status(gateway, config.docker.fetch_timeout()).await?;
        }
        Some(Commands::Init { .. }) => {}
        None => {
            let mut app = App::new(&config, gateway)?;
            app.run().await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(error = %format!("{err:#}"), "fatal");
        eprintln!("docktop: {err:#}");
        std::process::exit(1);
    }
}
