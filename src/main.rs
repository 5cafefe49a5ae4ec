//! ibrcd - tree-federated chat daemon.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};
use ibrcd::config::ParentConfig;
use ibrcd::{Config, Server};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// ibrcd - tree-federated chat daemon
#[derive(Parser, Debug)]
#[command(name = "ibrcd")]
#[command(version, about, long_about = None, disable_help_flag = true)]
struct Args {
    /// Port to listen on (default 5001)
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Parent server host; requires --parent-port
    #[arg(short = 'h', long, requires = "parent_port")]
    parent_host: Option<String>,

    /// Parent server port; requires --parent-host
    #[arg(short = 'k', long, requires = "parent_host")]
    parent_port: Option<u16>,

    /// Configuration file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

impl Args {
    /// Load the config file, if any, and apply command-line overrides.
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path).map_err(|e| {
                error!(path = %path.display(), error = %e, "Failed to load config");
                e
            })?,
            None => Config::default(),
        };

        if let Some(port) = self.port {
            config.server.listen.set_port(port);
        }
        if let (Some(host), Some(port)) = (self.parent_host, self.parent_port) {
            config.parent = Some(ParentConfig { host, port });
        }
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = args.into_config()?;
    info!(
        listen = %config.server.listen,
        parent = ?config.parent.as_ref().map(|p| format!("{}:{}", p.host, p.port)),
        "Starting ibrcd"
    );

    let server = Server::bind(&config).await.map_err(|e| {
        error!(error = %e, "Startup failed");
        e
    })?;

    server.run().await.map_err(|e| {
        error!(error = %e, "Event loop failed");
        e
    })?;
    Ok(())
}
