//! todoctl - todo notes and counter HTTP service
//!
//! Configuration comes from the environment (optionally a `.env` file):
//! `SECRET`, `TODOS_PATH`, `DATABASE_URL` or `DATABASE_HOST`/`DATABASE_PORT`/
//! `DATABASE_USER`/`DATABASE_PASSWORD`/`DATABASE_NAME`. Flags override the
//! bind address and document path.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use todoctl_server::ServerConfig;
use tracing::info;

mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "todoctl",
    author,
    version,
    about = "Todo notes over a JSON document, plus a Postgres-backed counter"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Address to bind (overrides HOST)
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Todo document location (overrides TODOS_PATH)
    #[arg(long)]
    todos_path: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(bind) = self.bind {
            config.bind_addr.set_ip(bind);
        }
        if let Some(port) = self.port {
            config.bind_addr.set_port(port);
        }
        if let Some(path) = &self.todos_path {
            config.todos_path = path.clone();
        }
    }
}

// Handlers interleave at I/O awaits on one thread
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Missing .env is fine
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug })?;

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let mut config = ServerConfig::from_env().context("Invalid server configuration")?;
    cli.apply(&mut config);

    info!(
        bind = %config.bind_addr,
        todos = %config.todos_path.display(),
        policy = ?config.connect_policy,
        "Starting todoctl"
    );

    todoctl_server::run_server(config)
        .await
        .context("Server failed")?;
    Ok(())
}
