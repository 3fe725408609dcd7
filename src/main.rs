//! Statecraft - Entry Point
//!
//! Loads the map and game configuration, builds the HTTP router, and
//! serves until Ctrl+C. Games themselves are created over the admin
//! endpoints; this binary only hosts them.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use statecraft::core::config::GameConfig;
use statecraft::model::map::{default_map, MapSpec};
use statecraft::server::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about = "Geopolitical strategy game server for automated agents")]
struct Args {
    /// Address to bind (ip or host)
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Token required by the /admin endpoints
    #[arg(long, env = "STATECRAFT_ADMIN_TOKEN")]
    admin_token: String,

    /// Game configuration overrides (TOML); defaults apply when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Map definition (JSON); the built-in six-country map when absent
    #[arg(long)]
    map: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GameConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config from {path:?}"))?,
        None => GameConfig::default(),
    };
    config.validate().context("invalid game configuration")?;

    let map = match &args.map {
        Some(path) => MapSpec::from_json_file(path)
            .with_context(|| format!("failed to load map from {path:?}"))?,
        None => default_map(),
    };
    map.validate().context("invalid map")?;
    info!(
        countries = map.countries.len(),
        provinces = map.provinces.len(),
        "map loaded"
    );

    let state = AppState::new(args.admin_token, map, config);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("failed to parse bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind listener on {addr}"))?;
    info!("listening on http://{addr}");

    let server = axum::serve(listener, app.into_make_service());

    tokio::select! {
        result = server => result.context("server exited with error")?,
        _ = signal::ctrl_c() => {
            warn!("received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("statecraft=info,tower_http=info"));

    // Ignore error if already set (e.g., during tests).
    let _ = fmt().with_env_filter(env_filter).try_init();
}
