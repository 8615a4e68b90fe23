//! Portal read gateway.
//!
//! Serves live collection and document state over HTTP from an in-memory
//! store, optionally seeded from a JSON fixture.
//!
//! Usage:
//!   portal-gateway --port 4002 --fixture seed.json

use anyhow::{Context, Result};
use clap::Parser;
use portal_gateway::{build_router, Fixture, GatewayConfig};
use portal_model::SchemaRegistry;
use portal_store::MemoryStore;
use portal_sync::{Subscriber, SubscriberConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "portal-gateway")]
#[command(about = "HTTP read gateway over live portal subscriptions")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "4002")]
    port: u16,

    /// JSON fixture to seed the store with
    #[arg(short, long)]
    fixture: Option<PathBuf>,

    /// Milliseconds a request waits for its subscription to settle
    #[arg(long, default_value = "5000")]
    settle_timeout_ms: u64,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("Portal gateway starting...");
    let store = MemoryStore::new();
    if let Some(path) = &args.fixture {
        let fixture = Fixture::load(path)
            .with_context(|| format!("Failed to load fixture {}", path.display()))?;
        let written = fixture
            .seed(&store, &SchemaRegistry::portal())
            .context("Failed to seed store")?;
        info!("Seeded {} documents from {:?}", written, path);
    }

    let subscriber = Subscriber::with_config(Arc::new(store), SubscriberConfig::default());
    let config = GatewayConfig {
        settle_timeout: Duration::from_millis(args.settle_timeout_ms),
    };
    let app = build_router(subscriber, config);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .with_context(|| format!("Failed to bind port {}", args.port))?;
    info!("HTTP gateway listening on port {}", args.port);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
