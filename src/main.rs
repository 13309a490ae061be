// src/main.rs

//! The main entry point for the relaygate admission-control sidecar.

use anyhow::Result;
use relaygate::config::{self, Config};
use relaygate::core::acl::AclAggregator;
use relaygate::core::config_fetcher::ConfigFetcher;
use relaygate::core::metrics::MetricsSink;
use relaygate::core::pipeline;
use relaygate::core::state::AppState;
use std::env;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};
use tracing_subscriber::{filter::EnvFilter, prelude::*, reload};

#[tokio::main]
async fn main() -> Result<()> {
    run_app().await
}

async fn run_app() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) {
        println!("relaygate version {VERSION}");
        return Ok(());
    }

    let config = Config::load(config::config_path_from_args(&args).as_deref());

    // Setup logging with reloading capabilities, mirroring the server's
    // own pattern of letting RUST_LOG override the configured level.
    let initial_log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    let (filter, reload_handle) = reload::Layer::new(EnvFilter::new(initial_log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true),
        )
        .init();

    // Kept available for future runtime level changes; no admin surface
    // exposes it yet.
    let _reload_handle = Arc::new(reload_handle);

    info!(url = %config.relay_config_url, "relaygate starting");

    let metrics = config::load_metrics_config(config::default_metrics_env_path())
        .map(|cfg| MetricsSink::new(cfg, reqwest::Client::new()));
    if metrics.is_some() {
        info!("metrics sink enabled");
    }

    let state = AppState::new(config, metrics);

    let (shutdown_tx, _) = broadcast::channel(1);
    let (sources_tx, sources_rx) = mpsc::channel(1);

    let fetcher = ConfigFetcher::new(state.clone(), sources_tx);
    let fetcher_task = tokio::spawn(fetcher.run(shutdown_tx.subscribe()));

    let aggregator = AclAggregator::new(state.pubkeys.clone(), state.http.clone());
    let aggregator_task = tokio::spawn(aggregator.run(sources_rx, shutdown_tx.subscribe()));

    let result = pipeline::run(state).await;

    let _ = shutdown_tx.send(());
    let _ = fetcher_task.await;
    let _ = aggregator_task.await;

    if let Err(e) = result {
        error!("Decision loop runtime error: {}", e);
        return Err(e);
    }

    Ok(())
}
