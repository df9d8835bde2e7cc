//! DX Watch CLI - Watch a DX cluster for spots of selected stations and
//! forward them to Telegram.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use dx_watch::{
    client::{ClusterClient, ClusterEvent},
    config::Config,
    dedup::DedupGate,
    dispatch::SpotDispatcher,
    metrics,
    notifier::TelegramNotifier,
    stats::WatchStats,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// DX Watch - forward DX cluster spots of watched stations to Telegram
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "DXWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("DX Watch starting...");

    // Configuration is required; nothing runs without it.
    let config = Config::load(args.config.as_deref())?;
    info!("Callsign: {}", config.callsign);
    info!("Cluster: {}:{}", config.host, config.port);
    info!(
        "Watching {} targets, dedup window {} minutes",
        config.targets.len(),
        config.dedup_minutes
    );

    // Create shared statistics
    let stats = Arc::new(WatchStats::new());

    // Create shutdown signal
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    // Handle Ctrl+C
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received");
        let _ = shutdown_tx_clone.send(true);
    });

    // Start stats printer
    if config.stats_interval > 0 {
        let stats_clone = Arc::clone(&stats);
        let stats_interval = config.stats_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(stats_interval));
            interval.tick().await;
            loop {
                interval.tick().await;
                println!("\n{}", stats_clone.summary());
            }
        });
    }

    // Optional Prometheus endpoint
    if config.metrics_enabled {
        let stats_clone = Arc::clone(&stats);
        let metrics_port = config.metrics_port;
        tokio::spawn(async move {
            if let Err(e) = metrics::start_metrics_server(metrics_port, stats_clone).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    // Wire up the processing pipeline
    let notifier = TelegramNotifier::new(config.telegram_token.clone())?;
    let mut dispatcher = SpotDispatcher::new(
        config.targets.clone(),
        config.chat_ids.clone().into_vec(),
        DedupGate::new(config.dedup_minutes),
        notifier,
        Arc::clone(&stats),
    );

    // Sweep stale dedup entries once per window.
    let sweep_period = Duration::from_secs(config.dedup_minutes.max(1) * 60);
    let mut sweep = tokio::time::interval(sweep_period);
    sweep.tick().await;

    // Connect and start streaming
    let client = ClusterClient::new(config.client_config());
    let mut events = client.connect().await;

    // Main event loop
    loop {
        tokio::select! {
            // Check for shutdown
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }

            _ = sweep.tick() => {
                dispatcher.sweep_dedup(Utc::now());
            }

            // Process cluster events
            event = events.recv() => {
                match event {
                    Some(ClusterEvent::Line(line)) => {
                        dispatcher.handle_line(&line, Utc::now()).await;
                    }
                    Some(ClusterEvent::Connected) => {
                        info!("Logged in to DX cluster");
                    }
                    Some(ClusterEvent::Disconnected(reason)) => {
                        warn!("Disconnected: {}", reason);
                        stats.record_reconnect();
                    }
                    Some(ClusterEvent::Error(e)) => {
                        error!("Cluster error: {}", e);
                    }
                    None => {
                        // Channel closed
                        break;
                    }
                }
            }
        }
    }

    // Print final statistics
    println!("\n\nFINAL STATISTICS");
    println!("{}", stats.summary());

    Ok(())
}
