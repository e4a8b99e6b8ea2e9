//! Range Market Pricer — Entry Point
//!
//! Initializes configuration, logging and the state source, then runs
//! the portfolio monitor until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate (STATE_RPC_URL overrides rpc_url)
//! 2. Init tracing (JSON structured logging)
//! 3. Create the state source (ledger RPC or snapshot file)
//! 4. Create QuoteService (solver + quote settings)
//! 5. Open the JSONL trade log
//! 6. Spawn health/metrics server (/live, /ready, /metrics)
//! 7. Spawn PortfolioMonitor loop
//! 8. Wait for SIGINT → graceful shutdown

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use range_market_pricer::adapters::metrics::{HealthServer, HealthState, QuoteMetrics};
use range_market_pricer::adapters::persistence::TradeLog;
use range_market_pricer::adapters::rpc::{LedgerStateSource, RpcClient, RpcClientConfig};
use range_market_pricer::adapters::snapshot::SnapshotStateSource;
use range_market_pricer::config::{self, AppConfig, StateSourceKind};
use range_market_pricer::domain::solver::QuoteSolver;
use range_market_pricer::ports::state_source::StateSource;
use range_market_pricer::usecases::{PortfolioMonitor, QuoteService};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config =
        config::loader::load_config(&config_path).context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.service.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        source = ?config.state_source.kind,
        positions = config.positions.len(),
        "Starting range market pricer"
    );

    // ── 3. Create the state source and run ──────────────────
    match config.state_source.kind {
        StateSourceKind::Rpc => {
            let source = &config.state_source;
            let client = RpcClient::new(RpcClientConfig {
                url: source.rpc_url.clone(),
                timeout: Duration::from_millis(source.timeout_ms),
                max_concurrent: source.max_concurrent,
                max_retries: source.max_retries,
                retry_base_delay: Duration::from_millis(source.retry_base_delay_ms),
            })
            .context("Failed to create RPC client")?;
            info!(url = %client.url(), "Using ledger RPC state source");
            run(config.clone(), LedgerStateSource::new(Arc::new(client))).await
        }
        StateSourceKind::Snapshot => {
            let source = SnapshotStateSource::new(&config.state_source.snapshot_path);
            info!(path = %source.path().display(), "Using snapshot state source");
            run(config, source).await
        }
    }
}

/// Wire the quote service, metrics and monitor around `source`.
async fn run<S: StateSource>(config: AppConfig, source: S) -> Result<()> {
    let shutdown = CancellationToken::new();
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 4. Metrics + quote service ───────────────────────────
    let metrics = Arc::new(QuoteMetrics::new().context("Failed to register metrics")?);
    let quotes = Arc::new(
        QuoteService::new(
            Arc::new(source),
            QuoteSolver::new(config.solver.clone()),
            &config.quotes,
        )
        .with_metrics(Arc::clone(&metrics)),
    );

    // ── 5. Trade log ─────────────────────────────────────────
    let history = Arc::new(
        TradeLog::new(&config.persistence.data_dir)
            .await
            .context("Failed to open trade log")?,
    );

    // ── 6. Health/metrics server ─────────────────────────────
    let health = Arc::new(HealthState::new());

    let health_handle = if config.metrics.enabled {
        let server = HealthServer::new(
            Arc::clone(&health),
            Arc::clone(&metrics),
            config.metrics.bind_address.clone(),
        );
        let rx = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = server.run(rx).await {
                error!(error = %e, "Health server failed");
            }
        }))
    } else {
        None
    };

    // ── 7. Portfolio monitor ─────────────────────────────────
    let monitor = PortfolioMonitor::new(
        quotes,
        history,
        config.positions.clone(),
        metrics,
        Arc::clone(&health),
        Duration::from_secs(config.monitor.interval_seconds),
    );
    let monitor_shutdown = shutdown.clone();
    let monitor_handle = tokio::spawn(async move {
        if let Err(e) = monitor.run(monitor_shutdown).await {
            error!(error = %e, "Portfolio monitor failed");
        }
    });

    info!("All tasks spawned, pricer is running");

    // ── 8. Wait for SIGINT ───────────────────────────────────
    signal::ctrl_c()
        .await
        .context("Failed to listen for SIGINT")?;
    info!("SIGINT received, initiating graceful shutdown");

    // /ready → 503 while draining
    health.accepting.store(false, Ordering::Relaxed);
    shutdown.cancel();
    let _ = shutdown_tx.send(());

    let _ = tokio::time::timeout(Duration::from_secs(10), monitor_handle).await;
    if let Some(handle) = health_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}
