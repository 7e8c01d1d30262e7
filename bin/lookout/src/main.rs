//! Lookout - Ethereum address watcher.
//!
//! # Usage
//!
//! ```bash
//! # Watch one address against the default public node
//! lookout --address 0xe7d36d7f5832349f7a9f04c898a1e47992f02bd5
//!
//! # Start with environment overrides
//! ETH_RPC_URL=http://localhost:8545 lookout --address 0xabc... --address 0xdef...
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, info_span, warn, Instrument};
use tracing_subscriber::{fmt, EnvFilter};

use lookout_core::error::WatcherError;
use lookout_core::metrics::init_metrics;
use lookout_core::services::WatcherService;
use lookout_rpc::{EthereumRpcClient, RpcClientConfig, DEFAULT_RPC_URL};
use lookout_storage::MemStores;

type Watcher = WatcherService<EthereumRpcClient, MemStores>;

/// Lookout CLI - Ethereum address watcher.
#[derive(Parser, Debug)]
#[command(name = "lookout")]
#[command(about = "Lookout - watches a chain for transactions touching subscribed addresses")]
#[command(version)]
struct Cli {
    /// Ethereum node JSON-RPC URL.
    #[arg(long, env = "ETH_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Address to subscribe at startup (repeatable).
    #[arg(long = "address", value_name = "ADDRESS")]
    addresses: Vec<String>,

    /// Seconds between ingestion passes.
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "5")]
    poll_interval_secs: u64,

    /// Seconds between transaction drains.
    #[arg(long, env = "DRAIN_INTERVAL_SECS", default_value = "5")]
    drain_interval_secs: u64,

    /// Seconds between current-height log lines.
    #[arg(long, env = "HEIGHT_LOG_INTERVAL_SECS", default_value = "10")]
    height_log_interval_secs: u64,

    /// Per-request timeout towards the node, in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    request_timeout_secs: u64,

    /// Prometheus metrics port.
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    // Prometheus metrics exporter (optional - failures don't crash the app)
    let metrics_enabled = match format!("0.0.0.0:{}", cli.metrics_port).parse::<std::net::SocketAddr>()
    {
        Ok(metrics_addr) => match PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()
        {
            Ok(()) => {
                init_metrics();
                true
            }
            Err(e) => {
                warn!("⚠️  Failed to start metrics exporter: {}. Continuing without metrics.", e);
                false
            }
        },
        Err(e) => {
            warn!("⚠️  Invalid metrics address: {}. Continuing without metrics.", e);
            false
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 🚀 STARTUP
    // ─────────────────────────────────────────────────────────────────────────
    info!("🚀 Starting Lookout");
    debug!(rpc_url = %cli.rpc_url, "Chain endpoint");

    let gateway = EthereumRpcClient::new(RpcClientConfig {
        url: cli.rpc_url.clone(),
        request_timeout: Duration::from_secs(cli.request_timeout_secs),
    })
    .context("Failed to build RPC client")?;

    let stores = Arc::new(MemStores::new());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let watcher: Arc<Watcher> = Arc::new(WatcherService::new(
        Arc::new(gateway),
        stores,
        shutdown_rx.clone(),
    ));

    if cli.addresses.is_empty() {
        warn!("⚠️  No --address given; ingestion will record nothing");
    }
    for address in &cli.addresses {
        watcher.subscribe(address).await?;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // ⚡ SERVICES START
    // ─────────────────────────────────────────────────────────────────────────
    let ingest_handle = tokio::spawn(
        ingest_loop(
            watcher.clone(),
            shutdown_rx.clone(),
            Duration::from_secs(cli.poll_interval_secs),
        )
        .instrument(info_span!("ingestor")),
    );

    let drain_handle = tokio::spawn(
        drain_loop(
            watcher.clone(),
            shutdown_rx.clone(),
            cli.addresses.clone(),
            Duration::from_secs(cli.drain_interval_secs),
        )
        .instrument(info_span!("drainer")),
    );

    let height_handle = tokio::spawn(
        height_loop(
            watcher.clone(),
            shutdown_rx,
            Duration::from_secs(cli.height_log_interval_secs),
        )
        .instrument(info_span!("height")),
    );

    // ─────────────────────────────────────────────────────────────────────────
    // ✅ READY
    // ─────────────────────────────────────────────────────────────────────────
    info!("✅ Lookout ready");
    info!("   👀 Watching {} address(es)", cli.addresses.len());
    if metrics_enabled {
        info!("   📊 Metrics:  http://localhost:{}/metrics", cli.metrics_port);
    } else {
        info!("   📊 Metrics:  disabled");
    }
    info!("   Press Ctrl+C to stop");

    shutdown_signal().await;

    // ─────────────────────────────────────────────────────────────────────────
    // 🛑 SHUTDOWN
    // ─────────────────────────────────────────────────────────────────────────
    info!("🛑 Shutting down...");
    let _ = shutdown_tx.send(true);

    for (name, handle) in [
        ("ingestor", ingest_handle),
        ("drainer", drain_handle),
        ("height", height_handle),
    ] {
        match tokio::time::timeout(Duration::from_secs(30), handle).await {
            Ok(_) => debug!("{name} stopped"),
            Err(_) => warn!("⚠️  {name} shutdown timed out"),
        }
    }

    info!("🛑 Shutdown complete");
    Ok(())
}

/// Run ingestion passes on a fixed interval until shutdown.
///
/// One timer means one pass in flight at a time; the service's own pass
/// lock backs that up.
async fn ingest_loop(watcher: Arc<Watcher>, mut shutdown_rx: watch::Receiver<bool>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match watcher.run_pass().await {
                    Ok(summary) => {
                        debug!(from = summary.from, to = summary.to, recorded = summary.recorded, "Pass complete");
                    }
                    Err(WatcherError::ShutdownRequested) => return,
                    Err(e) => error!(error = ?e, "❌ Ingestion pass failed"),
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    return;
                }
            }
        }
    }
}

/// Periodically drain and log newly observed transactions per address.
async fn drain_loop(
    watcher: Arc<Watcher>,
    mut shutdown_rx: watch::Receiver<bool>,
    addresses: Vec<String>,
    every: Duration,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for address in &addresses {
                    match watcher.drain_transactions(address).await {
                        Ok(transactions) => {
                            for tx in transactions {
                                info!(
                                    address,
                                    hash = %tx.hash,
                                    from = %tx.from,
                                    to = tx.to.as_deref().unwrap_or("(contract creation)"),
                                    value = %tx.value,
                                    "💸 New transaction"
                                );
                            }
                        }
                        Err(e) => error!(address, error = ?e, "❌ Drain failed"),
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    return;
                }
            }
        }
    }
}

/// Periodically log the ingestion cursor height.
async fn height_loop(watcher: Arc<Watcher>, mut shutdown_rx: watch::Receiver<bool>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match watcher.current_height().await {
                    Ok(height) => info!(height, "⛓️  Current block"),
                    Err(e) => error!(error = ?e, "❌ Height query failed"),
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    return;
                }
            }
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
