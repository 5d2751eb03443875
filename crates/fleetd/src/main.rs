//! fleetd: the fleetgrid daemon.
//!
//! Single binary that assembles the subsystems:
//! - Embedded store (redb)
//! - Throughput estimator
//! - Worker registry
//! - Scaling recommender + periodic evaluation loop
//! - REST API
//!
//! # Usage
//!
//! ```text
//! fleetd --port 8080 --data-dir /var/lib/fleetgrid
//! ```
//!
//! Scaling bounds can also come from the environment:
//! `FLEETD_MIN_WORKERS`, `FLEETD_MAX_WORKERS`,
//! `FLEETD_PER_WORKER_CAPACITY`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::info;

use fleetgrid_autoscale::ScalingConfig;

#[derive(Parser)]
#[command(name = "fleetd", about = "fleetgrid daemon")]
struct Cli {
    /// Port to listen on.
    #[arg(long, env = "FLEETD_PORT", default_value = "8080")]
    port: u16,

    /// Data directory for the embedded store.
    #[arg(long, env = "FLEETD_DATA_DIR", default_value = "/var/lib/fleetgrid")]
    data_dir: PathBuf,

    /// Scaling evaluation interval in seconds.
    #[arg(long, env = "FLEETD_EVAL_INTERVAL", default_value = "30")]
    eval_interval: u64,

    /// Minimum worker count.
    #[arg(long, env = "FLEETD_MIN_WORKERS", default_value = "1")]
    min_workers: u32,

    /// Maximum worker count.
    #[arg(long, env = "FLEETD_MAX_WORKERS", default_value = "10")]
    max_workers: u32,

    /// Assumed sustainable events/sec per worker.
    #[arg(long, env = "FLEETD_PER_WORKER_CAPACITY", default_value = "1500")]
    per_worker_capacity: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fleetd=debug,fleetgrid=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    info!("fleetgrid daemon starting");

    // Ensure data directory exists.
    std::fs::create_dir_all(&cli.data_dir)?;
    let db_path = cli.data_dir.join("fleetgrid.redb");

    // ── Initialize subsystems ──────────────────────────────────

    let store: Arc<dyn fleetgrid_store::SharedStore> =
        Arc::new(fleetgrid_store::EmbeddedStore::open(&db_path)?);
    info!(path = ?db_path, "embedded store opened");

    let estimator = fleetgrid_throughput::ThroughputEstimator::new(store.clone());
    info!("throughput estimator initialized");

    let registry = fleetgrid_registry::WorkerRegistry::new(store);
    info!("worker registry initialized");

    let config = ScalingConfig {
        min_workers: cli.min_workers,
        max_workers: cli.max_workers,
        per_worker_capacity: cli.per_worker_capacity,
    };
    let recommender =
        fleetgrid_autoscale::Recommender::new(estimator.clone(), registry.clone(), config);
    info!(
        min_workers = cli.min_workers,
        max_workers = cli.max_workers,
        per_worker_capacity = cli.per_worker_capacity,
        "scaling recommender initialized"
    );

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start background tasks ─────────────────────────────────

    // Periodic scaling evaluation loop.
    let loop_recommender = recommender.clone();
    let eval_interval = Duration::from_secs(cli.eval_interval);
    let eval_handle = tokio::spawn(async move {
        loop_recommender.run(eval_interval, shutdown_rx).await;
    });

    // ── Start API server ───────────────────────────────────────

    let router = fleetgrid_api::build_router(fleetgrid_api::ApiState {
        estimator,
        registry,
        recommender,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    // Wait for background tasks.
    let _ = eval_handle.await;

    info!("fleetgrid daemon stopped");
    Ok(())
}
