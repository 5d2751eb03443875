//! Recommender: wires the estimator and the registry to the decision
//! function.
//!
//! Both the on-demand recommendation endpoint and the periodic loop go
//! through [`Recommender::recommend`], so there is exactly one copy of
//! the decision logic in the system.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use fleetgrid_registry::{RegistryResult, WorkerRegistry};
use fleetgrid_throughput::ThroughputEstimator;

use crate::decision::{ScalingConfig, ScalingRecommendation, evaluate};

/// Produces scaling recommendations from live throughput and fleet size.
#[derive(Clone)]
pub struct Recommender {
    estimator: ThroughputEstimator,
    registry: WorkerRegistry,
    config: ScalingConfig,
}

impl Recommender {
    /// Create a recommender over the given estimator and registry.
    pub fn new(
        estimator: ThroughputEstimator,
        registry: WorkerRegistry,
        config: ScalingConfig,
    ) -> Self {
        Self {
            estimator,
            registry,
            config,
        }
    }

    /// Compute a fresh recommendation from the current rate and the
    /// current fleet.
    pub fn recommend(&self) -> RegistryResult<ScalingRecommendation> {
        let current_throughput = self.estimator.current_rate();
        let workers = self.registry.list_all()?;
        Ok(evaluate(
            current_throughput,
            workers.len() as u32,
            &self.config,
        ))
    }

    /// Run the periodic evaluation loop until shutdown.
    ///
    /// Each tick logs the recommendation; actuation is left to the
    /// external reporting layer.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = interval.as_secs(),
            "scaling evaluation loop started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    match self.recommend() {
                        Ok(rec) => info!(
                            action = ?rec.action,
                            active = rec.active_workers,
                            recommended = rec.recommended_workers,
                            throughput = rec.current_throughput,
                            reason = %rec.reason,
                            "scaling evaluation"
                        ),
                        Err(e) => warn!(error = %e, "scaling evaluation failed"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("scaling evaluation loop shutting down");
                    break;
                }
            }
        }
    }
}
