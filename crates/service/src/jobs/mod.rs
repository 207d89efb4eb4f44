//! Background job scheduling

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

use rfq_config::CircuitBreakerPolicy;
use rfq_types::StorageError;

use crate::fade_rate::FadeRateUpdater;

#[derive(Error, Debug)]
pub enum JobError {
	#[error("Job storage error: {0}")]
	Storage(#[from] StorageError),

	#[error("Job failed: {0}")]
	Failed(String),
}

/// A named unit of recurring work
#[async_trait]
pub trait BackgroundJob: Send + Sync {
	fn name(&self) -> &str;
	async fn run(&self) -> Result<(), JobError>;
}

/// Runs jobs on a fixed interval, one execution at a time. A run that
/// overshoots its interval delays the next tick instead of piling up, and a
/// failed run is logged and retried on the next tick.
pub struct IntervalScheduler;

impl IntervalScheduler {
	pub fn spawn(job: Arc<dyn BackgroundJob>, interval: Duration) -> JoinHandle<()> {
		tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				ticker.tick().await;
				debug!(job = job.name(), "running background job");
				if let Err(err) = job.run().await {
					error!(job = job.name(), error = %err, "background job failed");
				}
			}
		})
	}
}

/// Recurring fade-rate pass, running whichever policy the deployment uses
pub struct FadeRateJob {
	updater: Arc<FadeRateUpdater>,
	policy: CircuitBreakerPolicy,
}

impl FadeRateJob {
	pub fn new(updater: Arc<FadeRateUpdater>, policy: CircuitBreakerPolicy) -> Self {
		Self { updater, policy }
	}
}

#[async_trait]
impl BackgroundJob for FadeRateJob {
	fn name(&self) -> &str {
		"fade-rate-update"
	}

	async fn run(&self) -> Result<(), JobError> {
		match self.policy {
			CircuitBreakerPolicy::Timestamp => self.updater.run_timestamp_update().await?,
			CircuitBreakerPolicy::FadeRate => self.updater.run_rate_update().await?,
		}
		Ok(())
	}
}
