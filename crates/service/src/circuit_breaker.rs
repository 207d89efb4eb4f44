//! Request-time filler eligibility policies
//!
//! Two selectable policies behind one trait. The timestamp policy reads
//! per-filler block windows maintained by the offline fade-rate updater; the
//! rate policy reads flat fade-rate rows with an on/off flag. Both fail open:
//! missing or unreadable state never blocks quoting.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use rfq_types::{
	CircuitBreakerConfiguration, ConfigStore, DisabledEndpoint, EndpointStatuses, KeyValueStore,
	WebhookConfiguration,
};

use crate::cache::TtlCache;

/// Splits candidate endpoints into eligible and blocked sets
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CircuitBreaker: Send + Sync {
	async fn classify(&self, candidates: Vec<WebhookConfiguration>) -> EndpointStatuses;
}

/// Timestamp policy: a filler is blocked while its block window is open.
/// An empty state map means the updater has never run; everyone passes.
/// Rows sit behind a short TTL cache so the hot quote path does not hit the
/// KV store on every request.
pub struct TimestampCircuitBreaker {
	kv_store: Arc<dyn KeyValueStore>,
	cache: TtlCache<Arc<HashMap<String, rfq_types::FillerTimestampRow>>>,
}

impl TimestampCircuitBreaker {
	pub fn new(kv_store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
		Self {
			kv_store,
			cache: TtlCache::new(ttl),
		}
	}
}

#[async_trait]
impl CircuitBreaker for TimestampCircuitBreaker {
	async fn classify(&self, candidates: Vec<WebhookConfiguration>) -> EndpointStatuses {
		let hashes: Vec<String> = candidates.iter().map(|w| w.hash()).collect();

		let rows = match self
			.cache
			.get_or_refresh(|| async {
				let rows = self.kv_store.batch_get_timestamp_rows(&hashes).await?;
				Ok::<_, rfq_types::StorageError>(Arc::new(rows))
			})
			.await
		{
			Ok(rows) => rows,
			Err(err) => {
				warn!(error = %err, "timestamp rows unavailable, circuit breaker open for all");
				return EndpointStatuses {
					enabled: candidates,
					disabled: Vec::new(),
				};
			},
		};

		if rows.is_empty() {
			return EndpointStatuses {
				enabled: candidates,
				disabled: Vec::new(),
			};
		}

		let now = Utc::now().timestamp();
		let mut statuses = EndpointStatuses::default();
		for webhook in candidates {
			match rows.get(&webhook.hash()) {
				Some(row) if row.is_blocked(now) => {
					debug!(
						filler = %webhook.name,
						block_until = row.block_until_timestamp,
						"filler blocked by circuit breaker"
					);
					statuses.disabled.push(DisabledEndpoint::new(
						webhook,
						Some(row.block_until_timestamp),
					));
				},
				_ => statuses.enabled.push(webhook),
			}
		}
		statuses
	}
}

/// Rate policy: a filler is blocked when its stored fade-rate row carries
/// `enabled: false`. Rows live behind a short TTL cache.
pub struct FadeRateCircuitBreaker {
	store: Arc<dyn ConfigStore>,
	cache: TtlCache<Arc<HashMap<String, CircuitBreakerConfiguration>>>,
}

impl FadeRateCircuitBreaker {
	pub fn new(store: Arc<dyn ConfigStore>, ttl: Duration) -> Self {
		Self {
			store,
			cache: TtlCache::new(ttl),
		}
	}

	async fn configs(&self) -> Arc<HashMap<String, CircuitBreakerConfiguration>> {
		let result = self
			.cache
			.get_or_refresh(|| async {
				let configs = self.store.fetch_circuit_breaker_configs().await?;
				Ok::<_, rfq_types::StorageError>(Arc::new(
					configs
						.into_iter()
						.map(|config| (config.hash.clone(), config))
						.collect::<HashMap<_, _>>(),
				))
			})
			.await;

		match result {
			Ok(configs) => configs,
			Err(err) => {
				warn!(error = %err, "fade-rate configs unavailable, circuit breaker open for all");
				Arc::new(HashMap::new())
			},
		}
	}
}

#[async_trait]
impl CircuitBreaker for FadeRateCircuitBreaker {
	async fn classify(&self, candidates: Vec<WebhookConfiguration>) -> EndpointStatuses {
		let configs = self.configs().await;

		let mut statuses = EndpointStatuses::default();
		for webhook in candidates {
			match configs.get(&webhook.hash()) {
				Some(config) if !config.enabled => {
					debug!(
						filler = %webhook.name,
						fade_rate = config.fade_rate,
						"filler disabled by fade-rate threshold"
					);
					statuses.disabled.push(DisabledEndpoint::new(webhook, None));
				},
				_ => statuses.enabled.push(webhook),
			}
		}
		statuses
	}
}
