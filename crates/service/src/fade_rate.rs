//! Offline fade-rate analysis and circuit-breaker state writes
//!
//! The updater is the only writer of blocking state; the request path only
//! reads it. It pulls historical order outcomes from the analytics warehouse,
//! counts fades per filler, and maintains either exponential block windows
//! (timestamp policy) or flat fade-rate rows (rate policy).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{keccak256, Address};
use chrono::Utc;
use tracing::{debug, info, warn};

use rfq_config::CircuitBreakerSettings;
use rfq_types::{
	CircuitBreakerConfiguration, ConfigStore, FillerTimestampRow, KeyValueStore, OrderOutcomeRow,
	QueryStatus, StorageError, StorageResult, Warehouse,
};

/// Rolling window the rate policy scores fillers over
const RATE_WINDOW_SECS: i64 = 86_400;

/// End of the block window starting at `now`.
///
/// The window grows by 1.5x per fade observed in this batch and doubles for
/// every consecutive blocking period already served, so repeat offenders sit
/// out exponentially longer. `consecutive_blocks` is the already-incremented
/// count including the block being issued.
pub fn calculate_block_until_timestamp(
	now: i64,
	consecutive_blocks: u32,
	fades: u32,
	base_block_secs: u64,
) -> i64 {
	let scaled = base_block_secs as f64
		* 1.5f64.powi(fades.saturating_sub(1) as i32)
		* 2f64.powi(consecutive_blocks as i32);
	now + scaled.floor() as i64
}

pub struct FadeRateUpdater {
	warehouse: Arc<dyn Warehouse>,
	kv_store: Arc<dyn KeyValueStore>,
	config_store: Arc<dyn ConfigStore>,
	settings: CircuitBreakerSettings,
	poll_interval: Duration,
	max_polls: u32,
}

impl FadeRateUpdater {
	pub fn new(
		warehouse: Arc<dyn Warehouse>,
		kv_store: Arc<dyn KeyValueStore>,
		config_store: Arc<dyn ConfigStore>,
		settings: CircuitBreakerSettings,
	) -> Self {
		Self {
			warehouse,
			kv_store,
			config_store,
			settings,
			poll_interval: Duration::from_secs(2),
			max_polls: 60,
		}
	}

	pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
		self.poll_interval = poll_interval;
		self
	}

	/// Timestamp policy pass: advance per-filler block windows from new
	/// warehouse rows. Fillers currently serving a block are left untouched
	/// so one batch cannot double-punish.
	pub async fn run_timestamp_update(&self) -> StorageResult<()> {
		let directory = self.kv_store.filler_directory().await?;
		if directory.is_empty() {
			debug!("filler directory empty, nothing to update");
			return Ok(());
		}

		let hashes: Vec<String> = directory.values().map(|name| filler_hash(name)).collect();
		let mut state = self.kv_store.batch_get_timestamp_rows(&hashes).await?;

		let since = state
			.values()
			.map(|row| row.last_post_timestamp)
			.min()
			.unwrap_or(0);
		let outcomes = self.fetch_outcomes(since).await?;
		let by_filler = group_by_filler(&outcomes, &directory);

		let now = Utc::now().timestamp();
		let mut updated = Vec::new();

		for (name, rows) in by_filler {
			let hash = filler_hash(&name);
			let mut row = state
				.remove(&hash)
				.unwrap_or_else(|| FillerTimestampRow::new(hash));

			if row.is_blocked(now) {
				debug!(filler = %name, "already blocked, skipping this batch");
				continue;
			}

			// A batch with nothing newer than last_post is a zero-fade period
			// and still resets the streak below.
			let fresh: Vec<&OrderOutcomeRow> = rows
				.iter()
				.filter(|r| r.post_timestamp > row.last_post_timestamp)
				.copied()
				.collect();

			let fades = fresh.iter().filter(|r| r.faded()).count() as u32;
			if fades > 0 {
				row.consecutive_blocks += 1;
				row.block_until_timestamp = calculate_block_until_timestamp(
					now,
					row.consecutive_blocks,
					fades,
					self.settings.base_block_secs,
				);
				info!(
					filler = %name,
					fades,
					consecutive_blocks = row.consecutive_blocks,
					block_until = row.block_until_timestamp,
					"blocking filler for fading"
				);
			} else {
				row.consecutive_blocks = 0;
				row.block_until_timestamp = now;
			}

			if let Some(newest) = fresh.iter().map(|r| r.post_timestamp).max() {
				row.last_post_timestamp = newest;
			}
			updated.push(row);
		}

		if !updated.is_empty() {
			self.kv_store.batch_put_timestamp_rows(updated).await?;
		}
		Ok(())
	}

	/// Rate policy pass: score each filler over the rolling window and flip
	/// its enabled flag against the configured threshold.
	pub async fn run_rate_update(&self) -> StorageResult<()> {
		let directory = self.kv_store.filler_directory().await?;
		if directory.is_empty() {
			debug!("filler directory empty, nothing to update");
			return Ok(());
		}

		let since = Utc::now().timestamp() - RATE_WINDOW_SECS;
		let outcomes = self.fetch_outcomes(since).await?;
		let by_filler = group_by_filler(&outcomes, &directory);

		let mut configs = Vec::new();
		for (name, rows) in by_filler {
			if rows.is_empty() {
				continue;
			}
			let fades = rows.iter().filter(|r| r.faded()).count();
			let fade_rate = fades as f64 / rows.len() as f64;
			let enabled = fade_rate <= self.settings.fade_rate_threshold;
			if !enabled {
				warn!(filler = %name, fade_rate, "filler over fade-rate threshold");
			}
			configs.push(CircuitBreakerConfiguration {
				hash: filler_hash(&name),
				fade_rate,
				enabled,
			});
		}

		if !configs.is_empty() {
			self.config_store.put_circuit_breaker_configs(configs).await?;
		}
		Ok(())
	}

	async fn fetch_outcomes(&self, since: i64) -> StorageResult<Vec<OrderOutcomeRow>> {
		let execution_id = self.warehouse.submit_query(since).await?;

		for _ in 0..self.max_polls {
			match self.warehouse.query_status(&execution_id).await? {
				QueryStatus::Finished => {
					return self.warehouse.fetch_rows(&execution_id).await;
				},
				status if status.is_terminal() => {
					return Err(StorageError::Backend(format!(
						"warehouse query {execution_id} ended as {status:?}"
					)));
				},
				_ => tokio::time::sleep(self.poll_interval).await,
			}
		}
		Err(StorageError::Backend(format!(
			"warehouse query {execution_id} did not finish in time"
		)))
	}
}

/// Stable filler hash keying circuit-breaker state, name-derived like
/// `WebhookConfiguration::hash`
fn filler_hash(name: &str) -> String {
	keccak256(name.as_bytes()).to_string()
}

fn group_by_filler<'a>(
	outcomes: &'a [OrderOutcomeRow],
	directory: &HashMap<Address, String>,
) -> HashMap<String, Vec<&'a OrderOutcomeRow>> {
	let mut grouped: HashMap<String, Vec<&OrderOutcomeRow>> = HashMap::new();
	for row in outcomes {
		match directory.get(&row.filler) {
			Some(name) => grouped.entry(name.clone()).or_default().push(row),
			None => debug!(filler = %row.filler, "outcome row for unknown filler"),
		}
	}
	grouped
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::address;
	use rfq_storage::{MemoryConfigStore, MemoryKvStore, MemoryWarehouse};

	const FILLER: Address = address!("742d35Cc6675C88b1C6e3c0c61b2e9a3D0C3F123");

	#[test]
	fn block_window_math() {
		// first offense, one fade: base window
		assert_eq!(calculate_block_until_timestamp(1_000, 1, 1, 1200), 1_000 + 2_400);
		// second consecutive block with one fade doubles again
		assert_eq!(calculate_block_until_timestamp(1_000, 2, 1, 1200), 1_000 + 4_800);
		// extra fades scale by 1.5x each
		assert_eq!(calculate_block_until_timestamp(1_000, 1, 2, 1200), 1_000 + 3_600);
	}

	fn outcome(post: i64, faded: bool) -> OrderOutcomeRow {
		OrderOutcomeRow {
			filler: FILLER,
			post_timestamp: post,
			decay_start_time: if faded { post + 100 } else { post + 10 },
			fill_timestamp: post + 20,
		}
	}

	fn updater(
		warehouse: MemoryWarehouse,
		kv: Arc<MemoryKvStore>,
		config: Arc<MemoryConfigStore>,
	) -> FadeRateUpdater {
		FadeRateUpdater::new(
			Arc::new(warehouse),
			kv,
			config,
			CircuitBreakerSettings::default(),
		)
		.with_poll_interval(Duration::from_millis(1))
	}

	#[tokio::test]
	async fn fade_opens_a_block_window() {
		let kv = Arc::new(MemoryKvStore::new());
		kv.register_filler(FILLER, "filler-a");
		let warehouse = MemoryWarehouse::new(vec![outcome(100, true), outcome(110, false)]);

		updater(warehouse, kv.clone(), Arc::new(MemoryConfigStore::new()))
			.run_timestamp_update()
			.await
			.unwrap();

		let row = kv
			.get_timestamp_row(&filler_hash("filler-a"))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(row.consecutive_blocks, 1);
		assert!(row.block_until_timestamp > Utc::now().timestamp());
		assert_eq!(row.last_post_timestamp, 110);
	}

	#[tokio::test]
	async fn clean_batch_resets_consecutive_blocks() {
		let kv = Arc::new(MemoryKvStore::new());
		kv.register_filler(FILLER, "filler-a");
		let mut row = FillerTimestampRow::new(filler_hash("filler-a"));
		row.consecutive_blocks = 3;
		row.last_post_timestamp = 50;
		// expired block window
		row.block_until_timestamp = 60;
		kv.insert_row(row);

		let warehouse = MemoryWarehouse::new(vec![outcome(100, false)]);
		updater(warehouse, kv.clone(), Arc::new(MemoryConfigStore::new()))
			.run_timestamp_update()
			.await
			.unwrap();

		let row = kv
			.get_timestamp_row(&filler_hash("filler-a"))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(row.consecutive_blocks, 0);
		assert_eq!(row.last_post_timestamp, 100);
		// window pinned to the pass, not left at the stale value
		assert!(row.block_until_timestamp >= Utc::now().timestamp() - 5);
		assert!(row.block_until_timestamp <= Utc::now().timestamp());
	}

	#[tokio::test]
	async fn quiet_period_resets_consecutive_blocks() {
		let other: Address = address!("1111111111111111111111111111111111111111");
		let kv = Arc::new(MemoryKvStore::new());
		kv.register_filler(FILLER, "filler-a");
		kv.register_filler(other, "filler-b");

		// filler-a has already accounted for everything it posted; its fades
		// at post=100 are old news. filler-b's lagging last_post pulls the
		// query window back far enough to resurface them.
		let mut row = FillerTimestampRow::new(filler_hash("filler-a"));
		row.consecutive_blocks = 3;
		row.last_post_timestamp = 150;
		row.block_until_timestamp = 60;
		kv.insert_row(row);
		kv.insert_row(FillerTimestampRow::new(filler_hash("filler-b")));

		let warehouse = MemoryWarehouse::new(vec![outcome(100, true)]);
		updater(warehouse, kv.clone(), Arc::new(MemoryConfigStore::new()))
			.run_timestamp_update()
			.await
			.unwrap();

		let row = kv
			.get_timestamp_row(&filler_hash("filler-a"))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(row.consecutive_blocks, 0);
		assert_eq!(row.last_post_timestamp, 150);
		assert!(row.block_until_timestamp >= Utc::now().timestamp() - 5);
	}

	#[tokio::test]
	async fn actively_blocked_filler_is_skipped() {
		let kv = Arc::new(MemoryKvStore::new());
		kv.register_filler(FILLER, "filler-a");
		let mut row = FillerTimestampRow::new(filler_hash("filler-a"));
		row.consecutive_blocks = 1;
		row.block_until_timestamp = Utc::now().timestamp() + 600;
		kv.insert_row(row.clone());

		let warehouse = MemoryWarehouse::new(vec![outcome(100, true)]);
		updater(warehouse, kv.clone(), Arc::new(MemoryConfigStore::new()))
			.run_timestamp_update()
			.await
			.unwrap();

		let after = kv
			.get_timestamp_row(&filler_hash("filler-a"))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(after, row);
	}

	#[tokio::test]
	async fn rate_update_flags_heavy_faders() {
		let kv = Arc::new(MemoryKvStore::new());
		kv.register_filler(FILLER, "filler-a");
		let config = Arc::new(MemoryConfigStore::new());

		let now = Utc::now().timestamp();
		let warehouse = MemoryWarehouse::new(vec![
			outcome(now - 100, true),
			outcome(now - 90, true),
			outcome(now - 80, false),
			outcome(now - 70, false),
		]);

		updater(warehouse, kv, config.clone())
			.run_rate_update()
			.await
			.unwrap();

		let configs = config.fetch_circuit_breaker_configs().await.unwrap();
		assert_eq!(configs.len(), 1);
		assert_eq!(configs[0].fade_rate, 0.5);
		assert!(!configs[0].enabled);
	}

	#[tokio::test]
	async fn failed_warehouse_query_surfaces_as_error() {
		let kv = Arc::new(MemoryKvStore::new());
		kv.register_filler(FILLER, "filler-a");
		let warehouse = MemoryWarehouse::new(vec![]).with_failing_queries();

		let result = updater(warehouse, kv, Arc::new(MemoryConfigStore::new()))
			.run_timestamp_update()
			.await;
		assert!(matches!(result, Err(StorageError::Backend(_))));
	}
}
