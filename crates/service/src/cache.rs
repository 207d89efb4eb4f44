//! TTL cache with stale-while-revalidate semantics

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::warn;

struct Entry<T> {
	value: T,
	fetched_at: Instant,
}

/// Single-value async cache. A fresh value is served without touching the
/// source; an expired value triggers a refresh, and a failed refresh falls
/// back to the stale value instead of erroring when one exists.
pub struct TtlCache<T> {
	ttl: Duration,
	entry: RwLock<Option<Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
	pub fn new(ttl: Duration) -> Self {
		Self {
			ttl,
			entry: RwLock::new(None),
		}
	}

	pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> Result<T, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<T, E>>,
		E: std::fmt::Display,
	{
		if let Some(entry) = self.entry.read().await.as_ref() {
			if entry.fetched_at.elapsed() < self.ttl {
				return Ok(entry.value.clone());
			}
		}

		match refresh().await {
			Ok(value) => {
				*self.entry.write().await = Some(Entry {
					value: value.clone(),
					fetched_at: Instant::now(),
				});
				Ok(value)
			},
			Err(err) => {
				let guard = self.entry.read().await;
				match guard.as_ref() {
					Some(entry) => {
						warn!(error = %err, "cache refresh failed, serving stale value");
						Ok(entry.value.clone())
					},
					None => Err(err),
				}
			},
		}
	}

	pub async fn invalidate(&self) {
		*self.entry.write().await = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};

	#[tokio::test]
	async fn fresh_value_skips_refresh() {
		let cache = TtlCache::new(Duration::from_secs(60));
		let calls = AtomicU32::new(0);

		for _ in 0..3 {
			let value: Result<u32, String> = cache
				.get_or_refresh(|| async {
					calls.fetch_add(1, Ordering::SeqCst);
					Ok(7)
				})
				.await;
			assert_eq!(value.unwrap(), 7);
		}

		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn failed_refresh_serves_stale() {
		let cache = TtlCache::new(Duration::from_millis(10));

		let first: Result<u32, String> = cache.get_or_refresh(|| async { Ok(7) }).await;
		assert_eq!(first.unwrap(), 7);

		tokio::time::sleep(Duration::from_millis(20)).await;

		let second: Result<u32, String> = cache
			.get_or_refresh(|| async { Err("source down".to_string()) })
			.await;
		assert_eq!(second.unwrap(), 7);
	}

	#[tokio::test]
	async fn failed_refresh_without_stale_errors() {
		let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
		let result: Result<u32, String> = cache
			.get_or_refresh(|| async { Err("source down".to_string()) })
			.await;
		assert!(result.is_err());
	}

	#[tokio::test]
	async fn invalidate_forces_refresh() {
		let cache = TtlCache::new(Duration::from_secs(60));
		let calls = AtomicU32::new(0);

		let fetch = || async {
			calls.fetch_add(1, Ordering::SeqCst);
			Ok::<u32, String>(7)
		};

		cache.get_or_refresh(fetch).await.unwrap();
		cache.invalidate().await;
		cache.get_or_refresh(fetch).await.unwrap();

		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}
}
