//! Cached view of the registered filler endpoints

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use rfq_types::{ConfigStore, StorageResult, WebhookConfiguration};

use crate::cache::TtlCache;

/// Endpoint list pulled from the config store behind a short TTL, so new
/// registrations show up without a restart and a flaky store serves stale
/// data instead of failing the quote path.
pub struct EndpointDirectory {
	store: Arc<dyn ConfigStore>,
	cache: TtlCache<Vec<WebhookConfiguration>>,
}

impl EndpointDirectory {
	pub fn new(store: Arc<dyn ConfigStore>, ttl: Duration) -> Self {
		Self {
			store,
			cache: TtlCache::new(ttl),
		}
	}

	pub async fn endpoints(&self) -> StorageResult<Vec<WebhookConfiguration>> {
		self.cache
			.get_or_refresh(|| self.store.fetch_endpoints())
			.await
	}

	/// Endpoints willing to quote on `chain_id`, per their local allow-list.
	/// This filter never makes a network call.
	pub async fn endpoints_for_chain(
		&self,
		chain_id: u64,
	) -> StorageResult<Vec<WebhookConfiguration>> {
		let endpoints = self.endpoints().await?;
		let eligible: Vec<WebhookConfiguration> = endpoints
			.into_iter()
			.filter(|webhook| webhook.supports_chain(chain_id))
			.collect();

		debug!(chain_id, count = eligible.len(), "endpoints eligible for chain");
		Ok(eligible)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rfq_storage::MemoryConfigStore;

	#[tokio::test]
	async fn chain_filter_drops_foreign_endpoints() {
		let store = MemoryConfigStore::with_endpoints(vec![
			WebhookConfiguration::new("mainnet-only", "https://a.example.com")
				.with_chain_ids(vec![1]),
			WebhookConfiguration::new("polygon-only", "https://b.example.com")
				.with_chain_ids(vec![137]),
			WebhookConfiguration::new("everywhere", "https://c.example.com"),
		]);
		let directory = EndpointDirectory::new(Arc::new(store), Duration::from_secs(60));

		let mainnet = directory.endpoints_for_chain(1).await.unwrap();
		assert_eq!(mainnet.len(), 2);
		assert!(mainnet.iter().all(|w| w.name != "polygon-only"));
	}

	#[tokio::test]
	async fn directory_serves_cached_list_within_ttl() {
		let store = MemoryConfigStore::with_endpoints(vec![WebhookConfiguration::new(
			"filler",
			"https://a.example.com",
		)]);
		let directory = EndpointDirectory::new(Arc::new(store.clone()), Duration::from_secs(60));

		assert_eq!(directory.endpoints().await.unwrap().len(), 1);

		// Store change is invisible until the TTL lapses
		store.set_endpoints(vec![]);
		assert_eq!(directory.endpoints().await.unwrap().len(), 1);
	}
}
