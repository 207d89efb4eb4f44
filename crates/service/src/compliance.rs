//! Endpoint/swapper compliance screening

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use tracing::{debug, warn};

use rfq_types::{ConfigStore, WebhookConfiguration};

use crate::cache::TtlCache;

type ExclusionMap = HashMap<String, HashSet<Address>>;

/// Screens endpoints against per-swapper exclusion rules from the config
/// store. Screening failures never block quoting: if the rules cannot be
/// loaded and no stale copy exists, everything passes.
pub struct ComplianceFilter {
	store: Arc<dyn ConfigStore>,
	cache: TtlCache<Arc<ExclusionMap>>,
}

impl ComplianceFilter {
	pub fn new(store: Arc<dyn ConfigStore>, ttl: Duration) -> Self {
		Self {
			store,
			cache: TtlCache::new(ttl),
		}
	}

	async fn exclusions(&self) -> Arc<ExclusionMap> {
		let result = self
			.cache
			.get_or_refresh(|| async {
				let rules = self.store.fetch_compliance_rules().await?;
				let mut map: ExclusionMap = HashMap::new();
				for rule in rules {
					for endpoint in &rule.endpoints {
						map.entry(endpoint.clone())
							.or_default()
							.extend(rule.addresses.iter().copied());
					}
				}
				Ok::<_, rfq_types::StorageError>(Arc::new(map))
			})
			.await;

		match result {
			Ok(map) => map,
			Err(err) => {
				warn!(error = %err, "compliance rules unavailable, screening disabled");
				Arc::new(ExclusionMap::new())
			},
		}
	}

	/// Drop endpoints that may not quote for this swapper
	pub async fn screen(
		&self,
		candidates: Vec<WebhookConfiguration>,
		swapper: Address,
	) -> Vec<WebhookConfiguration> {
		let exclusions = self.exclusions().await;
		if exclusions.is_empty() {
			return candidates;
		}

		candidates
			.into_iter()
			.filter(|webhook| {
				let excluded = exclusions
					.get(&webhook.endpoint)
					.map(|addresses| addresses.contains(&swapper))
					.unwrap_or(false);
				if excluded {
					debug!(
						endpoint = %webhook.endpoint,
						swapper = %swapper,
						"endpoint screened out by compliance rule"
					);
				}
				!excluded
			})
			.collect()
	}
}
