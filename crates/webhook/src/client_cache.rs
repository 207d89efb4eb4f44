//! HTTP client cache for outbound webhook calls
//!
//! Provides per-endpoint client instances with connection pooling and
//! keep-alive, so repeated fan-outs reuse warm connections.

use dashmap::DashMap;
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use rfq_types::WebhookConfiguration;

use crate::client::WebhookError;

/// Cache key: everything that changes the constructed client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientConfig {
	pub endpoint: String,
	pub filler_name: String,
	pub max_idle_per_host: usize,
	pub keep_alive_timeout_ms: u64,
	/// Sorted so equal header sets hash equally
	pub headers: Vec<(String, String)>,
}

impl From<&WebhookConfiguration> for ClientConfig {
	fn from(webhook: &WebhookConfiguration) -> Self {
		let mut headers = vec![
			("User-Agent".to_string(), "RFQ-Aggregator/1.0".to_string()),
			("Content-Type".to_string(), "application/json".to_string()),
		];
		if let Some(extra) = &webhook.headers {
			for (key, value) in extra {
				headers.push((key.clone(), value.clone()));
			}
		}
		headers.sort();

		Self {
			endpoint: webhook.endpoint.clone(),
			filler_name: webhook.name.clone(),
			max_idle_per_host: 10,
			keep_alive_timeout_ms: 90_000,
			headers,
		}
	}
}

#[derive(Debug, Clone)]
struct CachedClient {
	client: Arc<Client>,
	created_at: Instant,
}

impl CachedClient {
	fn new(client: Client) -> Self {
		Self {
			client: Arc::new(client),
			created_at: Instant::now(),
		}
	}

	fn is_expired(&self, ttl: Duration) -> bool {
		self.created_at.elapsed() > ttl
	}
}

/// Thread-safe, TTL-bounded cache of pooled HTTP clients keyed by endpoint
/// configuration.
#[derive(Clone, Debug)]
pub struct ClientCache {
	clients: Arc<DashMap<ClientConfig, CachedClient>>,
	ttl: Duration,
}

impl ClientCache {
	/// Default 30-minute TTL
	pub fn new() -> Self {
		Self::with_ttl(Duration::from_secs(30 * 60))
	}

	pub fn with_ttl(ttl: Duration) -> Self {
		Self {
			clients: Arc::new(DashMap::new()),
			ttl,
		}
	}

	/// Get or create a pooled client for the given endpoint configuration
	pub fn get_client(&self, config: &ClientConfig) -> Result<Arc<Client>, WebhookError> {
		self.clients.remove_if(config, |_, cached| {
			let expired = cached.is_expired(self.ttl);
			if expired {
				warn!(
					endpoint = %config.endpoint,
					age = ?cached.created_at.elapsed(),
					"webhook client expired, recreating"
				);
			}
			expired
		});

		if let Some(cached) = self.clients.get(config) {
			return Ok(cached.client.clone());
		}

		debug!(endpoint = %config.endpoint, "creating webhook client");
		let cached = CachedClient::new(build_client(config)?);
		let client = cached.client.clone();

		use dashmap::mapref::entry::Entry;
		match self.clients.entry(config.clone()) {
			Entry::Occupied(entry) => Ok(entry.get().client.clone()),
			Entry::Vacant(entry) => {
				entry.insert(cached);
				Ok(client)
			},
		}
	}

	/// Drop all expired entries, returning how many were removed
	pub fn cleanup_expired(&self) -> usize {
		let mut removed = 0;
		self.clients.retain(|_, cached| {
			let expired = cached.is_expired(self.ttl);
			if expired {
				removed += 1;
			}
			!expired
		});
		removed
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}
}

impl Default for ClientCache {
	fn default() -> Self {
		Self::new()
	}
}

fn build_client(config: &ClientConfig) -> Result<Client, WebhookError> {
	let mut header_map = reqwest::header::HeaderMap::new();
	for (key, value) in &config.headers {
		if let (Ok(name), Ok(value)) = (
			reqwest::header::HeaderName::from_bytes(key.as_bytes()),
			reqwest::header::HeaderValue::from_str(value),
		) {
			header_map.insert(name, value);
		}
	}

	ClientBuilder::new()
		.pool_max_idle_per_host(config.max_idle_per_host)
		.pool_idle_timeout(Duration::from_millis(config.keep_alive_timeout_ms))
		.tcp_keepalive(Duration::from_secs(60))
		.default_headers(header_map)
		.build()
		.map_err(WebhookError::Transport)
}

lazy_static::lazy_static! {
	static ref GLOBAL_CLIENT_CACHE: ClientCache = ClientCache::new();
}

/// Process-wide client cache shared by all dispatchers
pub fn global_client_cache() -> &'static ClientCache {
	&GLOBAL_CLIENT_CACHE
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config(endpoint: &str) -> ClientConfig {
		ClientConfig {
			endpoint: endpoint.to_string(),
			filler_name: "filler".to_string(),
			max_idle_per_host: 5,
			keep_alive_timeout_ms: 60_000,
			headers: vec![],
		}
	}

	#[tokio::test]
	async fn cache_reuses_clients() {
		let cache = ClientCache::new();
		let client1 = cache.get_client(&config("https://a.example.com")).unwrap();
		let client2 = cache.get_client(&config("https://a.example.com")).unwrap();
		assert!(Arc::ptr_eq(&client1, &client2));
	}

	#[tokio::test]
	async fn expired_clients_are_recreated() {
		let cache = ClientCache::with_ttl(Duration::from_millis(50));
		let client1 = cache.get_client(&config("https://a.example.com")).unwrap();

		tokio::time::sleep(Duration::from_millis(100)).await;

		let client2 = cache.get_client(&config("https://a.example.com")).unwrap();
		assert!(!Arc::ptr_eq(&client1, &client2));
	}

	#[tokio::test]
	async fn cleanup_sweeps_only_expired_entries() {
		let cache = ClientCache::with_ttl(Duration::from_millis(50));
		cache.get_client(&config("https://a.example.com")).unwrap();
		cache.get_client(&config("https://b.example.com")).unwrap();

		assert_eq!(cache.cleanup_expired(), 0);
		tokio::time::sleep(Duration::from_millis(100)).await;
		assert_eq!(cache.cleanup_expired(), 2);
	}

	#[test]
	fn header_iteration_order_does_not_split_cache_entries() {
		let webhook = WebhookConfiguration::new("filler", "https://a.example.com").with_headers(
			[
				("x-key".to_string(), "1".to_string()),
				("x-other".to_string(), "2".to_string()),
				("authorization".to_string(), "token".to_string()),
			]
			.into(),
		);

		// HashMap iteration order is unstable; the sorted key must stay equal
		assert_eq!(ClientConfig::from(&webhook), ClientConfig::from(&webhook));
	}
}
