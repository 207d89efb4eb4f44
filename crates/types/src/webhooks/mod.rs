//! Filler webhook endpoint configuration

use alloy::primitives::{keccak256, Address};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single filler webhook endpoint as loaded from the config store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookConfiguration {
	/// Display name of the filler behind this endpoint
	pub name: String,
	/// Webhook URL quotes are posted to
	pub endpoint: String,
	/// Extra headers sent on every call (auth etc.)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub headers: Option<HashMap<String, String>>,
	/// Chains this endpoint quotes on; absent means all supported chains
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub chain_ids: Option<Vec<u64>>,
	/// Per-endpoint timeout override in milliseconds
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timeout_ms: Option<u64>,
	/// Known filler addresses, for compliance rules keyed off sender identity
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub addresses: Option<Vec<Address>>,
}

impl WebhookConfiguration {
	pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			endpoint: endpoint.into(),
			headers: None,
			chain_ids: None,
			timeout_ms: None,
			addresses: None,
		}
	}

	pub fn with_chain_ids(mut self, chain_ids: Vec<u64>) -> Self {
		self.chain_ids = Some(chain_ids);
		self
	}

	pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.timeout_ms = Some(timeout_ms);
		self
	}

	pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
		self.headers = Some(headers);
		self
	}

	/// Stable filler hash keying circuit-breaker state
	pub fn hash(&self) -> String {
		keccak256(self.name.as_bytes()).to_string()
	}

	/// Purely local chain allow-list check; no network call
	pub fn supports_chain(&self, chain_id: u64) -> bool {
		match &self.chain_ids {
			Some(chain_ids) => chain_ids.contains(&chain_id),
			None => true,
		}
	}
}

/// Compliance rule from the config store: these endpoints may not quote for
/// these swapper addresses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplianceRule {
	pub endpoints: Vec<String>,
	pub addresses: Vec<Address>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hash_is_stable_and_name_keyed() {
		let a = WebhookConfiguration::new("filler-a", "https://a.example.com/quote");
		let b = WebhookConfiguration::new("filler-a", "https://other.example.com/quote");
		let c = WebhookConfiguration::new("filler-c", "https://a.example.com/quote");

		assert_eq!(a.hash(), b.hash());
		assert_ne!(a.hash(), c.hash());
		assert!(a.hash().starts_with("0x"));
	}

	#[test]
	fn absent_chain_list_means_all_chains() {
		let webhook = WebhookConfiguration::new("filler", "https://f.example.com");
		assert!(webhook.supports_chain(1));
		assert!(webhook.supports_chain(137));
	}

	#[test]
	fn chain_list_is_exclusive() {
		let webhook =
			WebhookConfiguration::new("filler", "https://f.example.com").with_chain_ids(vec![4, 5, 6]);
		assert!(webhook.supports_chain(5));
		assert!(!webhook.supports_chain(1));
	}
}
