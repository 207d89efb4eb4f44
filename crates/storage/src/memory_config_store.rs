//! In-memory config store backed by DashMap

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, RwLock};

use rfq_types::{
	CircuitBreakerConfiguration, ComplianceRule, ConfigStore, StorageError, StorageResult,
	WebhookConfiguration,
};

/// Config store holding everything in process memory. The production binding
/// is a database; this one backs tests and single-node deployments where the
/// endpoint set ships with the binary.
#[derive(Clone, Default)]
pub struct MemoryConfigStore {
	endpoints: Arc<RwLock<Vec<WebhookConfiguration>>>,
	compliance_rules: Arc<RwLock<Vec<ComplianceRule>>>,
	circuit_breaker_configs: Arc<DashMap<String, CircuitBreakerConfiguration>>,
}

impl MemoryConfigStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_endpoints(endpoints: Vec<WebhookConfiguration>) -> Self {
		let store = Self::new();
		store.set_endpoints(endpoints);
		store
	}

	pub fn set_endpoints(&self, endpoints: Vec<WebhookConfiguration>) {
		if let Ok(mut guard) = self.endpoints.write() {
			*guard = endpoints;
		}
	}

	pub fn set_compliance_rules(&self, rules: Vec<ComplianceRule>) {
		if let Ok(mut guard) = self.compliance_rules.write() {
			*guard = rules;
		}
	}
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
	async fn fetch_endpoints(&self) -> StorageResult<Vec<WebhookConfiguration>> {
		self.endpoints
			.read()
			.map(|guard| guard.clone())
			.map_err(|_| StorageError::Backend("endpoints lock poisoned".to_string()))
	}

	async fn fetch_compliance_rules(&self) -> StorageResult<Vec<ComplianceRule>> {
		self.compliance_rules
			.read()
			.map(|guard| guard.clone())
			.map_err(|_| StorageError::Backend("compliance lock poisoned".to_string()))
	}

	async fn fetch_circuit_breaker_configs(
		&self,
	) -> StorageResult<Vec<CircuitBreakerConfiguration>> {
		Ok(self
			.circuit_breaker_configs
			.iter()
			.map(|entry| entry.value().clone())
			.collect())
	}

	async fn put_circuit_breaker_configs(
		&self,
		configs: Vec<CircuitBreakerConfiguration>,
	) -> StorageResult<()> {
		for config in configs {
			self.circuit_breaker_configs
				.insert(config.hash.clone(), config);
		}
		Ok(())
	}
}
