//! RFQ Aggregator
//!
//! Quote aggregation engine for RFQ trading: fans swap requests out to
//! market-maker webhooks, validates and normalizes the replies, selects the
//! best quote, enforces a fade-rate circuit breaker, and cosigns winning
//! quotes into submittable orders.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rfq_aggregator::RfqAggregatorBuilder;
//! use rfq_storage::{MemoryConfigStore, MemoryKvStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let aggregator = RfqAggregatorBuilder::new(Default::default())
//! 	.with_config_store(Arc::new(MemoryConfigStore::new()))
//! 	.with_kv_store(Arc::new(MemoryKvStore::new()))
//! 	.build()?;
//! # Ok(())
//! # }
//! ```

pub mod mocks;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use rfq_config::{CircuitBreakerPolicy, Settings};
use rfq_service::{
	select_best, ComplianceFilter, CosignerService, EndpointDirectory, FadeRateCircuitBreaker,
	FadeRateJob, FadeRateUpdater, IntervalScheduler, QuoteDispatcher, QuoteValidator,
	TimestampCircuitBreaker,
};
use rfq_types::{
	ConfigStore, CosignedOrder, HardQuoteError, HardQuoteRequest, KeyValueStore, OrderSubmitter,
	QuoteError, QuoteRequest, QuoteResponse, SubmissionReceipt, TransferSimulator, Warehouse,
};
use rfq_webhook::global_client_cache;

pub use rfq_config as config;
pub use rfq_service as service;
pub use rfq_storage as storage;
pub use rfq_types as types;
pub use rfq_webhook as webhook;

/// Wires stores, policies and the cosigner into a ready [`RfqAggregator`]
pub struct RfqAggregatorBuilder {
	settings: Settings,
	config_store: Option<Arc<dyn ConfigStore>>,
	kv_store: Option<Arc<dyn KeyValueStore>>,
	warehouse: Option<Arc<dyn Warehouse>>,
	submitter: Option<Arc<dyn OrderSubmitter>>,
	simulator: Option<Arc<dyn TransferSimulator>>,
	permissioned_tokens: Vec<alloy::primitives::Address>,
}

impl RfqAggregatorBuilder {
	pub fn new(settings: Settings) -> Self {
		Self {
			settings,
			config_store: None,
			kv_store: None,
			warehouse: None,
			submitter: None,
			simulator: None,
			permissioned_tokens: Vec::new(),
		}
	}

	pub fn with_config_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
		self.config_store = Some(store);
		self
	}

	pub fn with_kv_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
		self.kv_store = Some(store);
		self
	}

	pub fn with_warehouse(mut self, warehouse: Arc<dyn Warehouse>) -> Self {
		self.warehouse = Some(warehouse);
		self
	}

	pub fn with_order_submitter(mut self, submitter: Arc<dyn OrderSubmitter>) -> Self {
		self.submitter = Some(submitter);
		self
	}

	pub fn with_transfer_simulator(mut self, simulator: Arc<dyn TransferSimulator>) -> Self {
		self.simulator = Some(simulator);
		self
	}

	pub fn with_permissioned_tokens(
		mut self,
		tokens: impl IntoIterator<Item = alloy::primitives::Address>,
	) -> Self {
		self.permissioned_tokens = tokens.into_iter().collect();
		self
	}

	pub fn build(self) -> Result<RfqAggregator, BuildError> {
		let config_store = self.config_store.ok_or(BuildError::MissingConfigStore)?;

		let refresh = &self.settings.refresh;
		let directory = Arc::new(EndpointDirectory::new(
			Arc::clone(&config_store),
			Duration::from_secs(refresh.endpoints_ttl_secs),
		));
		let compliance = Arc::new(ComplianceFilter::new(
			Arc::clone(&config_store),
			Duration::from_secs(refresh.endpoints_ttl_secs),
		));

		let circuit_breaker: Arc<dyn rfq_service::CircuitBreaker> =
			match self.settings.circuit_breaker.policy {
				CircuitBreakerPolicy::Timestamp => {
					let kv_store = self.kv_store.clone().ok_or(BuildError::MissingKvStore)?;
					Arc::new(TimestampCircuitBreaker::new(
						kv_store,
						Duration::from_secs(refresh.circuit_breaker_ttl_secs),
					))
				},
				CircuitBreakerPolicy::FadeRate => Arc::new(FadeRateCircuitBreaker::new(
					Arc::clone(&config_store),
					Duration::from_secs(refresh.circuit_breaker_ttl_secs),
				)),
			};

		let mut validator = QuoteValidator::new()
			.with_permissioned_tokens(self.permissioned_tokens.iter().copied());
		if let Some(simulator) = &self.simulator {
			validator = validator.with_simulator(Arc::clone(simulator));
		}

		let dispatcher = QuoteDispatcher::new(
			directory,
			circuit_breaker,
			compliance,
			Arc::new(validator),
			global_client_cache().clone(),
			self.settings.timeouts.per_webhook_ms,
		);

		let cosigner = match &self.submitter {
			Some(submitter) if !self.settings.cosigner.private_key.is_empty() => Some(
				CosignerService::from_key(&self.settings.cosigner.private_key, Arc::clone(submitter))
					.map_err(|err| BuildError::InvalidCosignerKey(err.to_string()))?,
			),
			_ => None,
		};

		let updater = match (&self.warehouse, &self.kv_store) {
			(Some(warehouse), Some(kv_store)) => Some(Arc::new(FadeRateUpdater::new(
				Arc::clone(warehouse),
				Arc::clone(kv_store),
				Arc::clone(&config_store),
				self.settings.circuit_breaker.clone(),
			))),
			_ => None,
		};

		Ok(RfqAggregator {
			settings: self.settings,
			dispatcher,
			cosigner,
			updater,
		})
	}
}

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
	#[error("A config store is required")]
	MissingConfigStore,

	#[error("The timestamp circuit breaker policy requires a key-value store")]
	MissingKvStore,

	#[error("Invalid cosigner key: {0}")]
	InvalidCosignerKey(String),
}

/// The assembled engine. All methods are cheap to call concurrently; shared
/// state lives behind the stores and caches built once here.
pub struct RfqAggregator {
	settings: Settings,
	dispatcher: QuoteDispatcher,
	cosigner: Option<CosignerService>,
	updater: Option<Arc<FadeRateUpdater>>,
}

impl RfqAggregator {
	/// Indicative quote: fan out, validate, pick the best reply
	pub async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, QuoteError> {
		let candidates = self.dispatcher.dispatch(request).await?;
		select_best(request.side, candidates).ok_or(QuoteError::NoQuote {
			request_id: request.request_id,
		})
	}

	/// Hard quote: price the order, cosign the winner and submit it
	pub async fn hard_quote(
		&self,
		request: &HardQuoteRequest,
	) -> Result<(CosignedOrder, SubmissionReceipt), HardQuoteError> {
		let cosigner = self
			.cosigner
			.as_ref()
			.ok_or_else(|| HardQuoteError::Signing("cosigner not configured".to_string()))?;

		let quote_request = request.to_quote_request()?;
		let candidates = self.dispatcher.dispatch(&quote_request).await?;
		let best = select_best(quote_request.side, candidates);

		cosigner.cosign_and_submit(request, best.as_ref()).await
	}

	/// Cosigner address hard quotes must name, when one is configured
	pub fn cosigner_address(&self) -> Option<alloy::primitives::Address> {
		self.cosigner.as_ref().map(|c| c.address())
	}

	/// Start the recurring fade-rate job. Returns no handle when the
	/// deployment has no warehouse wired in.
	pub fn start_background_jobs(&self) -> Vec<JoinHandle<()>> {
		let Some(updater) = &self.updater else {
			return Vec::new();
		};

		let job = Arc::new(FadeRateJob::new(
			Arc::clone(updater),
			self.settings.circuit_breaker.policy,
		));
		info!(
			interval_secs = self.settings.circuit_breaker.update_interval_secs,
			"starting fade-rate background job"
		);
		vec![IntervalScheduler::spawn(
			job,
			Duration::from_secs(self.settings.circuit_breaker.update_interval_secs),
		)]
	}
}
