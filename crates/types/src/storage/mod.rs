//! Collaborator traits for external state
//!
//! The engine never talks to databases, warehouses or chains directly; it
//! goes through these traits so deployments can bind whatever backends they
//! run, and tests can bind in-memory fakes.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use alloy::primitives::{Address, U256};

use crate::circuit_breaker::{CircuitBreakerConfiguration, FillerTimestampRow};
use crate::orders::{CosignedOrder, OrderOutcomeRow, SubmissionReceipt};
use crate::webhooks::{ComplianceRule, WebhookConfiguration};

#[derive(Error, Debug)]
pub enum StorageError {
	#[error("Storage backend error: {0}")]
	Backend(String),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Source of endpoint, compliance and circuit-breaker configuration
#[async_trait]
pub trait ConfigStore: Send + Sync {
	/// All registered filler webhook endpoints
	async fn fetch_endpoints(&self) -> StorageResult<Vec<WebhookConfiguration>>;

	/// Endpoint/swapper exclusion rules
	async fn fetch_compliance_rules(&self) -> StorageResult<Vec<ComplianceRule>>;

	/// Rate-threshold circuit breaker rows, keyed by filler hash
	async fn fetch_circuit_breaker_configs(&self)
		-> StorageResult<Vec<CircuitBreakerConfiguration>>;

	/// Replace the rate-threshold rows, written by the offline updater
	async fn put_circuit_breaker_configs(
		&self,
		configs: Vec<CircuitBreakerConfiguration>,
	) -> StorageResult<()>;
}

/// Low-latency store for per-filler timestamp state
#[async_trait]
pub trait KeyValueStore: Send + Sync {
	async fn get_timestamp_row(&self, hash: &str) -> StorageResult<Option<FillerTimestampRow>>;

	/// Batch read; absent keys are simply missing from the result map
	async fn batch_get_timestamp_rows(
		&self,
		hashes: &[String],
	) -> StorageResult<HashMap<String, FillerTimestampRow>>;

	async fn batch_put_timestamp_rows(&self, rows: Vec<FillerTimestampRow>) -> StorageResult<()>;

	/// Filler address to filler name, for resolving warehouse rows to
	/// endpoint hashes
	async fn filler_directory(&self) -> StorageResult<HashMap<Address, String>>;
}

/// Terminal states are `Finished`, `Failed` and `Aborted`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
	Submitted,
	Started,
	Finished,
	Failed,
	Aborted,
}

impl QueryStatus {
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Finished | Self::Failed | Self::Aborted)
	}
}

/// Analytics warehouse with asynchronous query execution
#[async_trait]
pub trait Warehouse: Send + Sync {
	/// Submit a query for order outcomes posted after `since_timestamp`,
	/// returning an execution id to poll.
	async fn submit_query(&self, since_timestamp: i64) -> StorageResult<String>;

	async fn query_status(&self, execution_id: &str) -> StorageResult<QueryStatus>;

	async fn fetch_rows(&self, execution_id: &str) -> StorageResult<Vec<OrderOutcomeRow>>;
}

/// Hands a cosigned order off to the settlement pipeline
#[async_trait]
pub trait OrderSubmitter: Send + Sync {
	async fn submit(&self, order: &CosignedOrder) -> StorageResult<SubmissionReceipt>;
}

#[derive(Error, Debug)]
pub enum SimulationError {
	#[error("Simulation backend unavailable: {0}")]
	Unavailable(String),

	#[error("Simulation call reverted: {0}")]
	Reverted(String),
}

/// Simulates ERC-20 transfers for permissioned tokens that can reject
/// arbitrary senders or recipients.
#[async_trait]
pub trait TransferSimulator: Send + Sync {
	/// True when a transfer of `amount` from `from` to `to` would succeed
	async fn can_transfer(
		&self,
		token: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<bool, SimulationError>;
}
