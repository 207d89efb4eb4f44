//! RFQ Types
//!
//! Shared models and collaborator traits for the RFQ aggregation engine.
//! This crate contains all domain models organized by business entity.

pub mod circuit_breaker;
pub mod orders;
pub mod quotes;
pub mod secret_string;
pub mod storage;
pub mod webhooks;

// Re-export chrono and serde_json for convenience
pub use chrono;
pub use serde_json;

// Re-export commonly used types for convenience
pub use quotes::{
	EndpointMetadata, ProtocolVersion, QuoteError, QuoteRequest, QuoteResponse, QuoteResult,
	QuoteValidationError, TradeType, WireQuoteRequest, SUPPORTED_CHAIN_IDS,
};

pub use webhooks::{ComplianceRule, WebhookConfiguration};

pub use circuit_breaker::{
	CircuitBreakerConfiguration, DisabledEndpoint, EndpointStatuses, FillerTimestampRow,
};

pub use orders::{
	CosignedOrder, CosignerData, HardQuoteError, HardQuoteRequest, OrderInput, OrderOutcomeRow,
	OrderOutput, SubmissionReceipt, UnsignedOrder,
};

pub use secret_string::SecretString;

pub use storage::{
	ConfigStore, KeyValueStore, OrderSubmitter, QueryStatus, SimulationError, StorageError,
	StorageResult, TransferSimulator, Warehouse,
};
