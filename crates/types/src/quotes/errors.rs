//! Error types for quote operations

use thiserror::Error;
use uuid::Uuid;

/// Per-response validation errors collected by the normalizer
///
/// These are soft at collection time (the normalizer still produces a
/// best-effort response for logging) and hard at selection time (any error
/// excludes the response from the candidate pool).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteValidationError {
	#[error("Missing required field: {field}")]
	MissingField { field: String },

	#[error("Invalid field {field}: {reason}")]
	InvalidField { field: String, reason: String },

	#[error("Token mismatch on {field}: expected {expected}, got {got}")]
	TokenMismatch {
		field: String,
		expected: String,
		got: String,
	},

	#[error("Request id mismatch: expected {expected}, got {got}")]
	RequestIdMismatch { expected: Uuid, got: String },

	#[error("Chain id mismatch: tokenIn {token_in_chain_id}, tokenOut {token_out_chain_id}")]
	ChainMismatch {
		token_in_chain_id: u64,
		token_out_chain_id: u64,
	},

	#[error("Unsupported chain: {chain_id}")]
	UnsupportedChain { chain_id: u64 },

	#[error("Pre-transfer simulation failed for leg {leg}")]
	TransferSimulationFailed { leg: String },

	#[error("Permissioned token {token} quoted without a transfer simulator")]
	MissingTransferSimulator { token: String },
}

/// General quote-path errors surfaced to callers
#[derive(Error, Debug)]
pub enum QuoteError {
	#[error("Request validation failed: {0}")]
	Validation(#[from] QuoteValidationError),

	#[error("No eligible quotes for request {request_id}")]
	NoQuote { request_id: Uuid },

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("Storage error: {0}")]
	Storage(#[from] crate::storage::StorageError),
}
