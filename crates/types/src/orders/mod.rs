//! Hard-quote order structures and historical order outcomes

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::sol_types::SolValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::quotes::{QuoteRequest, QuoteValidationError, TradeType};
use crate::storage::StorageError;

/// Fixed price improvement non-exclusive fillers must beat during the
/// exclusivity window, in basis points. External business constant.
pub const EXCLUSIVITY_OVERRIDE_BPS: u64 = 100;

/// Input leg of a partially specified order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderInput {
	pub token: Address,
	pub amount: U256,
}

/// Output leg of a partially specified order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderOutput {
	pub token: Address,
	pub amount: U256,
	pub recipient: Address,
}

/// User-presented order awaiting cosignature
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnsignedOrder {
	pub reactor: Address,
	pub swapper: Address,
	pub cosigner: Address,
	pub input: OrderInput,
	pub outputs: Vec<OrderOutput>,
}

impl UnsignedOrder {
	/// Canonical hash of the order fields, the base of the cosign digest
	pub fn struct_hash(&self) -> B256 {
		let outputs: Vec<(Address, U256, Address)> = self
			.outputs
			.iter()
			.map(|o| (o.token, o.amount, o.recipient))
			.collect();
		let encoded = (
			self.reactor,
			self.swapper,
			self.cosigner,
			(self.input.token, self.input.amount),
			outputs,
		)
			.abi_encode();
		keccak256(encoded)
	}
}

/// Cosigner-provided decoration of an order: decay window, exclusivity and
/// amount overrides taken from the winning quote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CosignerData {
	pub decay_start_time: u64,
	pub decay_end_time: u64,
	/// Zero address means an open, non-exclusive order
	pub exclusive_filler: Address,
	pub exclusivity_override_bps: U256,
	/// Zero means no override of the order's input amount
	pub input_override: U256,
	/// Zero entries mean no override of the matching output amount
	pub output_overrides: Vec<U256>,
}

impl CosignerData {
	/// Open order: no overrides, no exclusive filler
	pub fn open(decay_start_time: u64, decay_end_time: u64, num_outputs: usize) -> Self {
		Self {
			decay_start_time,
			decay_end_time,
			exclusive_filler: Address::ZERO,
			exclusivity_override_bps: U256::ZERO,
			input_override: U256::ZERO,
			output_overrides: vec![U256::ZERO; num_outputs],
		}
	}

	/// Digest signed by the cosigner key: keccak over the canonical encoding
	/// of the order hash plus this data.
	pub fn digest(&self, order_hash: B256, chain_id: u64) -> B256 {
		let encoded = (
			order_hash,
			U256::from(chain_id),
			U256::from(self.decay_start_time),
			U256::from(self.decay_end_time),
			self.exclusive_filler,
			self.exclusivity_override_bps,
			self.input_override,
			self.output_overrides.clone(),
		)
			.abi_encode();
		keccak256(encoded)
	}
}

/// Fully cosigned order ready for submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CosignedOrder {
	pub quote_id: Uuid,
	pub chain_id: u64,
	pub order: UnsignedOrder,
	pub cosigner_data: CosignerData,
	pub cosignature: Bytes,
	pub user_signature: Bytes,
}

/// Inbound hard-quote call: a partially specified order plus the user's
/// signature over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardQuoteRequest {
	pub request_id: Uuid,
	pub quote_id: Option<Uuid>,
	pub chain_id: u64,
	pub side: TradeType,
	pub order: UnsignedOrder,
	pub user_signature: Bytes,
	/// Caller explicitly accepts an open order when no quote beats the
	/// order's own terms or no quote exists at all.
	pub allow_no_quote: bool,
}

impl HardQuoteRequest {
	/// Derive the indicative quote request used to price this order
	pub fn to_quote_request(&self) -> Result<QuoteRequest, QuoteValidationError> {
		let output = self
			.order
			.outputs
			.first()
			.ok_or_else(|| QuoteValidationError::MissingField {
				field: "outputs".to_string(),
			})?;

		let amount = match self.side {
			TradeType::ExactInput => self.order.input.amount,
			TradeType::ExactOutput => output.amount,
		};

		let request = QuoteRequest::new(
			self.request_id,
			self.order.input.token,
			output.token,
			self.chain_id,
			self.chain_id,
			amount,
			self.side,
			self.order.swapper,
			self.order.outputs.len() as u32,
		)?
		.with_cosigner(self.order.cosigner);

		Ok(match self.quote_id {
			Some(quote_id) => request.with_quote_id(quote_id),
			None => request,
		})
	}
}

/// Outcome of handing a cosigned order to the submission collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionReceipt {
	pub status_code: u16,
	pub message: Option<String>,
}

impl SubmissionReceipt {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status_code)
	}
}

/// Historical order row pulled from the analytics warehouse for fade analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderOutcomeRow {
	pub filler: Address,
	/// When the quote was posted, unix seconds
	pub post_timestamp: i64,
	/// Decay start the filler promised in its quote
	pub decay_start_time: i64,
	/// When the order was actually filled
	pub fill_timestamp: i64,
}

impl OrderOutcomeRow {
	/// An order faded when its promised decay start lands after the actual
	/// fill time: the filler was too slow to honor its own quote window.
	pub fn faded(&self) -> bool {
		self.decay_start_time > self.fill_timestamp
	}
}

/// Hard-quote path failures
#[derive(Error, Debug)]
pub enum HardQuoteError {
	#[error("Unknown cosigner {got}, expected {expected}")]
	UnknownCosigner { expected: Address, got: Address },

	#[error("No quote available for request {request_id}")]
	NoQuote { request_id: Uuid },

	#[error("Invalid hard quote request: {0}")]
	Validation(#[from] QuoteValidationError),

	#[error("Cosigning failed: {0}")]
	Signing(String),

	#[error("Order submission failed with status {status}: {message:?}")]
	Submission { status: u16, message: Option<String> },

	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
}
