//! Inbound quote request model and its wire transforms

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::QuoteValidationError;

/// Chains the aggregator is willing to quote on
pub const SUPPORTED_CHAIN_IDS: &[u64] = &[1, 10, 137, 8453, 42161, 11155111];

/// Which side of the trade the request pins down
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeType {
	ExactInput,
	ExactOutput,
}

impl TradeType {
	/// The opposite trade side
	pub fn flipped(&self) -> Self {
		match self {
			Self::ExactInput => Self::ExactOutput,
			Self::ExactOutput => Self::ExactInput,
		}
	}
}

/// Trade-protocol version tag; replaces the request class hierarchy with a
/// single tagged type plus conversion functions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ProtocolVersion {
	V1,
	#[default]
	V2,
}

/// Immutable, validated quote request
///
/// Created from an inbound payload after schema validation and never mutated
/// afterwards; transforms produce new values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
	pub request_id: Uuid,
	pub token_in: Address,
	pub token_out: Address,
	pub token_in_chain_id: u64,
	pub token_out_chain_id: u64,
	pub amount: U256,
	pub side: TradeType,
	pub swapper: Address,
	pub num_outputs: u32,
	pub cosigner: Option<Address>,
	pub quote_id: Option<Uuid>,
	pub protocol: ProtocolVersion,
}

impl QuoteRequest {
	/// Validate chain invariants and construct the request
	#[allow(clippy::too_many_arguments)]
	pub fn new(
		request_id: Uuid,
		token_in: Address,
		token_out: Address,
		token_in_chain_id: u64,
		token_out_chain_id: u64,
		amount: U256,
		side: TradeType,
		swapper: Address,
		num_outputs: u32,
	) -> Result<Self, QuoteValidationError> {
		if token_in_chain_id != token_out_chain_id {
			return Err(QuoteValidationError::ChainMismatch {
				token_in_chain_id,
				token_out_chain_id,
			});
		}
		if !SUPPORTED_CHAIN_IDS.contains(&token_in_chain_id) {
			return Err(QuoteValidationError::UnsupportedChain {
				chain_id: token_in_chain_id,
			});
		}

		Ok(Self {
			request_id,
			token_in,
			token_out,
			token_in_chain_id,
			token_out_chain_id,
			amount,
			side,
			swapper,
			num_outputs,
			cosigner: None,
			quote_id: None,
			protocol: ProtocolVersion::default(),
		})
	}

	pub fn with_cosigner(mut self, cosigner: Address) -> Self {
		self.cosigner = Some(cosigner);
		self
	}

	pub fn with_quote_id(mut self, quote_id: Uuid) -> Self {
		self.quote_id = Some(quote_id);
		self
	}

	pub fn with_protocol(mut self, protocol: ProtocolVersion) -> Self {
		self.protocol = protocol;
		self
	}

	pub fn chain_id(&self) -> u64 {
		self.token_in_chain_id
	}

	/// Swapper-redacted form sent to external endpoints
	pub fn cleaned(&self) -> Self {
		Self {
			swapper: Address::ZERO,
			..self.clone()
		}
	}

	/// The opposite leg: tokens swapped and trade side flipped
	pub fn opposing(&self) -> Self {
		Self {
			token_in: self.token_out,
			token_out: self.token_in,
			side: self.side.flipped(),
			..self.clone()
		}
	}

	/// JSON body posted to filler webhooks (cleaned form)
	pub fn to_wire(&self) -> WireQuoteRequest {
		let cleaned = self.cleaned();
		WireQuoteRequest {
			request_id: cleaned.request_id,
			token_in_chain_id: cleaned.token_in_chain_id,
			token_out_chain_id: cleaned.token_out_chain_id,
			token_in: cleaned.token_in.to_string(),
			token_out: cleaned.token_out.to_string(),
			amount: cleaned.amount.to_string(),
			swapper: cleaned.swapper.to_string(),
			trade_type: cleaned.side,
			num_outputs: cleaned.num_outputs,
			quote_id: cleaned.quote_id,
			protocol: cleaned.protocol,
		}
	}
}

/// Wire shape of the outbound webhook payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireQuoteRequest {
	pub request_id: Uuid,
	pub token_in_chain_id: u64,
	pub token_out_chain_id: u64,
	pub token_in: String,
	pub token_out: String,
	/// Decimal string, never scientific notation
	pub amount: String,
	pub swapper: String,
	#[serde(rename = "type")]
	pub trade_type: TradeType,
	pub num_outputs: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub quote_id: Option<Uuid>,
	pub protocol: ProtocolVersion,
}
