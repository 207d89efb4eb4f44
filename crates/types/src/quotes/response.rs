//! Canonical quote response model

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::request::{QuoteRequest, TradeType};

/// Where a response came from, for audit logging and exclusivity
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndpointMetadata {
	pub endpoint_url: String,
	pub filler_name: String,
}

/// Canonical in-memory quote, produced from a validated external reply or a
/// locally generated fallback.
///
/// The specified side's amount is always copied from the originating request,
/// never from the external reply; only the quoted side comes from the filler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteResponse {
	pub chain_id: u64,
	pub request_id: Uuid,
	pub quote_id: Uuid,
	pub token_in: Address,
	pub token_out: Address,
	pub amount_in: U256,
	pub amount_out: U256,
	pub filler: Option<Address>,
	pub created_at: DateTime<Utc>,
	pub endpoint: EndpointMetadata,
}

impl QuoteResponse {
	/// Build a response from the request plus the single quoted-side amount.
	/// The specified side is taken from the request unconditionally.
	pub fn from_request(
		request: &QuoteRequest,
		quote_id: Uuid,
		quoted_amount: U256,
		filler: Option<Address>,
		endpoint: EndpointMetadata,
	) -> Self {
		let (amount_in, amount_out) = match request.side {
			TradeType::ExactInput => (request.amount, quoted_amount),
			TradeType::ExactOutput => (quoted_amount, request.amount),
		};

		Self {
			chain_id: request.chain_id(),
			request_id: request.request_id,
			quote_id,
			token_in: request.token_in,
			token_out: request.token_out,
			amount_in,
			amount_out,
			filler,
			created_at: Utc::now(),
			endpoint,
		}
	}

	/// The amount the filler actually quoted (the non-specified side)
	pub fn quoted_amount(&self, side: TradeType) -> U256 {
		match side {
			TradeType::ExactInput => self.amount_out,
			TradeType::ExactOutput => self.amount_in,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::address;

	fn request(side: TradeType) -> QuoteRequest {
		QuoteRequest::new(
			Uuid::new_v4(),
			address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
			address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
			1,
			1,
			U256::from(1_000u64),
			side,
			address!("742d35Cc6675C88b1C6e3c0c61b2e9a3D0C3F123"),
			1,
		)
		.unwrap()
	}

	#[test]
	fn exact_input_pins_amount_in_to_request() {
		let req = request(TradeType::ExactInput);
		let resp = QuoteResponse::from_request(
			&req,
			Uuid::new_v4(),
			U256::from(2_000u64),
			None,
			EndpointMetadata::default(),
		);

		assert_eq!(resp.amount_in, U256::from(1_000u64));
		assert_eq!(resp.amount_out, U256::from(2_000u64));
		assert_eq!(resp.quoted_amount(TradeType::ExactInput), resp.amount_out);
	}

	#[test]
	fn exact_output_pins_amount_out_to_request() {
		let req = request(TradeType::ExactOutput);
		let resp = QuoteResponse::from_request(
			&req,
			Uuid::new_v4(),
			U256::from(900u64),
			None,
			EndpointMetadata::default(),
		);

		assert_eq!(resp.amount_out, U256::from(1_000u64));
		assert_eq!(resp.amount_in, U256::from(900u64));
		assert_eq!(resp.quoted_amount(TradeType::ExactOutput), resp.amount_in);
	}
}
