//! External reply validation and normalization

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tracing::warn;
use uuid::Uuid;

use rfq_types::{
	EndpointMetadata, QuoteRequest, QuoteResponse, QuoteValidationError, TradeType,
	TransferSimulator,
};

/// A reply normalized into the canonical model, with every validation
/// problem collected rather than short-circuited. Responses with errors are
/// logged in full and excluded from selection.
#[derive(Debug)]
pub struct NormalizedQuote {
	pub response: QuoteResponse,
	pub errors: Vec<QuoteValidationError>,
}

impl NormalizedQuote {
	pub fn is_valid(&self) -> bool {
		self.errors.is_empty()
	}
}

/// Validates raw webhook replies against the originating request.
///
/// The specified side's amount never comes from the reply; replies only
/// supply the quoted side, so a buggy or malicious filler cannot alter what
/// the swapper asked for.
pub struct QuoteValidator {
	simulator: Option<Arc<dyn TransferSimulator>>,
	permissioned_tokens: HashSet<Address>,
}

impl QuoteValidator {
	pub fn new() -> Self {
		Self {
			simulator: None,
			permissioned_tokens: HashSet::new(),
		}
	}

	pub fn with_simulator(mut self, simulator: Arc<dyn TransferSimulator>) -> Self {
		self.simulator = Some(simulator);
		self
	}

	pub fn with_permissioned_tokens(mut self, tokens: impl IntoIterator<Item = Address>) -> Self {
		self.permissioned_tokens = tokens.into_iter().collect();
		self
	}

	pub async fn validate(
		&self,
		request: &QuoteRequest,
		body: &serde_json::Value,
		endpoint: EndpointMetadata,
	) -> NormalizedQuote {
		let mut errors = Vec::new();

		let quote_id = match body.get("quoteId") {
			Some(value) => match value.as_str().and_then(|s| Uuid::from_str(s).ok()) {
				Some(quote_id) => quote_id,
				None => {
					errors.push(QuoteValidationError::InvalidField {
						field: "quoteId".to_string(),
						reason: format!("unparseable uuid: {value}"),
					});
					request.quote_id.unwrap_or_else(Uuid::new_v4)
				},
			},
			None => request.quote_id.unwrap_or_else(Uuid::new_v4),
		};

		if let Some(echoed) = body.get("requestId").and_then(|v| v.as_str()) {
			match Uuid::from_str(echoed) {
				Ok(echoed_id) if echoed_id == request.request_id => {},
				_ => errors.push(QuoteValidationError::RequestIdMismatch {
					expected: request.request_id,
					got: echoed.to_string(),
				}),
			}
		}

		self.check_token(body, "tokenIn", request.token_in, &mut errors);
		self.check_token(body, "tokenOut", request.token_out, &mut errors);

		let quoted_field = match request.side {
			TradeType::ExactInput => "amountOut",
			TradeType::ExactOutput => "amountIn",
		};
		let quoted_amount = match body.get(quoted_field) {
			Some(value) => match parse_amount(value) {
				Some(amount) => amount,
				None => {
					errors.push(QuoteValidationError::InvalidField {
						field: quoted_field.to_string(),
						reason: format!("unparseable amount: {value}"),
					});
					U256::ZERO
				},
			},
			None => {
				errors.push(QuoteValidationError::MissingField {
					field: quoted_field.to_string(),
				});
				U256::ZERO
			},
		};

		let filler = match body.get("filler") {
			Some(value) => match value.as_str().and_then(|s| Address::from_str(s).ok()) {
				Some(filler) => Some(filler),
				None => {
					errors.push(QuoteValidationError::InvalidField {
						field: "filler".to_string(),
						reason: format!("unparseable address: {value}"),
					});
					None
				},
			},
			None => None,
		};

		self.check_permissioned_legs(request, filler, &mut errors)
			.await;

		NormalizedQuote {
			response: QuoteResponse::from_request(request, quote_id, quoted_amount, filler, endpoint),
			errors,
		}
	}

	fn check_token(
		&self,
		body: &serde_json::Value,
		field: &str,
		expected: Address,
		errors: &mut Vec<QuoteValidationError>,
	) {
		let Some(value) = body.get(field) else {
			return;
		};
		match value.as_str().and_then(|s| Address::from_str(s).ok()) {
			Some(token) if token == expected => {},
			Some(token) => errors.push(QuoteValidationError::TokenMismatch {
				field: field.to_string(),
				expected: expected.to_string(),
				got: token.to_string(),
			}),
			None => errors.push(QuoteValidationError::InvalidField {
				field: field.to_string(),
				reason: format!("unparseable address: {value}"),
			}),
		}
	}

	/// Permissioned tokens can reject arbitrary senders, so both legs are
	/// simulated before the quote can win. The check only runs when the reply
	/// names a filler; without one there is no counterparty to simulate
	/// against. A missing simulator is an error; a simulator that itself
	/// fails is not, the quote passes.
	async fn check_permissioned_legs(
		&self,
		request: &QuoteRequest,
		filler: Option<Address>,
		errors: &mut Vec<QuoteValidationError>,
	) {
		let Some(counterparty) = filler else {
			return;
		};
		let legs = [
			("input", request.token_in, request.swapper, counterparty, request.amount),
			("output", request.token_out, counterparty, request.swapper, request.amount),
		];

		for (leg, token, from, to, amount) in legs {
			if !self.permissioned_tokens.contains(&token) {
				continue;
			}
			let Some(simulator) = &self.simulator else {
				errors.push(QuoteValidationError::MissingTransferSimulator {
					token: token.to_string(),
				});
				continue;
			};
			match simulator.can_transfer(token, from, to, amount).await {
				Ok(true) => {},
				Ok(false) => errors.push(QuoteValidationError::TransferSimulationFailed {
					leg: leg.to_string(),
				}),
				Err(err) => {
					warn!(token = %token, leg, error = %err, "transfer simulation unavailable");
				},
			}
		}
	}
}

impl Default for QuoteValidator {
	fn default() -> Self {
		Self::new()
	}
}

fn parse_amount(value: &serde_json::Value) -> Option<U256> {
	match value {
		serde_json::Value::String(s) => U256::from_str(s).ok(),
		serde_json::Value::Number(n) => n.as_u64().map(U256::from),
		_ => None,
	}
}
