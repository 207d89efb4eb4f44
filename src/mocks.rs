//! Canned fixtures for tests and local experimentation

use alloy::primitives::{address, Address, U256};
use uuid::Uuid;

use rfq_types::{QuoteRequest, TradeType, WebhookConfiguration};

pub const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const SWAPPER: Address = address!("742d35Cc6675C88b1C6e3c0c61b2e9a3D0C3F123");

/// One-ETH-sized exact-input USDC->WETH request on mainnet
pub fn quote_request() -> QuoteRequest {
	QuoteRequest::new(
		Uuid::new_v4(),
		USDC,
		WETH,
		1,
		1,
		U256::from(1_000_000_000u64),
		TradeType::ExactInput,
		SWAPPER,
		1,
	)
	.expect("static request is valid")
}

/// Webhook pointing at `url`, named after the filler
pub fn webhook(name: &str, url: impl Into<String>) -> WebhookConfiguration {
	WebhookConfiguration::new(name, url)
}
