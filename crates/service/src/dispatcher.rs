//! Quote fan-out to filler webhooks

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use rfq_types::{QuoteRequest, StorageResult};
use rfq_webhook::{ClientCache, NonQuoteReason, WebhookClient, WebhookOutcome};

use crate::circuit_breaker::CircuitBreaker;
use crate::compliance::ComplianceFilter;
use crate::endpoint_directory::EndpointDirectory;
use crate::validator::{NormalizedQuote, QuoteValidator};

enum DispatchOutcome {
	Quote(NormalizedQuote),
	Pass,
	Failure,
}

/// Fans a request out to every eligible endpoint concurrently and collects
/// the normalized replies.
///
/// Each endpoint runs in its own task with its own timeout; one slow,
/// crashing or misbehaving filler cannot take down the batch or delay the
/// others beyond its own deadline.
pub struct QuoteDispatcher {
	directory: Arc<EndpointDirectory>,
	circuit_breaker: Arc<dyn CircuitBreaker>,
	compliance: Arc<ComplianceFilter>,
	validator: Arc<QuoteValidator>,
	client_cache: ClientCache,
	default_timeout_ms: u64,
}

impl QuoteDispatcher {
	pub fn new(
		directory: Arc<EndpointDirectory>,
		circuit_breaker: Arc<dyn CircuitBreaker>,
		compliance: Arc<ComplianceFilter>,
		validator: Arc<QuoteValidator>,
		client_cache: ClientCache,
		default_timeout_ms: u64,
	) -> Self {
		Self {
			directory,
			circuit_breaker,
			compliance,
			validator,
			client_cache,
			default_timeout_ms,
		}
	}

	pub async fn dispatch(&self, request: &QuoteRequest) -> StorageResult<Vec<NormalizedQuote>> {
		let candidates = self.directory.endpoints_for_chain(request.chain_id()).await?;

		let statuses = self.circuit_breaker.classify(candidates).await;
		if !statuses.disabled.is_empty() {
			info!(
				request_id = %request.request_id,
				blocked = statuses.disabled.len(),
				"fillers blocked by circuit breaker"
			);
		}

		let permitted = self
			.compliance
			.screen(statuses.enabled, request.swapper)
			.await;

		debug!(
			request_id = %request.request_id,
			fanout = permitted.len(),
			"dispatching quote request"
		);

		let wire = request.to_wire();
		let tasks = permitted.into_iter().map(|webhook| {
			let wire = wire.clone();
			let request = request.clone();
			let cache = self.client_cache.clone();
			let validator = Arc::clone(&self.validator);
			let timeout_ms = self.default_timeout_ms;

			tokio::spawn(async move {
				let client = WebhookClient::new(&webhook, &cache, timeout_ms);
				let endpoint = rfq_types::EndpointMetadata {
					endpoint_url: webhook.endpoint.clone(),
					filler_name: webhook.name.clone(),
				};

				match client.post_quote(&wire).await {
					WebhookOutcome::Quote(body) => {
						let normalized = validator.validate(&request, &body, endpoint).await;
						if normalized.is_valid()
							&& normalized.response.quoted_amount(request.side).is_zero()
						{
							debug!(
								filler = %webhook.name,
								reason = ?NonQuoteReason::ZeroAmount,
								"filler passed on request"
							);
							return DispatchOutcome::Pass;
						}
						DispatchOutcome::Quote(normalized)
					},
					WebhookOutcome::NonQuote(reason) => {
						debug!(filler = %webhook.name, ?reason, "filler passed on request");
						DispatchOutcome::Pass
					},
					WebhookOutcome::Failed(err) => {
						warn!(filler = %webhook.name, error = %err, "webhook call failed");
						DispatchOutcome::Failure
					},
				}
			})
		});

		let mut results = Vec::new();
		let (mut passes, mut failures) = (0usize, 0usize);
		for joined in join_all(tasks).await {
			match joined {
				Ok(DispatchOutcome::Quote(normalized)) => results.push(normalized),
				Ok(DispatchOutcome::Pass) => passes += 1,
				Ok(DispatchOutcome::Failure) => failures += 1,
				Err(err) => {
					warn!(error = %err, "webhook task panicked");
					failures += 1;
				},
			}
		}

		info!(
			request_id = %request.request_id,
			quotes = results.len(),
			passes,
			failures,
			"aggregation pass complete"
		);
		Ok(results)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::{Address, U256};
	use httpmock::prelude::*;
	use rfq_storage::{MemoryConfigStore, MemoryKvStore};
	use rfq_types::{TradeType, WebhookConfiguration};
	use serde_json::json;
	use std::time::Duration;
	use uuid::Uuid;

	use crate::circuit_breaker::TimestampCircuitBreaker;

	fn dispatcher(store: MemoryConfigStore) -> QuoteDispatcher {
		let store = Arc::new(store);
		QuoteDispatcher::new(
			Arc::new(EndpointDirectory::new(store.clone(), Duration::from_secs(60))),
			Arc::new(TimestampCircuitBreaker::new(
				Arc::new(MemoryKvStore::new()),
				Duration::from_secs(30),
			)),
			Arc::new(ComplianceFilter::new(store, Duration::from_secs(60))),
			Arc::new(QuoteValidator::new()),
			ClientCache::new(),
			500,
		)
	}

	fn request() -> QuoteRequest {
		QuoteRequest::new(
			Uuid::new_v4(),
			Address::ZERO,
			Address::ZERO,
			1,
			1,
			U256::from(1_000u64),
			TradeType::ExactInput,
			Address::ZERO,
			1,
		)
		.unwrap()
	}

	#[tokio::test]
	async fn collects_valid_quotes_from_fanout() {
		let server = MockServer::start_async().await;
		server
			.mock_async(|when, then| {
				when.method(POST).path("/a");
				then.status(200).json_body(json!({"amountOut": "2000"}));
			})
			.await;
		server
			.mock_async(|when, then| {
				when.method(POST).path("/b");
				then.status(200).json_body(json!({"amountOut": "3000"}));
			})
			.await;

		let store = MemoryConfigStore::with_endpoints(vec![
			WebhookConfiguration::new("a", server.url("/a")),
			WebhookConfiguration::new("b", server.url("/b")),
		]);

		let quotes = dispatcher(store).dispatch(&request()).await.unwrap();
		assert_eq!(quotes.len(), 2);
	}

	#[tokio::test]
	async fn one_broken_endpoint_does_not_sink_the_batch() {
		let server = MockServer::start_async().await;
		server
			.mock_async(|when, then| {
				when.method(POST).path("/good");
				then.status(200).json_body(json!({"amountOut": "2000"}));
			})
			.await;
		server
			.mock_async(|when, then| {
				when.method(POST).path("/broken");
				then.status(500);
			})
			.await;

		let store = MemoryConfigStore::with_endpoints(vec![
			WebhookConfiguration::new("good", server.url("/good")),
			WebhookConfiguration::new("broken", server.url("/broken")),
		]);

		let quotes = dispatcher(store).dispatch(&request()).await.unwrap();
		assert_eq!(quotes.len(), 1);
		assert_eq!(quotes[0].response.endpoint.filler_name, "good");
	}

	#[tokio::test]
	async fn zero_amount_reply_is_excluded() {
		let server = MockServer::start_async().await;
		server
			.mock_async(|when, then| {
				when.method(POST).path("/zero");
				then.status(200).json_body(json!({"amountOut": "0"}));
			})
			.await;

		let store = MemoryConfigStore::with_endpoints(vec![WebhookConfiguration::new(
			"zero",
			server.url("/zero"),
		)]);

		let quotes = dispatcher(store).dispatch(&request()).await.unwrap();
		assert!(quotes.is_empty());
	}

	#[tokio::test]
	async fn circuit_breaker_gates_the_fanout() {
		use crate::circuit_breaker::MockCircuitBreaker;
		use rfq_types::{DisabledEndpoint, EndpointStatuses};

		let server = MockServer::start_async().await;
		let mock = server
			.mock_async(|when, then| {
				when.method(POST).path("/blocked");
				then.status(200).json_body(json!({"amountOut": "9000"}));
			})
			.await;

		let mut breaker = MockCircuitBreaker::new();
		breaker.expect_classify().returning(|candidates| EndpointStatuses {
			enabled: Vec::new(),
			disabled: candidates
				.into_iter()
				.map(|webhook| DisabledEndpoint::new(webhook, None))
				.collect(),
		});

		let store = Arc::new(MemoryConfigStore::with_endpoints(vec![
			WebhookConfiguration::new("blocked", server.url("/blocked")),
		]));
		let dispatcher = QuoteDispatcher::new(
			Arc::new(EndpointDirectory::new(store.clone(), Duration::from_secs(60))),
			Arc::new(breaker),
			Arc::new(ComplianceFilter::new(store, Duration::from_secs(60))),
			Arc::new(QuoteValidator::new()),
			ClientCache::new(),
			500,
		);

		let quotes = dispatcher.dispatch(&request()).await.unwrap();
		assert!(quotes.is_empty());
		mock.assert_hits_async(0).await;
	}

	#[tokio::test]
	async fn wrong_chain_endpoint_never_gets_called() {
		let server = MockServer::start_async().await;
		let mock = server
			.mock_async(|when, then| {
				when.method(POST).path("/polygon");
				then.status(200).json_body(json!({"amountOut": "9000"}));
			})
			.await;

		let store = MemoryConfigStore::with_endpoints(vec![WebhookConfiguration::new(
			"polygon-only",
			server.url("/polygon"),
		)
		.with_chain_ids(vec![137])]);

		let quotes = dispatcher(store).dispatch(&request()).await.unwrap();
		assert!(quotes.is_empty());
		mock.assert_hits_async(0).await;
	}
}
