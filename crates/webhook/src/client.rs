//! Outbound quote call to a single filler webhook

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use rfq_types::{WebhookConfiguration, WireQuoteRequest};

use crate::client_cache::{ClientCache, ClientConfig};

#[derive(Error, Debug)]
pub enum WebhookError {
	#[error("Webhook call timed out after {ms}ms")]
	Timeout { ms: u64 },

	#[error("Transport error: {0}")]
	Transport(#[from] reqwest::Error),

	#[error("Webhook returned status {code}")]
	Status { code: u16 },

	#[error("Webhook returned an unparseable body: {0}")]
	InvalidBody(String),
}

/// Replies that carry no quote but are not failures either. They are logged
/// and excluded from selection without tripping any error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonQuoteReason {
	/// Endpoint explicitly declined to quote
	Declined,
	/// Endpoint quoted a zero amount, a conventional pass
	ZeroAmount,
}

/// Outcome of one webhook call, before validation
#[derive(Debug)]
pub enum WebhookOutcome {
	/// Parsed JSON reply, not yet validated
	Quote(serde_json::Value),
	NonQuote(NonQuoteReason),
	Failed(WebhookError),
}

/// Posts quote requests to one configured endpoint. Cheap to construct per
/// call; the underlying HTTP client comes from the shared cache.
pub struct WebhookClient<'a> {
	webhook: &'a WebhookConfiguration,
	cache: &'a ClientCache,
	default_timeout_ms: u64,
}

impl<'a> WebhookClient<'a> {
	pub fn new(
		webhook: &'a WebhookConfiguration,
		cache: &'a ClientCache,
		default_timeout_ms: u64,
	) -> Self {
		Self {
			webhook,
			cache,
			default_timeout_ms,
		}
	}

	fn timeout(&self) -> Duration {
		Duration::from_millis(self.webhook.timeout_ms.unwrap_or(self.default_timeout_ms))
	}

	/// POST the request and classify the reply. Never panics and never
	/// returns `Err`; every failure mode collapses into `WebhookOutcome`.
	pub async fn post_quote(&self, request: &WireQuoteRequest) -> WebhookOutcome {
		let client = match self.cache.get_client(&ClientConfig::from(self.webhook)) {
			Ok(client) => client,
			Err(err) => return WebhookOutcome::Failed(err),
		};

		let timeout = self.timeout();
		let response = client
			.post(&self.webhook.endpoint)
			.timeout(timeout)
			.json(request)
			.send()
			.await;

		let response = match response {
			Ok(response) => response,
			Err(err) if err.is_timeout() => {
				warn!(
					endpoint = %self.webhook.endpoint,
					timeout_ms = timeout.as_millis() as u64,
					"webhook timed out"
				);
				return WebhookOutcome::Failed(WebhookError::Timeout {
					ms: timeout.as_millis() as u64,
				});
			},
			Err(err) => {
				warn!(endpoint = %self.webhook.endpoint, error = %err, "webhook transport error");
				return WebhookOutcome::Failed(WebhookError::Transport(err));
			},
		};

		match response.status() {
			StatusCode::NOT_FOUND => {
				debug!(endpoint = %self.webhook.endpoint, "webhook declined to quote");
				WebhookOutcome::NonQuote(NonQuoteReason::Declined)
			},
			status if !status.is_success() => {
				warn!(
					endpoint = %self.webhook.endpoint,
					status = status.as_u16(),
					"webhook returned error status"
				);
				WebhookOutcome::Failed(WebhookError::Status {
					code: status.as_u16(),
				})
			},
			_ => match response.json::<serde_json::Value>().await {
				Ok(body) => WebhookOutcome::Quote(body),
				Err(err) => {
					warn!(endpoint = %self.webhook.endpoint, error = %err, "unparseable webhook body");
					WebhookOutcome::Failed(WebhookError::InvalidBody(err.to_string()))
				},
			},
		}
	}
}
