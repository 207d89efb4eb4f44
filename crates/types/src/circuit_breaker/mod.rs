//! Circuit breaker state rows and status classification
//!
//! Two state shapes coexist on purpose: the timestamp rows drive the
//! exponential-backoff policy, the configuration rows drive the older
//! rate-threshold policy. They are separate, selectable strategies.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::webhooks::WebhookConfiguration;

/// Per-filler blocking state, written only by the offline fade-rate updater
/// and read by the request-time eligibility filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FillerTimestampRow {
	/// Stable filler hash (see `WebhookConfiguration::hash`)
	pub hash: String,
	/// Newest order post timestamp already accounted for, unix seconds
	pub last_post_timestamp: i64,
	/// Filler is ineligible until this unix timestamp
	pub block_until_timestamp: i64,
	/// Consecutive fade-triggered blocking periods, drives exponential backoff
	pub consecutive_blocks: u32,
}

impl FillerTimestampRow {
	/// Fresh row for a filler with no history
	pub fn new(hash: String) -> Self {
		Self {
			hash,
			last_post_timestamp: 0,
			block_until_timestamp: 0,
			consecutive_blocks: 0,
		}
	}

	pub fn is_blocked(&self, now: i64) -> bool {
		self.block_until_timestamp > now
	}
}

/// Older, coarser eligibility representation: a flat fade rate and an on/off
/// switch, not keyed by time windows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CircuitBreakerConfiguration {
	pub hash: String,
	/// Faded quotes over total quotes in the rolling window, 0..=1
	pub fade_rate: f64,
	pub enabled: bool,
}

/// An endpoint filtered out by the circuit breaker, with the block horizon
/// when the timestamp policy produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct DisabledEndpoint {
	pub webhook: WebhookConfiguration,
	pub block_until: Option<DateTime<Utc>>,
}

/// Classification of a candidate endpoint list into eligible and blocked sets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointStatuses {
	pub enabled: Vec<WebhookConfiguration>,
	pub disabled: Vec<DisabledEndpoint>,
}

impl DisabledEndpoint {
	pub fn new(webhook: WebhookConfiguration, block_until_timestamp: Option<i64>) -> Self {
		Self {
			webhook,
			block_until: block_until_timestamp.and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fresh_row_is_never_blocked() {
		let row = FillerTimestampRow::new("0xabc".to_string());
		assert!(!row.is_blocked(0));
		assert!(!row.is_blocked(1_700_000_000));
	}

	#[test]
	fn block_boundary_is_exclusive() {
		let now = 1_700_000_000;
		let mut row = FillerTimestampRow::new("0xabc".to_string());

		row.block_until_timestamp = now - 1;
		assert!(!row.is_blocked(now));

		row.block_until_timestamp = now;
		assert!(!row.is_blocked(now));

		row.block_until_timestamp = now + 1;
		assert!(row.is_blocked(now));
	}

	#[test]
	fn timestamp_row_serialization_round_trip() {
		let row = FillerTimestampRow {
			hash: "0xdeadbeef".to_string(),
			last_post_timestamp: 100,
			block_until_timestamp: 200,
			consecutive_blocks: 3,
		};

		let json = serde_json::to_string(&row).unwrap();
		let back: FillerTimestampRow = serde_json::from_str(&json).unwrap();
		assert_eq!(back, row);
	}
}
