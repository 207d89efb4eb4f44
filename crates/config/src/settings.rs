//! Configuration settings structures

use rfq_types::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main application settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
	pub timeouts: TimeoutSettings,
	pub refresh: RefreshSettings,
	pub circuit_breaker: CircuitBreakerSettings,
	pub cosigner: CosignerSettings,
	pub logging: LoggingSettings,
}

/// Timeout configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TimeoutSettings {
	/// Per-webhook call timeout in milliseconds. Applied to each outbound
	/// call individually; there is no batch-wide deadline.
	pub per_webhook_ms: u64,
}

impl Default for TimeoutSettings {
	fn default() -> Self {
		Self { per_webhook_ms: 500 }
	}
}

/// Cache refresh windows for configuration pulled from the config store
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RefreshSettings {
	/// Endpoint directory TTL in seconds
	pub endpoints_ttl_secs: u64,
	/// Circuit-breaker configuration TTL in seconds
	pub circuit_breaker_ttl_secs: u64,
}

impl Default for RefreshSettings {
	fn default() -> Self {
		Self {
			endpoints_ttl_secs: 60,
			circuit_breaker_ttl_secs: 30,
		}
	}
}

/// Which eligibility policy the request path runs
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CircuitBreakerPolicy {
	/// Exponential-backoff block windows maintained by the fade-rate updater
	#[default]
	Timestamp,
	/// Flat fade-rate threshold with an on/off flag per filler
	FadeRate,
}

/// Circuit breaker configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CircuitBreakerSettings {
	pub policy: CircuitBreakerPolicy,
	/// First block window length in seconds for the timestamp policy
	pub base_block_secs: u64,
	/// Fade rate above which the rate policy disables a filler, 0..=1
	pub fade_rate_threshold: f64,
	/// How often the offline updater runs, in seconds
	pub update_interval_secs: u64,
}

impl Default for CircuitBreakerSettings {
	fn default() -> Self {
		Self {
			policy: CircuitBreakerPolicy::default(),
			base_block_secs: 1200,
			fade_rate_threshold: 0.05,
			update_interval_secs: 600,
		}
	}
}

/// Cosigner configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CosignerSettings {
	/// Hex-encoded secp256k1 private key the hard-quote path signs with
	pub private_key: SecretString,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
	pub level: String,
	pub format: LogFormat,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Pretty,
		}
	}
}

/// Log format options
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Json,
	Pretty,
	Compact,
}

/// Configuration validation errors
#[derive(Error, Debug)]
pub enum ConfigValidationError {
	#[error("Invalid timeout: {0}")]
	InvalidTimeout(String),

	#[error("Invalid circuit breaker settings: {0}")]
	InvalidCircuitBreaker(String),
}

impl Settings {
	/// Reject configurations that would silently disable the engine
	pub fn validate(&self) -> Result<(), ConfigValidationError> {
		if self.timeouts.per_webhook_ms == 0 {
			return Err(ConfigValidationError::InvalidTimeout(
				"per_webhook_ms must be positive".to_string(),
			));
		}
		if !(0.0..=1.0).contains(&self.circuit_breaker.fade_rate_threshold) {
			return Err(ConfigValidationError::InvalidCircuitBreaker(format!(
				"fade_rate_threshold {} outside 0..=1",
				self.circuit_breaker.fade_rate_threshold
			)));
		}
		if self.circuit_breaker.base_block_secs == 0 {
			return Err(ConfigValidationError::InvalidCircuitBreaker(
				"base_block_secs must be positive".to_string(),
			));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_validate() {
		assert!(Settings::default().validate().is_ok());
	}

	#[test]
	fn zero_timeout_rejected() {
		let mut settings = Settings::default();
		settings.timeouts.per_webhook_ms = 0;
		assert!(matches!(
			settings.validate(),
			Err(ConfigValidationError::InvalidTimeout(_))
		));
	}

	#[test]
	fn out_of_range_threshold_rejected() {
		let mut settings = Settings::default();
		settings.circuit_breaker.fade_rate_threshold = 1.5;
		assert!(matches!(
			settings.validate(),
			Err(ConfigValidationError::InvalidCircuitBreaker(_))
		));
	}

	#[test]
	fn partial_config_fills_defaults() {
		let json = r#"{"circuit_breaker": {"policy": "faderate"}}"#;
		let settings: Settings = serde_json::from_str(json).unwrap();
		assert_eq!(settings.circuit_breaker.policy, CircuitBreakerPolicy::FadeRate);
		assert_eq!(settings.timeouts.per_webhook_ms, 500);
		assert_eq!(settings.refresh.endpoints_ttl_secs, 60);
	}
}
