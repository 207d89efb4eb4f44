//! Tracing subscriber initialization

use crate::settings::{LogFormat, LoggingSettings};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(logging: &LoggingSettings) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(logging.level.clone()));

	let builder = tracing_subscriber::fmt().with_env_filter(filter);

	let result = match logging.format {
		LogFormat::Json => builder.json().try_init(),
		LogFormat::Pretty => builder.pretty().try_init(),
		LogFormat::Compact => builder.compact().try_init(),
	};

	if result.is_err() {
		tracing::debug!("tracing subscriber already installed");
	}
}
