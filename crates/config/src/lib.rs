//! RFQ Configuration
//!
//! Settings structures, file/env loading and tracing setup for the RFQ
//! aggregation engine.

pub mod loader;
pub mod settings;
pub mod tracing_setup;

pub use loader::{load_config, ConfigLoadError};
pub use settings::{
	CircuitBreakerPolicy, CircuitBreakerSettings, ConfigValidationError, CosignerSettings,
	LogFormat, LoggingSettings, RefreshSettings, Settings, TimeoutSettings,
};
pub use tracing_setup::init_tracing;
