//! Configuration loading utilities

use crate::settings::{ConfigValidationError, Settings};
use config::{Config, ConfigError, Environment, File};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigLoadError {
	#[error("Configuration parse error: {0}")]
	Parse(#[from] ConfigError),

	#[error("Configuration validation error: {0}")]
	Validation(#[from] ConfigValidationError),
}

/// Load settings from `config/config.{toml,json,yaml}` with `RFQ__`-prefixed
/// environment overrides (e.g. `RFQ__COSIGNER__PRIVATE_KEY`). Missing file
/// means all defaults.
pub fn load_config() -> Result<Settings, ConfigLoadError> {
	let source = Config::builder()
		.add_source(File::with_name("config/config").required(false))
		.add_source(Environment::with_prefix("RFQ").separator("__"))
		.build()?;

	let settings: Settings = source.try_deserialize()?;
	settings.validate()?;
	Ok(settings)
}
