//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    simulate = config.app.simulate,
    chain_id = ?config.chain.chain_id,
    marketplace = %config.chain.marketplace_address,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Parseable contract addresses
/// - An RPC URL unless running simulated
/// - Positive rate limit, timeout and scan interval
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(!config.app.name.is_empty(), "app.name must not be empty");

  for (name, value) in [
    ("marketplace_address", &config.chain.marketplace_address),
    ("requester_address", &config.chain.requester_address),
  ] {
    value
      .parse::<Address>()
      .with_context(|| format!("chain.{name} is not a valid address: {value}"))?;
  }

  if !config.app.simulate {
    anyhow::ensure!(
      !config.chain.rpc_url.is_empty(),
      "chain.rpc_url must be set unless app.simulate = true"
    );
  }

  anyhow::ensure!(
    config.chain.max_requests_per_second > 0,
    "chain.max_requests_per_second must be positive"
  );
  anyhow::ensure!(
    config.chain.tx_timeout_secs > 0,
    "chain.tx_timeout_secs must be positive"
  );
  anyhow::ensure!(
    config.scan.interval_secs > 0,
    "scan.interval_secs must be positive"
  );
  anyhow::ensure!(
    !config.wallet.private_key_env.is_empty(),
    "wallet.private_key_env must not be empty"
  );

  Ok(())
}
