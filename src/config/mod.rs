//! Configuration Module - TOML-based Client Configuration
//!
//! Loads and validates configuration from `config.toml`.
//! Contract addresses, RPC endpoint and the name of the environment
//! variable holding the signing key are externalized here; nothing is
//! hardcoded in the domain or usecases layers.

pub mod loader;

use serde::Deserialize;

/// Top-level configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before any chain connection is attempted.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Identity and runtime mode.
  pub app: AppSection,
  /// Chain endpoint and contract addresses.
  pub chain: ChainConfig,
  /// Wallet / signer configuration.
  #[serde(default)]
  pub wallet: WalletConfig,
  /// Transit scan scheduling.
  #[serde(default)]
  pub scan: ScanConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Identity and runtime mode.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
  /// Human-readable instance name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Emit JSON log lines instead of human-readable ones.
  #[serde(default)]
  pub json_logs: bool,
  /// Run against the in-memory simulated chain instead of RPC.
  #[serde(default)]
  pub simulate: bool,
  /// Directory for the simulated ledger and transit snapshots.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

/// Chain endpoint and contract addresses.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
  /// JSON-RPC endpoint (http, https, ws or wss).
  #[serde(default)]
  pub rpc_url: String,
  /// Expected chain id; checked at connect when set.
  pub chain_id: Option<u64>,
  /// FreteRacer marketplace contract.
  pub marketplace_address: String,
  /// Requester contract.
  pub requester_address: String,
  /// RPC requests per second across all contract calls.
  #[serde(default = "default_max_rps")]
  pub max_requests_per_second: u32,
  /// Seconds to wait for a write to be mined.
  #[serde(default = "default_tx_timeout")]
  pub tx_timeout_secs: u64,
  /// Check that both addresses hold code at connect.
  #[serde(default = "default_true")]
  pub validate_contracts: bool,
}

/// Wallet / signer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
  /// Environment variable holding the hex private key.
  #[serde(default = "default_key_env")]
  pub private_key_env: String,
}

impl Default for WalletConfig {
  fn default() -> Self {
    Self {
      private_key_env: default_key_env(),
    }
  }
}

/// Transit scan scheduling.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
  /// Seconds between transit scans in watch mode.
  #[serde(default = "default_scan_interval")]
  pub interval_secs: u64,
}

impl Default for ScanConfig {
  fn default() -> Self {
    Self {
      interval_secs: default_scan_interval(),
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_metrics_addr(),
      health_port: default_health_port(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_max_rps() -> u32 {
  10
}

fn default_tx_timeout() -> u64 {
  120
}

fn default_key_env() -> String {
  "FRETERACER_PRIVATE_KEY".to_string()
}

fn default_scan_interval() -> u64 {
  30
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
  8080
}
