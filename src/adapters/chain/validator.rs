//! Contract Validator - On-chain Verification at Startup
//!
//! Validates that the configured marketplace and requester addresses
//! point to deployed contracts: code must exist at the address (not an
//! EOA, not a typo). Configuration errors then fail at connect instead
//! of surfacing later as empty reads.

use std::sync::Arc;

use alloy::primitives::Address;
use alloy::providers::Provider;
use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

/// Result of validating a single contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Contract name for logging.
    pub name: &'static str,
    /// Address that was validated.
    pub address: Address,
    /// Whether the contract has deployed code.
    pub has_code: bool,
}

/// Validates contract addresses against on-chain state.
pub struct ContractValidator {
    /// Alloy provider for on-chain queries.
    provider: Arc<dyn Provider + Send + Sync>,
}

impl ContractValidator {
    /// Create a new validator with the given provider.
    pub fn new(provider: Arc<dyn Provider + Send + Sync>) -> Self {
        Self { provider }
    }

    /// Validate every named contract.
    ///
    /// Fails if any address has no code.
    #[instrument(skip_all, fields(count = contracts.len()))]
    pub async fn validate_all(
        &self,
        contracts: &[(&'static str, Address)],
    ) -> Result<Vec<ValidationResult>> {
        let mut results = Vec::with_capacity(contracts.len());

        for &(name, address) in contracts {
            let code = self
                .provider
                .get_code_at(address)
                .await
                .with_context(|| format!("Failed to query code for {name}"))?;

            let has_code = !code.is_empty();
            if has_code {
                info!(contract = name, %address, "Contract validated: code exists on-chain");
            } else {
                warn!(contract = name, %address, "Contract has no code, check config.toml");
            }

            results.push(ValidationResult {
                name,
                address,
                has_code,
            });
        }

        if let Some(missing) = results.iter().find(|r| !r.has_code) {
            anyhow::bail!(
                "{} at {} has no deployed code, cannot proceed",
                missing.name,
                missing.address
            );
        }

        Ok(results)
    }
}
