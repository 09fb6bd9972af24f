//! Chain RPC Provider - alloy-rs 0.9 Connection Management
//!
//! Manages the connection to the chain hosting the marketplace and
//! requester contracts. Validates RPC connectivity (and the chain id,
//! when configured) at startup and exposes a shared provider instance
//! for all on-chain operations.
//!
//! `on_builtin` picks the transport from the URL scheme (http, ws,
//! ipc) and yields a `BoxTransport` provider, which we store type-erased
//! as `dyn Provider`. When a signer is supplied, the provider carries a
//! wallet filler and can send transactions; otherwise it is read-only.

use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::config::ChainConfig;

/// Shared RPC provider backed by alloy-rs 0.9.
///
/// All chain adapters share a single provider instance to avoid
/// redundant connections and enable connection pooling.
pub struct ChainProvider {
    /// The alloy provider (type-erased), wallet-filled if a signer exists.
    provider: Arc<dyn Provider + Send + Sync>,
    /// Address of the signing key, if any.
    signer_address: Option<Address>,
    /// Chain id reported by the node at connect.
    chain_id: u64,
}

impl ChainProvider {
    /// Connect to the RPC endpoint and validate the chain id.
    ///
    /// The URL comes from `config.toml` (never hardcoded). When
    /// `chain.chain_id` is set, a node reporting a different chain is
    /// rejected before any contract call is made.
    #[instrument(skip_all)]
    pub async fn connect(config: &ChainConfig, signer: Option<PrivateKeySigner>) -> Result<Self> {
        let signer_address = signer.as_ref().map(PrivateKeySigner::address);

        let provider: Arc<dyn Provider + Send + Sync> = match signer {
            Some(signer) => Arc::new(
                ProviderBuilder::new()
                    .with_recommended_fillers()
                    .wallet(EthereumWallet::from(signer))
                    .on_builtin(&config.rpc_url)
                    .await
                    .context("Failed to connect to RPC endpoint")?,
            ),
            None => Arc::new(
                ProviderBuilder::new()
                    .with_recommended_fillers()
                    .on_builtin(&config.rpc_url)
                    .await
                    .context("Failed to connect to RPC endpoint")?,
            ),
        };

        let chain_id = provider
            .get_chain_id()
            .await
            .context("Failed to query chain ID")?;

        if let Some(expected) = config.chain_id {
            anyhow::ensure!(
                chain_id == expected,
                "Expected chain_id={expected}, node reports {chain_id}"
            );
        }

        info!(
            chain_id,
            signer = signer_address.map(|a| a.to_string()).unwrap_or_default(),
            "Connected to RPC"
        );

        Ok(Self {
            provider,
            signer_address,
            chain_id,
        })
    }

    /// Get a shared reference to the alloy provider (type-erased).
    pub fn inner(&self) -> Arc<dyn Provider + Send + Sync> {
        Arc::clone(&self.provider)
    }

    /// Address transactions are sent from, if a signer is loaded.
    pub const fn signer_address(&self) -> Option<Address> {
        self.signer_address
    }

    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Check if the RPC connection is healthy via a lightweight call.
    pub async fn is_healthy(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }
}
