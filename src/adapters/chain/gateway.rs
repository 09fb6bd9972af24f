//! Alloy Chain Client - Contract Handle Factory over RPC
//!
//! Implements the `ChainClient` port. Read handles are always available
//! once connected; write handles require a signer loaded at connect.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::Context;
use async_trait::async_trait;
use tracing::{info, instrument};

use crate::adapters::metrics::MetricsRegistry;
use crate::config::ChainConfig;
use crate::error::{ChainError, Result};
use crate::ports::chain_client::{Access, ChainClient};
use crate::ports::marketplace::MarketplaceContract;
use crate::ports::requester::RequesterContract;

use super::contracts::{AlloyMarketplace, AlloyRequester, RpcCaller};
use super::provider::ChainProvider;
use super::validator::ContractValidator;

/// `ChainClient` backed by a live RPC endpoint.
pub struct AlloyChainClient {
    provider: ChainProvider,
    marketplace: Arc<AlloyMarketplace>,
    requester: Arc<AlloyRequester>,
}

impl AlloyChainClient {
    /// Connect, validate the deployment and build both bindings.
    ///
    /// `signer` is `None` for read-only use; write handles then fail
    /// with `ChainError::NoSigner`.
    #[instrument(skip_all)]
    pub async fn connect(
        config: &ChainConfig,
        signer: Option<PrivateKeySigner>,
        metrics: Option<Arc<MetricsRegistry>>,
    ) -> anyhow::Result<Self> {
        let marketplace_address: Address = config
            .marketplace_address
            .parse()
            .context("Invalid marketplace address")?;
        let requester_address: Address = config
            .requester_address
            .parse()
            .context("Invalid requester address")?;

        let provider = ChainProvider::connect(config, signer).await?;

        if config.validate_contracts {
            ContractValidator::new(provider.inner())
                .validate_all(&[
                    ("FreteRacer marketplace", marketplace_address),
                    ("Solicitante requester", requester_address),
                ])
                .await?;
        }

        let rps = NonZeroU32::new(config.max_requests_per_second)
            .context("max_requests_per_second must be > 0")?;
        let mut caller = RpcCaller::new(
            provider.inner(),
            provider.signer_address(),
            rps,
            Duration::from_secs(config.tx_timeout_secs),
        );
        if let Some(metrics) = metrics {
            caller = caller.with_metrics(metrics);
        }
        let caller = Arc::new(caller);

        info!(
            marketplace = %marketplace_address,
            requester = %requester_address,
            writable = caller.has_signer(),
            "Contract bindings ready"
        );

        Ok(Self {
            marketplace: Arc::new(AlloyMarketplace::new(Arc::clone(&caller), marketplace_address)),
            requester: Arc::new(AlloyRequester::new(caller, requester_address)),
            provider,
        })
    }

    fn check_access(&self, access: Access) -> Result<()> {
        if access == Access::Write && self.provider.signer_address().is_none() {
            return Err(ChainError::NoSigner);
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn marketplace(&self, access: Access) -> Result<Arc<dyn MarketplaceContract>> {
        self.check_access(access)?;
        Ok(Arc::clone(&self.marketplace) as Arc<dyn MarketplaceContract>)
    }

    async fn requester(&self, access: Access) -> Result<Arc<dyn RequesterContract>> {
        self.check_access(access)?;
        Ok(Arc::clone(&self.requester) as Arc<dyn RequesterContract>)
    }

    async fn is_healthy(&self) -> bool {
        self.provider.is_healthy().await
    }
}

/// `ChainClient` used when no RPC endpoint could be reached.
///
/// Every handle request fails with `ChainError::NoProvider`, so
/// callers see a typed failure instead of a missing client.
pub struct OfflineChainClient {
    reason: String,
}

impl OfflineChainClient {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ChainClient for OfflineChainClient {
    async fn marketplace(&self, _access: Access) -> Result<Arc<dyn MarketplaceContract>> {
        Err(ChainError::NoProvider(self.reason.clone()))
    }

    async fn requester(&self, _access: Access) -> Result<Arc<dyn RequesterContract>> {
        Err(ChainError::NoProvider(self.reason.clone()))
    }

    async fn is_healthy(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_client_reports_no_provider() {
        let client = OfflineChainClient::new("connection refused");

        let err = client.marketplace(Access::Read).await.err().unwrap();
        assert_eq!(err, ChainError::NoProvider("connection refused".to_string()));
        assert!(client.requester(Access::Write).await.is_err());
        assert!(!client.is_healthy().await);
    }
}
