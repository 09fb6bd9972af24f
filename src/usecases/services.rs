//! Service Repository - Marketplace Service Records
//!
//! Loads services from the marketplace contract by sequential index
//! and submits the service-level writes (creation, status updates).
//!
//! `get_all_services` is one round trip per service. That is fine for
//! a marketplace with tens of services; beyond that it needs an
//! event-indexed or batched (multicall) read.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::domain::service::{NewService, Service, ServiceId, ServiceStatus};
use crate::error::{ChainError, Result};
use crate::ports::chain_client::{Access, ChainClient};
use crate::ports::marketplace::TxReceipt;

/// Reads and writes service records.
pub struct ServiceRepository<C: ChainClient + ?Sized> {
  chain: Arc<C>,
}

impl<C: ChainClient + ?Sized> ServiceRepository<C> {
  pub fn new(chain: Arc<C>) -> Self {
    Self { chain }
  }

  /// Load one service.
  ///
  /// # Errors
  /// `ChainError::NotFound` (or the provider's revert) for ids at or
  /// beyond the service count.
  #[instrument(skip(self))]
  pub async fn get_service(&self, service_id: ServiceId) -> Result<Service> {
    let market = self.chain.marketplace(Access::Read).await?;
    market.get_service(service_id).await
  }

  /// Snapshot of every service, ascending by id.
  ///
  /// Reads the count once, then ids `0..count` in order. Services
  /// created during the scan are not included; call again to refresh.
  #[instrument(skip(self))]
  pub async fn get_all_services(&self) -> Result<Vec<Service>> {
    let market = self.chain.marketplace(Access::Read).await?;
    let count = market.services_count().await?;

    let mut services = Vec::new();
    for id in 0..count {
      services.push(market.get_service(id).await?);
    }

    debug!(count, "Loaded all services");
    Ok(services)
  }

  /// Create a service as the connected wallet.
  #[instrument(skip(self, input), fields(origin = %input.origin, destination = %input.destination))]
  pub async fn create_service(&self, input: &NewService) -> Result<TxReceipt> {
    input.validate().map_err(ChainError::InvalidInput)?;

    let market = self.chain.marketplace(Access::Write).await?;
    let receipt = market.create_service(input).await?;

    info!(tx = %receipt.tx_hash, "Service created");
    Ok(receipt)
  }

  /// Move a service to `status`.
  ///
  /// Lifecycle rules are enforced by the contract, not here.
  #[instrument(skip(self))]
  pub async fn update_service_status(
    &self,
    service_id: ServiceId,
    status: ServiceStatus,
  ) -> Result<TxReceipt> {
    let market = self.chain.marketplace(Access::Write).await?;
    let receipt = market.update_service_status(service_id, status).await?;

    info!(service_id, %status, tx = %receipt.tx_hash, "Service status updated");
    Ok(receipt)
  }
}
