//! Requester Operations - Shipment Request Handshake
//!
//! Thin wrappers over the requester contract. The handshake runs
//! alongside the marketplace lifecycle; see `domain::reconcile` for how
//! the two are joined.

use std::sync::Arc;

use alloy::primitives::Address;
use tracing::{info, instrument};

use crate::domain::service::{SecondaryStatus, ServiceId};
use crate::error::Result;
use crate::ports::chain_client::{Access, ChainClient};
use crate::ports::marketplace::TxReceipt;

pub struct RequesterOperations<C: ChainClient + ?Sized> {
  chain: Arc<C>,
}

impl<C: ChainClient + ?Sized> RequesterOperations<C> {
  pub fn new(chain: Arc<C>) -> Self {
    Self { chain }
  }

  #[instrument(skip(self))]
  pub async fn request_service(&self, service_id: ServiceId) -> Result<TxReceipt> {
    let requester = self.chain.requester(Access::Write).await?;
    let receipt = requester.request_service(service_id).await?;
    info!(service_id, tx = %receipt.tx_hash, "Shipment requested");
    Ok(receipt)
  }

  #[instrument(skip(self), fields(transporter = %transporter))]
  pub async fn accept_service(
    &self,
    service_id: ServiceId,
    transporter: Address,
  ) -> Result<TxReceipt> {
    let requester = self.chain.requester(Access::Write).await?;
    let receipt = requester.accept_service(service_id, transporter).await?;
    info!(service_id, tx = %receipt.tx_hash, "Shipment accepted by transporter");
    Ok(receipt)
  }

  #[instrument(skip(self))]
  pub async fn service_status(&self, service_id: ServiceId) -> Result<SecondaryStatus> {
    let requester = self.chain.requester(Access::Read).await?;
    requester.service_status(service_id).await
  }
}
