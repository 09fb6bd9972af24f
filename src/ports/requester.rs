//! Requester Contract Port - Shipment Request Handshake
//!
//! The requester contract tracks, per service id, whether a shipment
//! was requested and accepted by a carrier. Its status is independent
//! of the marketplace contract's status for the same id.

use alloy::primitives::Address;
use async_trait::async_trait;

use super::marketplace::TxReceipt;
use crate::domain::service::{SecondaryStatus, ServiceId};
use crate::error::Result;

/// Trait for the requester contract.
#[async_trait]
pub trait RequesterContract: Send + Sync + 'static {
  /// Request shipment of a service.
  async fn request_service(&self, service_id: ServiceId) -> Result<TxReceipt>;

  /// Record that `transporter` accepted the shipment.
  async fn accept_service(
    &self,
    service_id: ServiceId,
    transporter: Address,
  ) -> Result<TxReceipt>;

  /// Requester-side status; unknown ids read as `NotRequested`.
  async fn service_status(&self, service_id: ServiceId) -> Result<SecondaryStatus>;
}
