//! Marketplace Contract Port - Services and Bids
//!
//! Defines the trait for the FreteRacer marketplace contract: service
//! creation and lookup, bidding, and status updates. Writes resolve
//! only once the transaction is confirmed.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde::Serialize;

use crate::domain::service::{Bid, NewService, Service, ServiceId, ServiceStatus};
use crate::error::Result;

/// Confirmation of an on-chain write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
  /// Transaction hash (0x-prefixed hex).
  pub tx_hash: String,
  /// Block the transaction was mined in.
  pub block_number: Option<u64>,
}

/// Trait for the marketplace contract.
///
/// Implementors hold either a read-only or a signer-backed connection;
/// write methods on a read-only handle fail with `ChainError::NoSigner`.
#[async_trait]
pub trait MarketplaceContract: Send + Sync + 'static {
  /// Create a service; the sender becomes its client.
  async fn create_service(&self, service: &NewService) -> Result<TxReceipt>;

  /// Place a bid on a service as the sender.
  async fn place_bid(&self, service_id: ServiceId, amount: U256) -> Result<TxReceipt>;

  /// Accept `bidder`'s bid on a service.
  async fn accept_bid(&self, service_id: ServiceId, bidder: Address) -> Result<TxReceipt>;

  /// Move a service to a new status.
  async fn update_service_status(
    &self,
    service_id: ServiceId,
    status: ServiceStatus,
  ) -> Result<TxReceipt>;

  /// Load one service by id.
  async fn get_service(&self, service_id: ServiceId) -> Result<Service>;

  /// Total number of services ever created.
  async fn services_count(&self) -> Result<u64>;

  /// All bids on a service, in submission order.
  async fn get_bids(&self, service_id: ServiceId) -> Result<Vec<Bid>>;
}
