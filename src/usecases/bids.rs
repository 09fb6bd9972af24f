//! Bid Operations - Offers on a Single Service
//!
//! Places, lists and accepts bids. Writes are checked against the
//! current on-chain state first so that obviously invalid calls fail
//! locally with a precise error instead of a bare revert:
//!
//! - bids only while the service is Available or InProgress
//! - bid amounts must be positive
//! - accept only an existing bid, and only if none was accepted yet

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tracing::{info, instrument, warn};

use crate::domain::service::{Bid, ServiceId};
use crate::error::{ChainError, Result};
use crate::ports::chain_client::{Access, ChainClient};
use crate::ports::marketplace::TxReceipt;

/// Bid lifecycle against the marketplace contract.
pub struct BidOperations<C: ChainClient + ?Sized> {
  chain: Arc<C>,
}

impl<C: ChainClient + ?Sized> BidOperations<C> {
  pub fn new(chain: Arc<C>) -> Self {
    Self { chain }
  }

  /// Bid `amount` on a service as the connected wallet.
  #[instrument(skip(self), fields(amount = %amount))]
  pub async fn place_bid(&self, service_id: ServiceId, amount: U256) -> Result<TxReceipt> {
    if amount.is_zero() {
      return Err(ChainError::InvalidInput("bid amount must be positive".to_string()));
    }

    let market = self.chain.marketplace(Access::Write).await?;

    let service = market.get_service(service_id).await?;
    if !service.status.accepts_bids() {
      warn!(service_id, status = %service.status, "Service no longer accepts bids");
      return Err(ChainError::InvalidState {
        service_id,
        status: service.status,
        operation: "place a bid",
      });
    }

    let receipt = market.place_bid(service_id, amount).await?;
    info!(service_id, tx = %receipt.tx_hash, "Bid placed");
    Ok(receipt)
  }

  /// All bids on a service.
  #[instrument(skip(self))]
  pub async fn get_bids(&self, service_id: ServiceId) -> Result<Vec<Bid>> {
    let market = self.chain.marketplace(Access::Read).await?;
    market.get_bids(service_id).await
  }

  /// Accept `bidder`'s bid on a service.
  ///
  /// # Errors
  /// - `ChainError::BidNotFound` if `bidder` never bid on the service
  /// - `ChainError::BidAlreadyAccepted` if any bid was accepted already
  #[instrument(skip(self), fields(bidder = %bidder))]
  pub async fn accept_bid(&self, service_id: ServiceId, bidder: Address) -> Result<TxReceipt> {
    let market = self.chain.marketplace(Access::Write).await?;

    let bids = market.get_bids(service_id).await?;
    if bids.iter().any(|b| b.accepted) {
      return Err(ChainError::BidAlreadyAccepted(service_id));
    }
    if !bids.iter().any(|b| b.bidder == bidder) {
      return Err(ChainError::BidNotFound { service_id, bidder });
    }

    let receipt = market.accept_bid(service_id, bidder).await?;
    info!(service_id, tx = %receipt.tx_hash, "Bid accepted");
    Ok(receipt)
  }
}
