//! Wallet Provider Port - Account Connection Facts
//!
//! The core only consumes "current account" and "is connected", plus
//! notifications when the account or chain changes.

use alloy::primitives::Address;
use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::Result;

/// Trait for wallet providers.
#[async_trait]
pub trait WalletProvider: Send + Sync + 'static {
  /// Ask the wallet to connect and expose its accounts.
  ///
  /// # Errors
  /// `ChainError::NoSigner` when no wallet is present or the
  /// connection is refused.
  async fn request_accounts(&self) -> Result<Vec<Address>>;

  /// Accounts exposed without prompting (empty when not connected).
  async fn accounts(&self) -> Vec<Address>;

  /// Chain id the wallet is connected to.
  async fn chain_id(&self) -> Result<u64>;

  /// Receive the active account whenever it changes.
  fn subscribe_accounts(&self) -> watch::Receiver<Option<Address>>;

  /// Receive the chain id whenever it changes.
  fn subscribe_chain(&self) -> watch::Receiver<Option<u64>>;

  /// First exposed account, if connected.
  async fn current_account(&self) -> Option<Address> {
    self.accounts().await.first().copied()
  }

  /// Whether at least one account is exposed.
  async fn is_connected(&self) -> bool {
    !self.accounts().await.is_empty()
  }
}
