//! Chain Client Port - Contract Handle Factory
//!
//! Hands out connected handles to the two contracts for a given access
//! intent. Missing infrastructure is a typed failure: no provider is
//! `ChainError::NoProvider`, a write request without a signer is
//! `ChainError::NoSigner`. Callers never receive a silent null.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::marketplace::MarketplaceContract;
use super::requester::RequesterContract;
use crate::error::Result;

/// What the caller intends to do with a contract handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  /// View calls only.
  Read,
  /// Transactions signed by the connected wallet.
  Write,
}

impl fmt::Display for Access {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Read => write!(f, "read"),
      Self::Write => write!(f, "write"),
    }
  }
}

/// Trait for obtaining contract handles.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
  /// Handle to the marketplace contract.
  async fn marketplace(&self, access: Access) -> Result<Arc<dyn MarketplaceContract>>;

  /// Handle to the requester contract.
  async fn requester(&self, access: Access) -> Result<Arc<dyn RequesterContract>>;

  /// Check if the underlying connection is usable.
  async fn is_healthy(&self) -> bool;
}
