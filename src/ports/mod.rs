//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ChainClient`: read/write contract handle factory
//! - `MarketplaceContract`: services and bids
//! - `RequesterContract`: shipment request handshake
//! - `WalletProvider`: connected account facts

pub mod chain_client;
pub mod marketplace;
pub mod requester;
pub mod wallet;

pub use chain_client::{Access, ChainClient};
pub use marketplace::{MarketplaceContract, TxReceipt};
pub use requester::RequesterContract;
pub use wallet::WalletProvider;
