//! Chain Adapters - Contract Interaction Layer
//!
//! Provides on-chain access via alloy-rs 0.9 for:
//! - RPC provider management and chain id checks
//! - Marketplace and requester contract bindings (`sol!`)
//! - Contract code validation at startup
//! - The `ChainClient` gateway handing out read/write handles

pub mod contracts;
pub mod gateway;
pub mod provider;
pub mod validator;

pub use contracts::{AlloyMarketplace, AlloyRequester, RpcCaller};
pub use gateway::{AlloyChainClient, OfflineChainClient};
pub use provider::ChainProvider;
pub use validator::ContractValidator;
