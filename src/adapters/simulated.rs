//! Simulated Chain - In-memory Marketplace and Requester Contracts
//!
//! Runs both contracts in process for `simulate = true` and tests.
//! The marketplace rules are enforced the way the deployed contract
//! enforces them, so a rejected call surfaces as `ChainError::Reverted`
//! with the reason string:
//!
//! - bids only while Available or InProgress, with a positive amount
//! - only the client accepts, only an existing bid, at most one accepted
//! - accepting moves the service to InProgress and records the carrier
//! - status updates follow the lifecycle; terminal states are final
//!
//! The whole ledger is serializable so the CLI can persist it between
//! invocations.

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy::primitives::{Address, U256, keccak256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::service::{
    Bid, NewService, SecondaryStatus, Service, ServiceId, ServiceStatus,
};
use crate::error::{ChainError, Result};
use crate::ports::chain_client::{Access, ChainClient};
use crate::ports::marketplace::{MarketplaceContract, TxReceipt};
use crate::ports::requester::RequesterContract;

/// Requester-side record for one service id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub status: SecondaryStatus,
    pub transporter: Option<Address>,
}

/// Complete state of both simulated contracts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// Services indexed by id.
    pub services: Vec<Service>,
    /// Bids per service, in submission order.
    pub bids: BTreeMap<ServiceId, Vec<Bid>>,
    /// Requester contract state per service id.
    pub requests: BTreeMap<ServiceId, RequestRecord>,
    /// Last mined block.
    pub block_number: u64,
}

impl Ledger {
    fn service_mut(&mut self, service_id: ServiceId) -> Result<&mut Service> {
        usize::try_from(service_id)
            .ok()
            .and_then(|idx| self.services.get_mut(idx))
            .ok_or_else(|| ChainError::Reverted("service does not exist".to_string()))
    }

    fn push_service(
        &mut self,
        client: Address,
        input: &NewService,
        status: ServiceStatus,
    ) -> ServiceId {
        let id = self.services.len() as ServiceId;
        self.services.push(Service {
            id,
            client,
            transporter: None,
            origin: input.origin.clone(),
            destination: input.destination.clone(),
            cargo_type: input.cargo_type.clone(),
            weight: input.weight,
            volume: input.volume,
            pickup_date: input.pickup_date,
            status,
            accepted_bid_amount: U256::ZERO,
        });
        id
    }

    fn mine(&mut self, method: &str, sender: Address) -> TxReceipt {
        self.block_number += 1;
        let hash = keccak256(format!("{}:{method}:{sender}", self.block_number));
        TxReceipt {
            tx_hash: hash.to_string(),
            block_number: Some(self.block_number),
        }
    }
}

fn revert(reason: &str) -> ChainError {
    ChainError::Reverted(reason.to_string())
}

/// Both contracts' state behind one lock.
#[derive(Debug, Default)]
pub struct SimulatedChain {
    ledger: Mutex<Ledger>,
}

impl SimulatedChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a persisted ledger.
    pub fn from_ledger(ledger: Ledger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
        }
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> Ledger {
        self.ledger.lock().await.clone()
    }

    /// Insert a service directly in `status`, bypassing the lifecycle.
    pub async fn seed_service(
        &self,
        client: Address,
        input: &NewService,
        status: ServiceStatus,
    ) -> ServiceId {
        self.ledger.lock().await.push_service(client, input, status)
    }

    /// Overwrite the requester status of a service id.
    pub async fn set_secondary_status(&self, service_id: ServiceId, status: SecondaryStatus) {
        let mut ledger = self.ledger.lock().await;
        ledger.requests.entry(service_id).or_default().status = status;
    }

    // ── Marketplace contract ────────────────────────────────

    async fn create_service(&self, sender: Address, input: &NewService) -> TxReceipt {
        let mut ledger = self.ledger.lock().await;
        let id = ledger.push_service(sender, input, ServiceStatus::Available);
        info!(id, client = %sender, "Simulated service created");
        ledger.mine("createService", sender)
    }

    async fn place_bid(
        &self,
        sender: Address,
        service_id: ServiceId,
        amount: U256,
    ) -> Result<TxReceipt> {
        let mut ledger = self.ledger.lock().await;
        let service = ledger.service_mut(service_id)?;
        if !service.status.accepts_bids() {
            return Err(revert("service not open for bids"));
        }
        if amount.is_zero() {
            return Err(revert("bid amount must be greater than zero"));
        }

        ledger.bids.entry(service_id).or_default().push(Bid {
            bidder: sender,
            amount,
            accepted: false,
        });
        debug!(service_id, bidder = %sender, %amount, "Simulated bid placed");
        Ok(ledger.mine("placeBid", sender))
    }

    async fn accept_bid(
        &self,
        sender: Address,
        service_id: ServiceId,
        bidder: Address,
    ) -> Result<TxReceipt> {
        let mut ledger = self.ledger.lock().await;
        let service = ledger.service_mut(service_id)?;
        if service.client != sender {
            return Err(revert("only the client can accept a bid"));
        }
        if !service.status.accepts_bids() {
            return Err(revert("service not open for bids"));
        }

        let bids = ledger.bids.entry(service_id).or_default();
        if bids.iter().any(|b| b.accepted) {
            return Err(revert("a bid was already accepted"));
        }
        let bid = bids
            .iter_mut()
            .find(|b| b.bidder == bidder)
            .ok_or_else(|| revert("bid not found"))?;
        bid.accepted = true;
        let amount = bid.amount;

        let service = ledger.service_mut(service_id)?;
        service.status = ServiceStatus::InProgress;
        service.transporter = Some(bidder);
        service.accepted_bid_amount = amount;

        debug!(service_id, %bidder, %amount, "Simulated bid accepted");
        Ok(ledger.mine("acceptBid", sender))
    }

    async fn update_service_status(
        &self,
        sender: Address,
        service_id: ServiceId,
        status: ServiceStatus,
    ) -> Result<TxReceipt> {
        let mut ledger = self.ledger.lock().await;
        let service = ledger.service_mut(service_id)?;
        if service.client != sender && service.transporter != Some(sender) {
            return Err(revert("only the client or transporter can update status"));
        }
        if !service.status.can_transition_to(status) {
            return Err(ChainError::Reverted(format!(
                "invalid transition {} -> {status}",
                service.status
            )));
        }
        service.status = status;
        Ok(ledger.mine("updateServiceStatus", sender))
    }

    async fn get_service(&self, service_id: ServiceId) -> Result<Service> {
        let ledger = self.ledger.lock().await;
        usize::try_from(service_id)
            .ok()
            .and_then(|idx| ledger.services.get(idx))
            .cloned()
            .ok_or(ChainError::NotFound(service_id))
    }

    async fn services_count(&self) -> u64 {
        self.ledger.lock().await.services.len() as u64
    }

    async fn get_bids(&self, service_id: ServiceId) -> Result<Vec<Bid>> {
        let ledger = self.ledger.lock().await;
        if usize::try_from(service_id).map_or(true, |idx| idx >= ledger.services.len()) {
            return Err(revert("service does not exist"));
        }
        Ok(ledger.bids.get(&service_id).cloned().unwrap_or_default())
    }

    // ── Requester contract ──────────────────────────────────

    async fn request_service(&self, sender: Address, service_id: ServiceId) -> Result<TxReceipt> {
        let mut ledger = self.ledger.lock().await;
        let record = ledger.requests.entry(service_id).or_default();
        if record.status != SecondaryStatus::NotRequested {
            return Err(revert("service already requested"));
        }
        record.status = SecondaryStatus::Requested;
        Ok(ledger.mine("requestService", sender))
    }

    async fn accept_service(
        &self,
        sender: Address,
        service_id: ServiceId,
        transporter: Address,
    ) -> Result<TxReceipt> {
        let mut ledger = self.ledger.lock().await;
        let record = ledger.requests.entry(service_id).or_default();
        if record.status != SecondaryStatus::Requested {
            return Err(revert("service not requested"));
        }
        record.status = SecondaryStatus::Accepted;
        record.transporter = Some(transporter);
        Ok(ledger.mine("acceptService", sender))
    }

    async fn service_status(&self, service_id: ServiceId) -> SecondaryStatus {
        self.ledger
            .lock()
            .await
            .requests
            .get(&service_id)
            .map(|r| r.status)
            .unwrap_or_default()
    }
}

// ────────────────────────────────────────────
// Port handles
// ────────────────────────────────────────────

/// Contract handle bound to one sender.
struct SimulatedHandle {
    chain: Arc<SimulatedChain>,
    sender: Option<Address>,
}

impl SimulatedHandle {
    fn sender(&self) -> Result<Address> {
        self.sender.ok_or(ChainError::NoSigner)
    }
}

#[async_trait]
impl MarketplaceContract for SimulatedHandle {
    async fn create_service(&self, service: &NewService) -> Result<TxReceipt> {
        Ok(self.chain.create_service(self.sender()?, service).await)
    }

    async fn place_bid(&self, service_id: ServiceId, amount: U256) -> Result<TxReceipt> {
        self.chain.place_bid(self.sender()?, service_id, amount).await
    }

    async fn accept_bid(&self, service_id: ServiceId, bidder: Address) -> Result<TxReceipt> {
        self.chain.accept_bid(self.sender()?, service_id, bidder).await
    }

    async fn update_service_status(
        &self,
        service_id: ServiceId,
        status: ServiceStatus,
    ) -> Result<TxReceipt> {
        self.chain
            .update_service_status(self.sender()?, service_id, status)
            .await
    }

    async fn get_service(&self, service_id: ServiceId) -> Result<Service> {
        self.chain.get_service(service_id).await
    }

    async fn services_count(&self) -> Result<u64> {
        Ok(self.chain.services_count().await)
    }

    async fn get_bids(&self, service_id: ServiceId) -> Result<Vec<Bid>> {
        self.chain.get_bids(service_id).await
    }
}

#[async_trait]
impl RequesterContract for SimulatedHandle {
    async fn request_service(&self, service_id: ServiceId) -> Result<TxReceipt> {
        self.chain.request_service(self.sender()?, service_id).await
    }

    async fn accept_service(
        &self,
        service_id: ServiceId,
        transporter: Address,
    ) -> Result<TxReceipt> {
        self.chain
            .accept_service(self.sender()?, service_id, transporter)
            .await
    }

    async fn service_status(&self, service_id: ServiceId) -> Result<SecondaryStatus> {
        Ok(self.chain.service_status(service_id).await)
    }
}

/// `ChainClient` over a [`SimulatedChain`].
///
/// `signer` plays the connected wallet; without one, write handles fail
/// with `ChainError::NoSigner`. An offline client fails every handle
/// request with `ChainError::NoProvider`.
#[derive(Clone)]
pub struct SimulatedChainClient {
    chain: Arc<SimulatedChain>,
    signer: Option<Address>,
    provider_available: bool,
}

impl SimulatedChainClient {
    /// Read-only client.
    pub fn new(chain: Arc<SimulatedChain>) -> Self {
        Self {
            chain,
            signer: None,
            provider_available: true,
        }
    }

    /// Same chain, acting as `signer`.
    #[must_use]
    pub fn with_signer(mut self, signer: Address) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Same chain, with the provider unreachable.
    #[must_use]
    pub fn offline(mut self) -> Self {
        self.provider_available = false;
        self
    }

    pub fn chain(&self) -> &Arc<SimulatedChain> {
        &self.chain
    }

    fn handle(&self, access: Access) -> Result<Arc<SimulatedHandle>> {
        if !self.provider_available {
            return Err(ChainError::NoProvider("simulated provider offline".to_string()));
        }
        if access == Access::Write && self.signer.is_none() {
            return Err(ChainError::NoSigner);
        }
        Ok(Arc::new(SimulatedHandle {
            chain: Arc::clone(&self.chain),
            sender: self.signer,
        }))
    }
}

#[async_trait]
impl ChainClient for SimulatedChainClient {
    async fn marketplace(&self, access: Access) -> Result<Arc<dyn MarketplaceContract>> {
        Ok(self.handle(access)? as Arc<dyn MarketplaceContract>)
    }

    async fn requester(&self, access: Access) -> Result<Arc<dyn RequesterContract>> {
        Ok(self.handle(access)? as Arc<dyn RequesterContract>)
    }

    async fn is_healthy(&self) -> bool {
        self.provider_available
    }
}
