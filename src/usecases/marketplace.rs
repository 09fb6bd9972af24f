//! Marketplace Facade - Every Operation Behind the Request Envelope
//!
//! The single entry point for callers (CLI, watch loop, front-ends).
//! Each method runs one repository/bid/requester/reconciler operation
//! under the [`RequestTracker`] and returns a per-call [`Outcome`].
//! Failures never propagate as panics or `Err`: they become the
//! outcome's message, and `value_or_default()` yields `[]`, `None` or
//! `false`.

use std::sync::Arc;

use alloy::primitives::{Address, U256};

use crate::domain::reconcile::ReconciledService;
use crate::domain::service::{Bid, NewService, SecondaryStatus, Service, ServiceId, ServiceStatus};
use crate::domain::stats::MarketStats;
use crate::error::ChainError;
use crate::ports::chain_client::ChainClient;
use crate::ports::marketplace::TxReceipt;

use super::bids::BidOperations;
use super::envelope::{Outcome, RequestTracker};
use super::reconciler::TransitReconciler;
use super::requests::RequesterOperations;
use super::services::ServiceRepository;

/// Operation names used as tracker keys.
pub mod ops {
  pub const CREATE_SERVICE: &str = "create_service";
  pub const PLACE_BID: &str = "place_bid";
  pub const ACCEPT_BID: &str = "accept_bid";
  pub const UPDATE_SERVICE_STATUS: &str = "update_service_status";
  pub const GET_SERVICE: &str = "get_service";
  pub const GET_ALL_SERVICES: &str = "get_all_services";
  pub const GET_BIDS: &str = "get_bids";
  pub const REQUEST_SERVICE: &str = "request_service";
  pub const ACCEPT_SERVICE: &str = "accept_service";
  pub const SECONDARY_STATUS: &str = "secondary_status";
  pub const SERVICES_IN_TRANSIT: &str = "services_in_transit";
  pub const RECONCILE_ALL: &str = "reconcile_all";
  pub const STATS: &str = "stats";
}

/// Facade over all marketplace operations.
pub struct Marketplace<C: ChainClient + ?Sized> {
  services: ServiceRepository<C>,
  bids: BidOperations<C>,
  requests: RequesterOperations<C>,
  reconciler: TransitReconciler<C>,
  tracker: RequestTracker,
}

impl<C: ChainClient + ?Sized> Marketplace<C> {
  /// Create a facade over one chain client.
  pub fn new(chain: Arc<C>) -> Self {
    Self {
      services: ServiceRepository::new(Arc::clone(&chain)),
      bids: BidOperations::new(Arc::clone(&chain)),
      requests: RequesterOperations::new(Arc::clone(&chain)),
      reconciler: TransitReconciler::new(chain),
      tracker: RequestTracker::new(),
    }
  }

  /// Loading/error facts for this facade's calls.
  pub const fn tracker(&self) -> &RequestTracker {
    &self.tracker
  }

  // ── Writes ──────────────────────────────────────────────

  pub async fn create_service(&self, input: &NewService) -> Outcome<TxReceipt> {
    self
      .tracker
      .track(ops::CREATE_SERVICE, self.services.create_service(input))
      .await
  }

  pub async fn place_bid(&self, service_id: ServiceId, amount: U256) -> Outcome<TxReceipt> {
    self
      .tracker
      .track(ops::PLACE_BID, self.bids.place_bid(service_id, amount))
      .await
  }

  pub async fn accept_bid(&self, service_id: ServiceId, bidder: Address) -> Outcome<TxReceipt> {
    self
      .tracker
      .track(ops::ACCEPT_BID, self.bids.accept_bid(service_id, bidder))
      .await
  }

  pub async fn update_service_status(
    &self,
    service_id: ServiceId,
    status: ServiceStatus,
  ) -> Outcome<TxReceipt> {
    self
      .tracker
      .track(
        ops::UPDATE_SERVICE_STATUS,
        self.services.update_service_status(service_id, status),
      )
      .await
  }

  pub async fn request_service(&self, service_id: ServiceId) -> Outcome<TxReceipt> {
    self
      .tracker
      .track(ops::REQUEST_SERVICE, self.requests.request_service(service_id))
      .await
  }

  pub async fn accept_service(
    &self,
    service_id: ServiceId,
    transporter: Address,
  ) -> Outcome<TxReceipt> {
    self
      .tracker
      .track(
        ops::ACCEPT_SERVICE,
        self.requests.accept_service(service_id, transporter),
      )
      .await
  }

  // ── Reads ───────────────────────────────────────────────

  pub async fn get_service(&self, service_id: ServiceId) -> Outcome<Service> {
    self
      .tracker
      .track(ops::GET_SERVICE, self.services.get_service(service_id))
      .await
  }

  pub async fn get_all_services(&self) -> Outcome<Vec<Service>> {
    self
      .tracker
      .track(ops::GET_ALL_SERVICES, self.services.get_all_services())
      .await
  }

  pub async fn get_bids(&self, service_id: ServiceId) -> Outcome<Vec<Bid>> {
    self
      .tracker
      .track(ops::GET_BIDS, self.bids.get_bids(service_id))
      .await
  }

  /// Requester-side status. On failure the safe default is `NotRequested`.
  pub async fn secondary_status(&self, service_id: ServiceId) -> Outcome<SecondaryStatus> {
    self
      .tracker
      .track(ops::SECONDARY_STATUS, self.requests.service_status(service_id))
      .await
  }

  pub async fn services_in_transit(&self) -> Outcome<Vec<Service>> {
    self
      .tracker
      .track(ops::SERVICES_IN_TRANSIT, self.reconciler.services_in_transit())
      .await
  }

  pub async fn reconcile_all(&self) -> Outcome<Vec<ReconciledService>> {
    self
      .tracker
      .track(ops::RECONCILE_ALL, self.reconciler.reconcile_all())
      .await
  }

  /// Dashboard figures over a fresh snapshot.
  pub async fn stats(&self) -> Outcome<MarketStats> {
    self
      .tracker
      .track(ops::STATS, async {
        let services = self.services.get_all_services().await?;
        Ok::<_, ChainError>(MarketStats::from_services(&services))
      })
      .await
  }

  /// Cancel an in-progress transit scan.
  pub fn cancel_scans(&self) {
    self.reconciler.cancel();
  }
}
