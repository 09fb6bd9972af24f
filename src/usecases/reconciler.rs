//! Transit Reconciler - Joining the Two Contracts' Status Views
//!
//! For every service id, reads the marketplace status and the
//! requester status and keeps the services both contracts agree are
//! in transit. Disagreement is not an error: such services are simply
//! not in transit yet.
//!
//! Scan flow:
//! 1. Acquire both read handles (fail fast, no partial results)
//! 2. Read the service count once
//! 3. For each id: service, then requester status (sequential)
//! 4. Filter with `domain::reconcile`, sort by id explicitly
//!
//! Cost is 2×count round trips per scan, nothing cached between scans.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument};

use crate::domain::reconcile::{ReconciledService, select_in_transit};
use crate::domain::service::{SecondaryStatus, Service};
use crate::error::Result;
use crate::ports::chain_client::{Access, ChainClient};

use super::scope::{ScanScope, ScanToken};

/// Cross-contract transit reconciler.
pub struct TransitReconciler<C: ChainClient + ?Sized> {
  chain: Arc<C>,
  /// Scope of `services_in_transit` calls.
  transit_scope: ScanScope,
  /// Scope of `reconcile_all` calls.
  joined_scope: ScanScope,
}

impl<C: ChainClient + ?Sized> TransitReconciler<C> {
  pub fn new(chain: Arc<C>) -> Self {
    Self {
      chain,
      transit_scope: ScanScope::new(),
      joined_scope: ScanScope::new(),
    }
  }

  /// Services both contracts agree are in transit, ascending by id.
  ///
  /// Starting this scan supersedes any `services_in_transit` scan still
  /// running on this reconciler; the superseded one returns
  /// `ChainError::Cancelled`. A running `reconcile_all` is unaffected.
  #[instrument(skip(self))]
  pub async fn services_in_transit(&self) -> Result<Vec<Service>> {
    let started = Instant::now();
    let token = self.transit_scope.begin();
    let pairs = self.scan(&token).await?;
    let scanned = pairs.len();

    let in_transit = select_in_transit(pairs);
    token.check()?;

    info!(
      scanned,
      in_transit = in_transit.len(),
      elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
      "Transit scan complete"
    );
    Ok(in_transit)
  }

  /// Joined view of every service, ascending by id.
  ///
  /// Supersedes only an earlier `reconcile_all` still running.
  #[instrument(skip(self))]
  pub async fn reconcile_all(&self) -> Result<Vec<ReconciledService>> {
    let token = self.joined_scope.begin();
    let mut joined: Vec<ReconciledService> = self
      .scan(&token)
      .await?
      .into_iter()
      .map(|(service, secondary)| ReconciledService::new(service, secondary))
      .collect();
    joined.sort_by_key(|r| r.service.id);
    token.check()?;
    Ok(joined)
  }

  /// Cancel every scan in progress, of either kind.
  pub fn cancel(&self) {
    self.transit_scope.cancel_all();
    self.joined_scope.cancel_all();
  }

  async fn scan(&self, token: &ScanToken) -> Result<Vec<(Service, SecondaryStatus)>> {
    let market = self.chain.marketplace(Access::Read).await?;
    let requester = self.chain.requester(Access::Read).await?;

    token.check()?;
    let count = market.services_count().await?;

    let mut pairs = Vec::new();
    for id in 0..count {
      token.check()?;
      let service = market.get_service(id).await?;
      token.check()?;
      let secondary = requester.service_status(id).await?;
      debug!(id, status = %service.status, %secondary, "Reconciled service");
      pairs.push((service, secondary));
    }

    Ok(pairs)
  }
}
