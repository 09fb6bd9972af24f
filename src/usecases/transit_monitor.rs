//! Transit Monitor - Periodic Transit Scans
//!
//! Scan results are snapshots with no live updates, so watch mode
//! re-runs the scan on a fixed interval and publishes each snapshot on
//! a `tokio::sync::watch` channel. Consumers (metrics, persistence)
//! subscribe to the channel instead of polling the chain themselves.
//! Every scan, failed or not, also publishes a [`ScanStatus`] so that
//! readiness reflects the latest attempt rather than the latest success.
//!
//! Shutdown cancels the scan in flight and waits for it to wind down.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{info, instrument, warn};

use crate::domain::service::{Service, ServiceId};
use crate::ports::chain_client::ChainClient;

use super::envelope::Outcome;
use super::marketplace::Marketplace;

/// One transit scan result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitSnapshot {
  /// When the scan finished.
  pub taken_at: DateTime<Utc>,
  /// Services in transit, ascending by id.
  pub services: Vec<Service>,
  /// Ids in transit now but not in the previous snapshot.
  pub entered: Vec<ServiceId>,
  /// Ids in the previous snapshot but not in transit now.
  pub left: Vec<ServiceId>,
  /// Wall time of the scan.
  pub scan_ms: u64,
}

impl TransitSnapshot {
  /// Build a snapshot, diffing against the previous one.
  pub fn new(services: Vec<Service>, previous: Option<&Self>) -> Self {
    let now: BTreeSet<ServiceId> = services.iter().map(|s| s.id).collect();
    let before: BTreeSet<ServiceId> = previous
      .map(|p| p.services.iter().map(|s| s.id).collect())
      .unwrap_or_default();

    Self {
      taken_at: Utc::now(),
      entered: now.difference(&before).copied().collect(),
      left: before.difference(&now).copied().collect(),
      services,
      scan_ms: 0,
    }
  }
}

/// Outcome of the most recent scan attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanStatus {
  pub finished_at: DateTime<Utc>,
  /// Failure message; `None` when the scan succeeded.
  pub error: Option<String>,
  /// Failed scans since the last success.
  pub consecutive_failures: u32,
}

impl ScanStatus {
  pub const fn is_healthy(&self) -> bool {
    self.error.is_none()
  }
}

/// Re-runs the transit scan every `interval`.
pub struct TransitMonitor<C: ChainClient + ?Sized> {
  marketplace: Arc<Marketplace<C>>,
  interval: Duration,
  snapshot_tx: watch::Sender<Option<TransitSnapshot>>,
  status_tx: watch::Sender<Option<ScanStatus>>,
}

impl<C: ChainClient + ?Sized> TransitMonitor<C> {
  /// Create a monitor and the receiver its snapshots are published on.
  pub fn new(
    marketplace: Arc<Marketplace<C>>,
    interval: Duration,
  ) -> (Self, watch::Receiver<Option<TransitSnapshot>>) {
    let (snapshot_tx, snapshot_rx) = watch::channel(None);
    let (status_tx, _) = watch::channel(None);
    (
      Self {
        marketplace,
        interval,
        snapshot_tx,
        status_tx,
      },
      snapshot_rx,
    )
  }

  /// Receive the status of every scan attempt.
  pub fn subscribe_status(&self) -> watch::Receiver<Option<ScanStatus>> {
    self.status_tx.subscribe()
  }

  /// Run one scan and publish the snapshot if it succeeded.
  ///
  /// A failed scan keeps the previous snapshot and returns the error.
  /// Either way the attempt is published as a [`ScanStatus`].
  pub async fn tick(&self) -> Outcome<TransitSnapshot> {
    let started = Instant::now();
    let outcome = self.marketplace.services_in_transit().await;
    match outcome {
      Outcome::Ok(services) => {
        let previous = self.snapshot_tx.borrow().clone();
        let mut snapshot = TransitSnapshot::new(services, previous.as_ref());
        snapshot.scan_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if !snapshot.entered.is_empty() || !snapshot.left.is_empty() {
          info!(
            entered = ?snapshot.entered,
            left = ?snapshot.left,
            "Transit set changed"
          );
        }

        self.snapshot_tx.send_replace(Some(snapshot.clone()));
        self.publish_status(None);
        Outcome::Ok(snapshot)
      }
      Outcome::Err(message) => {
        warn!(error = %message, "Transit scan failed, keeping previous snapshot");
        self.publish_status(Some(message.clone()));
        Outcome::Err(message)
      }
      Outcome::Pending => Outcome::Pending,
    }
  }

  /// Scan until shutdown.
  #[instrument(skip(self, shutdown_rx))]
  pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
    info!(
      interval_secs = self.interval.as_secs(),
      "Transit monitor started"
    );

    let mut ticker = tokio::time::interval(self.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
          self.marketplace.cancel_scans();
          info!("Transit monitor shutting down");
          return;
        }
        _ = ticker.tick() => {
          let scan = self.tick();
          tokio::pin!(scan);
          tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
              self.marketplace.cancel_scans();
              info!("Transit monitor shutting down mid-scan");
              // Stops before its next round trip.
              let _ = scan.await;
              return;
            }
            _ = &mut scan => {}
          }
        }
      }
    }
  }

  fn publish_status(&self, error: Option<String>) {
    let consecutive_failures = match (&error, self.status_tx.borrow().as_ref()) {
      (None, _) => 0,
      (Some(_), Some(previous)) => previous.consecutive_failures.saturating_add(1),
      (Some(_), None) => 1,
    };
    self.status_tx.send_replace(Some(ScanStatus {
      finished_at: Utc::now(),
      error,
      consecutive_failures,
    }));
  }
}
