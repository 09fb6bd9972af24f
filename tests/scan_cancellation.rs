//! Scan Cancellation Tests - Supersession, Isolation and Shutdown
//!
//! Drives the reconciler and the transit monitor against contracts
//! whose reads take a fixed delay, so that a second call or a shutdown
//! lands while a scan is still in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use tokio::sync::broadcast;

use freteracer_chain::domain::service::{
    Bid, NewService, SecondaryStatus, Service, ServiceId, ServiceStatus,
};
use freteracer_chain::error::{ChainError, Result};
use freteracer_chain::ports::{
    Access, ChainClient, MarketplaceContract, RequesterContract, TxReceipt,
};
use freteracer_chain::usecases::marketplace::ops;
use freteracer_chain::usecases::{Marketplace, TransitMonitor};

// ---- Delayed contracts ----

struct SlowMarket {
    count: u64,
    delay: Duration,
    /// Ids at or past this one revert as missing.
    missing_from: u64,
}

#[async_trait]
impl MarketplaceContract for SlowMarket {
    async fn create_service(&self, _service: &NewService) -> Result<TxReceipt> {
        Err(ChainError::NoSigner)
    }

    async fn place_bid(&self, _service_id: ServiceId, _amount: U256) -> Result<TxReceipt> {
        Err(ChainError::NoSigner)
    }

    async fn accept_bid(&self, _service_id: ServiceId, _bidder: Address) -> Result<TxReceipt> {
        Err(ChainError::NoSigner)
    }

    async fn update_service_status(
        &self,
        _service_id: ServiceId,
        _status: ServiceStatus,
    ) -> Result<TxReceipt> {
        Err(ChainError::NoSigner)
    }

    async fn get_service(&self, service_id: ServiceId) -> Result<Service> {
        tokio::time::sleep(self.delay).await;
        if service_id >= self.missing_from {
            return Err(ChainError::NotFound(service_id));
        }
        Ok(Service {
            id: service_id,
            client: Address::with_last_byte(1),
            transporter: Some(Address::with_last_byte(2)),
            origin: "Chapecó, SC".to_string(),
            destination: "Blumenau, SC".to_string(),
            cargo_type: "Frango congelado".to_string(),
            weight: U256::from(18_000u64),
            volume: U256::from(55u64),
            pickup_date: 1_767_225_600,
            status: ServiceStatus::InTransit,
            accepted_bid_amount: U256::from(3_100u64),
        })
    }

    async fn services_count(&self) -> Result<u64> {
        Ok(self.count)
    }

    async fn get_bids(&self, _service_id: ServiceId) -> Result<Vec<Bid>> {
        Ok(Vec::new())
    }
}

struct AcceptedRequester;

#[async_trait]
impl RequesterContract for AcceptedRequester {
    async fn request_service(&self, _service_id: ServiceId) -> Result<TxReceipt> {
        Err(ChainError::NoSigner)
    }

    async fn accept_service(
        &self,
        _service_id: ServiceId,
        _transporter: Address,
    ) -> Result<TxReceipt> {
        Err(ChainError::NoSigner)
    }

    async fn service_status(&self, _service_id: ServiceId) -> Result<SecondaryStatus> {
        Ok(SecondaryStatus::Accepted)
    }
}

struct SlowChain {
    market: Arc<SlowMarket>,
    requester: Arc<AcceptedRequester>,
    online: AtomicBool,
}

impl SlowChain {
    fn new(count: u64, delay: Duration) -> Self {
        Self {
            market: Arc::new(SlowMarket {
                count,
                delay,
                missing_from: u64::MAX,
            }),
            requester: Arc::new(AcceptedRequester),
            online: AtomicBool::new(true),
        }
    }

    fn check_online(&self) -> Result<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ChainError::NoProvider("rpc unreachable".to_string()))
        }
    }
}

#[async_trait]
impl ChainClient for SlowChain {
    async fn marketplace(&self, _access: Access) -> Result<Arc<dyn MarketplaceContract>> {
        self.check_online()?;
        Ok(Arc::clone(&self.market) as Arc<dyn MarketplaceContract>)
    }

    async fn requester(&self, _access: Access) -> Result<Arc<dyn RequesterContract>> {
        self.check_online()?;
        Ok(Arc::clone(&self.requester) as Arc<dyn RequesterContract>)
    }

    async fn is_healthy(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

fn app(count: u64, delay_ms: u64) -> Arc<Marketplace<SlowChain>> {
    Arc::new(Marketplace::new(Arc::new(SlowChain::new(
        count,
        Duration::from_millis(delay_ms),
    ))))
}

async fn after(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// ---- Reconciler ----

#[tokio::test]
async fn test_newer_transit_scan_supersedes_older() {
    let app = app(3, 40);

    let (first, second) = tokio::join!(app.services_in_transit(), async {
        after(10).await;
        app.services_in_transit().await
    });

    assert_eq!(first.error(), Some(ChainError::Cancelled.to_string().as_str()));
    assert!(first.value().is_none());
    assert_eq!(second.into_value().unwrap().len(), 3);
}

#[tokio::test]
async fn test_reconcile_all_leaves_transit_scan_running() {
    let app = app(3, 40);

    let (transit, joined) = tokio::join!(app.services_in_transit(), async {
        after(10).await;
        app.reconcile_all().await
    });

    assert_eq!(transit.into_value().unwrap().len(), 3);
    assert_eq!(joined.into_value().unwrap().len(), 3);
    assert!(app.tracker().last_error(ops::SERVICES_IN_TRANSIT).is_none());
    assert!(app.tracker().last_error(ops::RECONCILE_ALL).is_none());
}

#[tokio::test]
async fn test_cancel_scans_stops_both_kinds() {
    let app = app(3, 40);

    let (transit, joined, ()) = tokio::join!(app.services_in_transit(), app.reconcile_all(), async {
        after(10).await;
        app.cancel_scans();
    });

    assert_eq!(transit.error(), Some(ChainError::Cancelled.to_string().as_str()));
    assert_eq!(joined.error(), Some(ChainError::Cancelled.to_string().as_str()));
    assert_eq!(app.tracker().in_flight(), 0);
}

#[tokio::test]
async fn test_huge_service_count_surfaces_read_error() {
    let mut chain = SlowChain::new(u64::MAX, Duration::ZERO);
    chain.market = Arc::new(SlowMarket {
        count: u64::MAX,
        delay: Duration::ZERO,
        missing_from: 3,
    });
    let app = Marketplace::new(Arc::new(chain));

    let all = app.get_all_services().await;
    assert_eq!(all.error(), Some(ChainError::NotFound(3).to_string().as_str()));

    let transit = app.services_in_transit().await;
    assert_eq!(transit.error(), Some(ChainError::NotFound(3).to_string().as_str()));
    let joined = app.reconcile_all().await;
    assert!(joined.value().is_none());
    assert_eq!(app.tracker().in_flight(), 0);
}

// ---- Transit monitor ----

#[tokio::test]
async fn test_shutdown_cancels_scan_in_flight() {
    let app = app(100, 20);
    let (monitor, snapshot_rx) = TransitMonitor::new(Arc::clone(&app), Duration::from_secs(60));
    let status_rx = monitor.subscribe_status();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = tokio::spawn(async move { monitor.run(shutdown_rx).await });
    after(50).await;
    shutdown_tx.send(()).unwrap();

    let stopped = tokio::time::timeout(Duration::from_millis(500), handle).await;
    assert!(stopped.is_ok(), "monitor kept scanning after shutdown");

    assert!(snapshot_rx.borrow().is_none());
    let status = status_rx.borrow().clone().unwrap();
    assert_eq!(status.error, Some(ChainError::Cancelled.to_string()));
    assert_eq!(app.tracker().in_flight(), 0);
}

#[tokio::test]
async fn test_failed_scans_are_reported_until_recovery() {
    let chain = Arc::new(SlowChain::new(2, Duration::ZERO));
    chain.online.store(false, Ordering::SeqCst);
    let app = Arc::new(Marketplace::new(Arc::clone(&chain)));
    let (monitor, snapshot_rx) = TransitMonitor::new(app, Duration::from_secs(60));
    let mut status_rx = monitor.subscribe_status();

    assert!(!monitor.tick().await.succeeded());
    assert!(!monitor.tick().await.succeeded());

    assert!(status_rx.has_changed().unwrap());
    let status = status_rx.borrow_and_update().clone().unwrap();
    assert!(!status.is_healthy());
    assert_eq!(status.consecutive_failures, 2);
    assert!(status.error.unwrap().contains("rpc unreachable"));
    assert!(snapshot_rx.borrow().is_none());

    chain.online.store(true, Ordering::SeqCst);
    assert!(monitor.tick().await.succeeded());

    let status = status_rx.borrow_and_update().clone().unwrap();
    assert!(status.is_healthy());
    assert_eq!(status.consecutive_failures, 0);
    assert_eq!(snapshot_rx.borrow().as_ref().map(|s| s.services.len()), Some(2));
}
