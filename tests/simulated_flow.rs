//! Simulated Chain Flow - Full Freight Lifecycle
//!
//! Drives client and carrier facades against one in-memory chain:
//! create, bid, accept, transit handshake, monitor diffs and ledger
//! persistence.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};

use freteracer_chain::adapters::persistence::{LEDGER_FILE, SnapshotStore};
use freteracer_chain::adapters::simulated::{Ledger, SimulatedChain, SimulatedChainClient};
use freteracer_chain::domain::reconcile::TransitState;
use freteracer_chain::domain::service::{NewService, SecondaryStatus, ServiceStatus};
use freteracer_chain::usecases::{Marketplace, TransitMonitor};

const CLIENT: Address = Address::new([0xc1; 20]);
const CARRIER: Address = Address::new([0xca; 20]);
const RIVAL: Address = Address::new([0x77; 20]);

type App = Marketplace<SimulatedChainClient>;

fn shipment() -> NewService {
    NewService {
        origin: "Campinas, SP".to_string(),
        destination: "Goiânia, GO".to_string(),
        cargo_type: "Soja".to_string(),
        weight: U256::from(25_000u64),
        volume: U256::from(60u64),
        pickup_date: 1_767_225_600,
    }
}

fn app_as(chain: &Arc<SimulatedChain>, sender: Address) -> Arc<App> {
    let client = SimulatedChainClient::new(Arc::clone(chain)).with_signer(sender);
    Arc::new(Marketplace::new(Arc::new(client)))
}

#[tokio::test]
async fn test_full_lifecycle_reaches_transit_and_completes() {
    let chain = Arc::new(SimulatedChain::new());
    let client = app_as(&chain, CLIENT);
    let carrier = app_as(&chain, CARRIER);
    let rival = app_as(&chain, RIVAL);

    assert!(client.create_service(&shipment()).await.succeeded());
    let services = client.get_all_services().await.into_value().unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].client, CLIENT);
    assert_eq!(services[0].status, ServiceStatus::Available);

    assert!(carrier.place_bid(0, U256::from(4_200u64)).await.succeeded());
    assert!(rival.place_bid(0, U256::from(4_500u64)).await.succeeded());
    assert_eq!(client.get_bids(0).await.into_value().unwrap().len(), 2);

    // Only the client may accept.
    assert!(!carrier.accept_bid(0, CARRIER).await.succeeded());
    assert!(client.accept_bid(0, CARRIER).await.succeeded());
    let second = client.accept_bid(0, RIVAL).await;
    assert!(second.error().unwrap().contains("already has an accepted bid"));

    let service = client.get_service(0).await.into_value().unwrap();
    assert_eq!(service.status, ServiceStatus::InProgress);
    assert_eq!(service.transporter, Some(CARRIER));
    assert_eq!(service.accepted_bid_amount, U256::from(4_200u64));

    // Marketplace says in transit, requester has not accepted yet.
    assert!(carrier.update_service_status(0, ServiceStatus::InTransit).await.succeeded());
    assert!(client.services_in_transit().await.into_value().unwrap().is_empty());
    let rows = client.reconcile_all().await.into_value().unwrap();
    assert_eq!(rows[0].state, TransitState::Diverged);

    assert!(client.request_service(0).await.succeeded());
    assert!(carrier.accept_service(0, CARRIER).await.succeeded());
    assert_eq!(
        client.secondary_status(0).await.into_value(),
        Some(SecondaryStatus::Accepted)
    );

    let in_transit = client.services_in_transit().await.into_value().unwrap();
    assert_eq!(in_transit.iter().map(|s| s.id).collect::<Vec<_>>(), vec![0]);

    assert!(client.update_service_status(0, ServiceStatus::Completed).await.succeeded());
    assert!(client.services_in_transit().await.into_value().unwrap().is_empty());

    // Terminal: no further bids or transitions.
    assert!(!rival.place_bid(0, U256::from(100u64)).await.succeeded());
    assert!(!client.update_service_status(0, ServiceStatus::Cancelled).await.succeeded());
}

#[tokio::test]
async fn test_read_only_client_cannot_write() {
    let chain = Arc::new(SimulatedChain::new());
    chain
        .seed_service(CLIENT, &shipment(), ServiceStatus::Available)
        .await;
    let app = Marketplace::new(Arc::new(SimulatedChainClient::new(Arc::clone(&chain))));

    let outcome = app.place_bid(0, U256::from(10u64)).await;
    assert!(!outcome.succeeded());
    assert!(!outcome.error().unwrap().is_empty());

    // Reads still work.
    assert_eq!(app.get_all_services().await.into_value().unwrap().len(), 1);
}

#[tokio::test]
async fn test_offline_provider_fails_scan() {
    let chain = Arc::new(SimulatedChain::new());
    let app = Marketplace::new(Arc::new(SimulatedChainClient::new(chain).offline()));

    let outcome = app.services_in_transit().await;
    assert!(outcome.error().unwrap().contains("no chain provider"));
    assert!(outcome.value_or_default().is_empty());
}

#[tokio::test]
async fn test_offline_monitor_reports_unhealthy_scan() {
    let chain = Arc::new(SimulatedChain::new());
    let app = Arc::new(Marketplace::new(Arc::new(SimulatedChainClient::new(chain).offline())));
    let (monitor, _rx) = TransitMonitor::new(app, Duration::from_secs(60));
    let status_rx = monitor.subscribe_status();

    assert!(!monitor.tick().await.succeeded());

    let status = status_rx.borrow().clone().unwrap();
    assert!(!status.is_healthy());
    assert_eq!(status.consecutive_failures, 1);
    assert!(status.error.unwrap().contains("no chain provider"));
}

#[tokio::test]
async fn test_monitor_reports_entered_and_left() {
    let chain = Arc::new(SimulatedChain::new());
    for status in [
        ServiceStatus::InTransit,
        ServiceStatus::InTransit,
        ServiceStatus::Completed,
    ] {
        chain.seed_service(CLIENT, &shipment(), status).await;
    }
    chain.set_secondary_status(0, SecondaryStatus::Accepted).await;
    chain.set_secondary_status(1, SecondaryStatus::Requested).await;

    let app = app_as(&chain, CLIENT);
    let (monitor, rx) = TransitMonitor::new(Arc::clone(&app), Duration::from_secs(60));
    let status_rx = monitor.subscribe_status();
    assert!(status_rx.borrow().is_none());

    let first = monitor.tick().await.into_value().unwrap();
    assert_eq!(first.entered, vec![0]);
    assert!(first.left.is_empty());
    assert_eq!(rx.borrow().as_ref().map(|s| s.services.len()), Some(1));
    assert!(status_rx.borrow().as_ref().is_some_and(|s| s.is_healthy()));

    chain.set_secondary_status(1, SecondaryStatus::Accepted).await;
    chain.set_secondary_status(0, SecondaryStatus::Completed).await;

    let second = monitor.tick().await.into_value().unwrap();
    assert_eq!(second.entered, vec![1]);
    assert_eq!(second.left, vec![0]);
}

#[test]
fn test_ledger_survives_persistence() {
    tokio_test::block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path()).await.unwrap();

        let chain = Arc::new(SimulatedChain::new());
        let client = app_as(&chain, CLIENT);
        assert!(client.create_service(&shipment()).await.succeeded());
        store.save(LEDGER_FILE, &chain.snapshot().await).await.unwrap();

        let ledger: Ledger = store.load(LEDGER_FILE).await.unwrap().unwrap();
        let restored = Arc::new(SimulatedChain::from_ledger(ledger));
        let reader = Marketplace::new(Arc::new(SimulatedChainClient::new(restored)));

        let services = reader.get_all_services().await.into_value().unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].origin, "Campinas, SP");
    });
}
