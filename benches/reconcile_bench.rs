//! Reconciliation Benchmarks — Per-Scan Domain Work
//!
//! Benchmarks the pure functions that run on every transit scan and
//! dashboard refresh, excluding RPC latency.
//!
//! Run with: cargo bench --bench reconcile_bench

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use freteracer_chain::adapters::simulated::{SimulatedChain, SimulatedChainClient};
use freteracer_chain::domain::projection::{ServiceCard, TransitCard};
use freteracer_chain::domain::reconcile::select_in_transit;
use freteracer_chain::domain::service::{NewService, SecondaryStatus, Service, ServiceStatus};
use freteracer_chain::domain::stats::{MarketStats, filter_by_city};
use freteracer_chain::usecases::Marketplace;

fn services(n: u64) -> Vec<(Service, SecondaryStatus)> {
    (0..n)
        .map(|id| {
            let status = ServiceStatus::ALL[(id % 5) as usize];
            let secondary = SecondaryStatus::try_from((id % 3) as u8).unwrap_or_default();
            let service = Service {
                id,
                client: Address::repeat_byte(0x01),
                transporter: Some(Address::repeat_byte(0x02)),
                origin: "Ribeirão Preto, SP".to_string(),
                destination: "Uberlândia, MG".to_string(),
                cargo_type: "Açúcar".to_string(),
                weight: U256::from(10_000 + id),
                volume: U256::from(30u64),
                pickup_date: 1_767_225_600,
                status,
                accepted_bid_amount: U256::from(1_000 + id),
            };
            (service, secondary)
        })
        .collect()
}

/// Benchmark the transit predicate and explicit sort.
fn bench_select_in_transit(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_in_transit");
    for n in [10u64, 100, 1_000] {
        let mut pairs = services(n);
        pairs.reverse();
        group.bench_with_input(BenchmarkId::from_parameter(n), &pairs, |b, pairs| {
            b.iter(|| select_in_transit(black_box(pairs.clone())));
        });
    }
    group.finish();
}

/// Benchmark card projection for a listing page.
fn bench_projection(c: &mut Criterion) {
    let rows: Vec<Service> = services(100).into_iter().map(|(s, _)| s).collect();

    c.bench_function("service_cards_100", |b| {
        b.iter(|| {
            black_box(&rows)
                .iter()
                .map(ServiceCard::from)
                .collect::<Vec<_>>()
        });
    });

    c.bench_function("transit_cards_100", |b| {
        b.iter(|| {
            black_box(&rows)
                .iter()
                .map(TransitCard::from)
                .collect::<Vec<_>>()
        });
    });
}

/// Benchmark dashboard aggregation and city filtering.
fn bench_stats(c: &mut Criterion) {
    let rows: Vec<Service> = services(1_000).into_iter().map(|(s, _)| s).collect();

    c.bench_function("market_stats_1000", |b| {
        b.iter(|| MarketStats::from_services(black_box(&rows)));
    });

    c.bench_function("filter_by_city_1000", |b| {
        b.iter(|| filter_by_city(black_box(&rows), black_box("uberlândia")).len());
    });
}

/// Benchmark a full scan against the in-memory chain.
fn bench_simulated_scan(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    let chain = Arc::new(SimulatedChain::new());
    let input = NewService {
        origin: "Santos, SP".to_string(),
        destination: "Manaus, AM".to_string(),
        cargo_type: "Contêiner".to_string(),
        weight: U256::from(20_000u64),
        volume: U256::from(67u64),
        pickup_date: 1_767_225_600,
    };
    runtime.block_on(async {
        for id in 0..200u64 {
            let status = ServiceStatus::ALL[(id % 5) as usize];
            chain.seed_service(Address::repeat_byte(0x01), &input, status).await;
            if id % 2 == 0 {
                chain.set_secondary_status(id, SecondaryStatus::Accepted).await;
            }
        }
    });
    let app = Marketplace::new(Arc::new(SimulatedChainClient::new(chain)));

    c.bench_function("simulated_transit_scan_200", |b| {
        b.to_async(&runtime)
            .iter(|| async { app.services_in_transit().await.value_or_default().len() });
    });
}

criterion_group!(
    benches,
    bench_select_in_transit,
    bench_projection,
    bench_stats,
    bench_simulated_scan,
);
criterion_main!(benches);
