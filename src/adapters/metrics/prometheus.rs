//! Prometheus Metrics Registry - Marketplace Observability
//!
//! Registers and exposes Prometheus metrics for Grafana dashboards.
//! Covers contract call counts and latency, transit scan duration and
//! the size of the in-transit set.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::error::ChainError;

/// Centralized Prometheus metrics for the marketplace client.
///
/// All metrics follow the naming convention `freteracer_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Contract calls by method and result (`ok` or an error kind).
    pub chain_calls: IntCounterVec,
    /// Contract call latency in milliseconds.
    pub chain_call_latency_ms: HistogramVec,
    /// Services both contracts agree are in transit.
    pub services_in_transit: IntGauge,
    /// Wall time of a full transit scan.
    pub scan_duration_seconds: Histogram,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let chain_calls = IntCounterVec::new(
            Opts::new("freteracer_chain_calls_total", "Contract calls by method and result"),
            &["method", "result"],
        )?;

        let chain_call_latency_ms = HistogramVec::new(
            HistogramOpts::new(
                "freteracer_chain_call_latency_ms",
                "Contract call latency in milliseconds",
            )
            .buckets(vec![
                5.0, 25.0, 100.0, 250.0, 1000.0, 5000.0, 30000.0, 120_000.0,
            ]),
            &["method"],
        )?;

        let services_in_transit = IntGauge::new(
            "freteracer_services_in_transit",
            "Services in transit on both contracts at the last scan",
        )?;

        let scan_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "freteracer_scan_duration_seconds",
                "Wall time of a full transit scan",
            )
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0]),
        )?;

        registry.register(Box::new(chain_calls.clone()))?;
        registry.register(Box::new(chain_call_latency_ms.clone()))?;
        registry.register(Box::new(services_in_transit.clone()))?;
        registry.register(Box::new(scan_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            chain_calls,
            chain_call_latency_ms,
            services_in_transit,
            scan_duration_seconds,
        })
    }

    /// Record one contract round trip.
    pub fn record_chain_call<T>(
        &self,
        method: &str,
        elapsed: Duration,
        result: &Result<T, ChainError>,
    ) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(e) => e.kind().as_str(),
        };
        self.chain_calls.with_label_values(&[method, outcome]).inc();
        self.chain_call_latency_ms
            .with_label_values(&[method])
            .observe(elapsed.as_secs_f64() * 1000.0);
    }

    /// Record a completed transit scan.
    pub fn record_scan(&self, elapsed: Duration, in_transit: usize) {
        self.scan_duration_seconds.observe(elapsed.as_secs_f64());
        self.services_in_transit
            .set(i64::try_from(in_transit).unwrap_or(i64::MAX));
    }

    /// Render the registry in the Prometheus text format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move {
                    match metrics.render() {
                        Ok(body) => (StatusCode::OK, body),
                        Err(e) => {
                            warn!(error = %e, "Failed to encode metrics");
                            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                        }
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_call_recorded_by_kind() {
        let metrics = MetricsRegistry::new().unwrap();
        let ok: Result<(), ChainError> = Ok(());
        let err: Result<(), ChainError> = Err(ChainError::NoSigner);

        metrics.record_chain_call("getService", Duration::from_millis(12), &ok);
        metrics.record_chain_call("placeBid", Duration::from_millis(40), &err);

        assert_eq!(
            metrics.chain_calls.with_label_values(&["getService", "ok"]).get(),
            1
        );
        assert_eq!(
            metrics
                .chain_calls
                .with_label_values(&["placeBid", "authorization"])
                .get(),
            1
        );
    }

    #[test]
    fn test_render_contains_metric_names() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.record_scan(Duration::from_millis(250), 3);

        let body = metrics.render().unwrap();
        assert!(body.contains("freteracer_services_in_transit 3"));
        assert!(body.contains("freteracer_scan_duration_seconds"));
    }
}
