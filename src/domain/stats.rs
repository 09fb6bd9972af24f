//! Marketplace analytics.
//!
//! Aggregates a service snapshot into the dashboard figures: counts per
//! status, total volume, volume per origin and destination city, and
//! average accepted bid.

use std::collections::BTreeMap;
use std::str::FromStr;

use alloy::primitives::U256;
use rust_decimal::Decimal;
use serde::Serialize;

use super::service::{Service, ServiceStatus};

/// Count of services in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: ServiceStatus,
    pub label: &'static str,
    pub count: usize,
}

/// Dashboard figures for a service snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketStats {
    pub total_services: usize,
    /// One entry per status, in code order (zero counts included).
    pub by_status: Vec<StatusCount>,
    pub completed: usize,
    pub in_transit: usize,
    /// Sum of all service volumes (m³).
    pub total_volume: U256,
    /// Summed volume per origin city.
    pub volume_by_origin: BTreeMap<String, U256>,
    /// Summed volume per destination city.
    pub volume_by_destination: BTreeMap<String, U256>,
    /// Mean accepted bid over services with an accepted bid.
    pub average_accepted_bid: Option<Decimal>,
}

impl MarketStats {
    /// Compute figures for a snapshot.
    pub fn from_services(services: &[Service]) -> Self {
        let by_status: Vec<StatusCount> = ServiceStatus::ALL
            .iter()
            .map(|&status| StatusCount {
                status,
                label: status.label(),
                count: services.iter().filter(|s| s.status == status).count(),
            })
            .collect();

        let count_of = |status: ServiceStatus| {
            by_status
                .iter()
                .find(|c| c.status == status)
                .map_or(0, |c| c.count)
        };

        let total_volume = services
            .iter()
            .fold(U256::ZERO, |acc, s| acc.saturating_add(s.volume));

        let mut volume_by_origin: BTreeMap<String, U256> = BTreeMap::new();
        let mut volume_by_destination: BTreeMap<String, U256> = BTreeMap::new();
        for s in services {
            let origin = volume_by_origin.entry(city_of(&s.origin)).or_default();
            *origin = origin.saturating_add(s.volume);
            let destination = volume_by_destination
                .entry(city_of(&s.destination))
                .or_default();
            *destination = destination.saturating_add(s.volume);
        }

        let accepted: Vec<Decimal> = services
            .iter()
            .filter(|s| !s.accepted_bid_amount.is_zero())
            .filter_map(|s| to_decimal(s.accepted_bid_amount))
            .collect();

        let average_accepted_bid = if accepted.is_empty() {
            None
        } else {
            let sum: Decimal = accepted.iter().copied().sum();
            Some((sum / Decimal::from(accepted.len())).round_dp(2))
        };

        Self {
            total_services: services.len(),
            completed: count_of(ServiceStatus::Completed),
            in_transit: count_of(ServiceStatus::InTransit),
            by_status,
            total_volume,
            volume_by_origin,
            volume_by_destination,
            average_accepted_bid,
        }
    }
}

/// City part of a `"city, state"` location.
pub fn city_of(location: &str) -> String {
    location
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Convert an on-chain integer to `Decimal`, if it fits in 96 bits.
pub fn to_decimal(value: U256) -> Option<Decimal> {
    Decimal::from_str(&value.to_string()).ok()
}

/// Keep services whose origin or destination mentions `needle`.
///
/// Case-insensitive. An empty needle keeps everything.
pub fn filter_by_city<'a>(services: &'a [Service], needle: &str) -> Vec<&'a Service> {
    let needle = needle.trim().to_lowercase();
    services
        .iter()
        .filter(|s| {
            needle.is_empty()
                || s.origin.to_lowercase().contains(&needle)
                || s.destination.to_lowercase().contains(&needle)
        })
        .collect()
}
