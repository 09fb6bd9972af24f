//! Cross-contract transit reconciliation.
//!
//! The marketplace contract and the requester contract each hold a
//! status for the same service id, with no transactional link between
//! them. This module defines the joined view and the predicate that
//! decides when a service is really under way.

use serde::Serialize;

use super::service::{SecondaryStatus, Service, ServiceStatus};

/// Classification of a (marketplace, requester) status pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransitState {
    /// Both contracts agree the shipment is moving.
    InTransit,
    /// Requester accepted, marketplace has not left the pre-transit states.
    AwaitingDeparture,
    /// Marketplace says in transit, requester has not accepted.
    Diverged,
    /// Anything else.
    NotInTransit,
}

impl TransitState {
    /// Classify a status pair.
    pub const fn classify(status: ServiceStatus, secondary: SecondaryStatus) -> Self {
        match (status, secondary) {
            (ServiceStatus::InTransit, SecondaryStatus::Accepted) => Self::InTransit,
            (ServiceStatus::InTransit, _) => Self::Diverged,
            (ServiceStatus::Available | ServiceStatus::InProgress, SecondaryStatus::Accepted) => {
                Self::AwaitingDeparture
            }
            _ => Self::NotInTransit,
        }
    }
}

/// A service counts as in transit only when both contracts agree.
pub const fn is_in_transit(status: ServiceStatus, secondary: SecondaryStatus) -> bool {
    matches!(TransitState::classify(status, secondary), TransitState::InTransit)
}

/// Joined marketplace/requester view of one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledService {
    pub service: Service,
    pub secondary: SecondaryStatus,
    pub state: TransitState,
}

impl ReconciledService {
    pub fn new(service: Service, secondary: SecondaryStatus) -> Self {
        let state = TransitState::classify(service.status, secondary);
        Self {
            service,
            secondary,
            state,
        }
    }
}

/// Keep the in-transit services, sorted by ascending id.
///
/// The sort is explicit: callers may feed pairs in any order.
pub fn select_in_transit<I>(pairs: I) -> Vec<Service>
where
    I: IntoIterator<Item = (Service, SecondaryStatus)>,
{
    let mut selected: Vec<Service> = pairs
        .into_iter()
        .filter(|(service, secondary)| is_in_transit(service.status, *secondary))
        .map(|(service, _)| service)
        .collect();
    selected.sort_by_key(|s| s.id);
    selected
}
