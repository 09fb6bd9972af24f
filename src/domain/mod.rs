//! Domain layer - Freight marketplace models and pure logic.
//!
//! Services, bids and the two independent status enums, plus the pure
//! functions built on them: transit reconciliation, status projection
//! and dashboard analytics. No I/O happens here.

pub mod projection;
pub mod reconcile;
pub mod service;
pub mod stats;

// Re-export core types for convenience
pub use projection::{ServiceCard, TransitCard, status_label};
pub use reconcile::{ReconciledService, TransitState, is_in_transit, select_in_transit};
pub use service::{Bid, NewService, SecondaryStatus, Service, ServiceId, ServiceStatus};
pub use stats::MarketStats;
