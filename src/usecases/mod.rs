//! Use Cases Layer - Marketplace Workflows
//!
//! Orchestrates domain logic with port interfaces to implement the
//! marketplace's workflows. Each use case is a self-contained operation
//! over a [`ChainClient`](crate::ports::ChainClient).
//!
//! Use cases:
//! - `ServiceRepository`: Create, read, enumerate, update services
//! - `BidOperations`: Place, list, accept bids
//! - `RequesterOperations`: Request/accept handshake on the second contract
//! - `TransitReconciler`: Cross-contract "in transit" scan
//! - `Marketplace`: Facade wrapping every call in the request envelope
//! - `TransitMonitor`: Periodic scans for watch mode

pub mod bids;
pub mod envelope;
pub mod marketplace;
pub mod reconciler;
pub mod requests;
pub mod scope;
pub mod services;
pub mod transit_monitor;

pub use envelope::{Outcome, RequestTracker};
pub use marketplace::Marketplace;
pub use transit_monitor::{ScanStatus, TransitMonitor, TransitSnapshot};
