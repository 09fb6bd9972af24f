//! Persistence Adapters - JSON Snapshot Storage
//!
//! Atomic JSON snapshots for the simulated ledger and the latest
//! transit scan. No database dependency; lightweight and
//! crash-recoverable.

pub mod state;

pub use state::SnapshotStore;

/// File name of the simulated chain ledger.
pub const LEDGER_FILE: &str = "ledger.json";

/// File name of the latest transit snapshot.
pub const TRANSIT_FILE: &str = "transit.json";
