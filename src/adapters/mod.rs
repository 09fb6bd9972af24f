//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (blockchain RPC, environment keys, file I/O).
//! Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `chain`: marketplace and requester contracts via alloy-rs
//! - `simulated`: in-memory contracts for dry runs and tests
//! - `wallet`: environment-backed signing keys
//! - `metrics`: Prometheus metrics export and health checks
//! - `persistence`: atomic JSON snapshots

pub mod chain;
pub mod metrics;
pub mod persistence;
pub mod simulated;
pub mod wallet;
