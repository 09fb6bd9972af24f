//! Request Envelope - Per-call Outcomes and Loading State
//!
//! Every marketplace operation resolves to an [`Outcome`] owned by the
//! caller, so two concurrent calls can never overwrite each other's
//! result or error. [`RequestTracker`] keeps the loading/error facts a
//! front-end needs, keyed per call id and per operation name:
//!
//! - loading is true strictly between invocation and resolution
//! - an operation's last error is cleared when that operation starts again
//! - failures become message strings plus a safe default value
//!
//! Nothing here retries.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ChainError;

/// Result of one operation as seen by its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
  /// Invoked, not yet resolved.
  Pending,
  /// Resolved with data.
  Ok(T),
  /// Resolved with a failure message.
  Err(String),
}

impl<T> Outcome<T> {
  /// Wrap a library result.
  pub fn from_result(result: Result<T, ChainError>) -> Self {
    match result {
      Ok(value) => Self::Ok(value),
      Err(e) => Self::Err(e.to_string()),
    }
  }

  pub const fn is_pending(&self) -> bool {
    matches!(self, Self::Pending)
  }

  /// Whether the operation completed successfully.
  ///
  /// For writes this is the boolean success flag: the transaction
  /// was confirmed.
  pub const fn succeeded(&self) -> bool {
    matches!(self, Self::Ok(_))
  }

  /// Failure message, if any.
  pub fn error(&self) -> Option<&str> {
    match self {
      Self::Err(message) => Some(message),
      _ => None,
    }
  }

  pub const fn value(&self) -> Option<&T> {
    match self {
      Self::Ok(value) => Some(value),
      _ => None,
    }
  }

  pub fn into_value(self) -> Option<T> {
    match self {
      Self::Ok(value) => Some(value),
      _ => None,
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
    match self {
      Self::Pending => Outcome::Pending,
      Self::Ok(value) => Outcome::Ok(f(value)),
      Self::Err(message) => Outcome::Err(message),
    }
  }
}

impl<T: Default> Outcome<T> {
  /// Data on success, the type's empty value otherwise.
  ///
  /// An empty result here does not mean "nothing found": check
  /// [`Outcome::error`] too.
  pub fn value_or_default(self) -> T {
    self.into_value().unwrap_or_default()
  }
}

/// One call currently in flight.
#[derive(Debug, Clone)]
struct InFlight {
  operation: &'static str,
  started: Instant,
}

#[derive(Debug, Default)]
struct TrackerState {
  in_flight: HashMap<Uuid, InFlight>,
  last_errors: HashMap<&'static str, String>,
}

/// Loading and error facts, keyed per call and per operation.
#[derive(Debug, Default)]
pub struct RequestTracker {
  state: Mutex<TrackerState>,
}

impl RequestTracker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Run one operation under a fresh call id and wrap its result.
  pub async fn track<T, F>(&self, operation: &'static str, fut: F) -> Outcome<T>
  where
    F: Future<Output = Result<T, ChainError>>,
  {
    let call_id = Uuid::new_v4();
    self.begin(call_id, operation);

    let result = fut.await;

    let elapsed_ms = self.finish(call_id, operation, result.as_ref().err());
    match &result {
      Ok(_) => debug!(operation, %call_id, elapsed_ms, "Operation succeeded"),
      Err(e) => warn!(
        operation,
        %call_id,
        elapsed_ms,
        kind = e.kind().as_str(),
        error = %e,
        "Operation failed"
      ),
    }

    Outcome::from_result(result)
  }

  /// Whether any call of `operation` is in flight.
  pub fn is_loading(&self, operation: &str) -> bool {
    self
      .lock()
      .in_flight
      .values()
      .any(|call| call.operation == operation)
  }

  /// Number of calls in flight across all operations.
  pub fn in_flight(&self) -> usize {
    self.lock().in_flight.len()
  }

  /// Most recent error of `operation`, cleared when it starts again.
  pub fn last_error(&self, operation: &str) -> Option<String> {
    self.lock().last_errors.get(operation).cloned()
  }

  fn begin(&self, call_id: Uuid, operation: &'static str) {
    let mut state = self.lock();
    state.last_errors.remove(operation);
    state.in_flight.insert(
      call_id,
      InFlight {
        operation,
        started: Instant::now(),
      },
    );
  }

  fn finish(&self, call_id: Uuid, operation: &'static str, error: Option<&ChainError>) -> u64 {
    let mut state = self.lock();
    let elapsed_ms = state
      .in_flight
      .remove(&call_id)
      .map_or(0, |call| u64::try_from(call.started.elapsed().as_millis()).unwrap_or(u64::MAX));
    if let Some(e) = error {
      state.last_errors.insert(operation, e.to_string());
    }
    elapsed_ms
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use tokio::sync::oneshot;

  use super::*;

  #[test]
  fn test_outcome_defaults() {
    let failed: Outcome<Vec<u8>> = Outcome::Err("boom".to_string());
    assert!(!failed.succeeded());
    assert_eq!(failed.error(), Some("boom"));
    assert!(failed.value_or_default().is_empty());

    let none: Outcome<Option<u8>> = Outcome::Err("boom".to_string());
    assert_eq!(none.value_or_default(), None);

    let flag: Outcome<bool> = Outcome::Err("boom".to_string());
    assert!(!flag.value_or_default());

    let ok = Outcome::from_result(Ok::<_, ChainError>(3));
    assert_eq!(ok.map(|v| v * 2), Outcome::Ok(6));
  }

  #[tokio::test]
  async fn test_loading_true_only_while_in_flight() {
    let tracker = Arc::new(RequestTracker::new());
    let (tx, rx) = oneshot::channel::<()>();

    let handle = {
      let tracker = Arc::clone(&tracker);
      tokio::spawn(async move {
        tracker
          .track("get_all_services", async move {
            let _ = rx.await;
            Ok::<_, ChainError>(vec![1u64])
          })
          .await
      })
    };

    tokio::task::yield_now().await;
    while !tracker.is_loading("get_all_services") {
      tokio::task::yield_now().await;
    }
    assert!(!tracker.is_loading("place_bid"));

    tx.send(()).unwrap();
    let outcome = handle.await.unwrap();
    assert_eq!(outcome, Outcome::Ok(vec![1]));
    assert!(!tracker.is_loading("get_all_services"));
    assert_eq!(tracker.in_flight(), 0);
  }

  #[tokio::test]
  async fn test_errors_are_per_operation_and_cleared_on_restart() {
    let tracker = RequestTracker::new();

    let failed = tracker
      .track("place_bid", async { Err::<(), _>(ChainError::NoSigner) })
      .await;
    assert!(!failed.succeeded());

    let ok = tracker
      .track("get_service", async { Ok::<_, ChainError>(1u8) })
      .await;
    assert!(ok.succeeded());

    // A different operation succeeding leaves place_bid's error alone.
    assert!(tracker.last_error("place_bid").is_some());
    assert_eq!(tracker.last_error("get_service"), None);

    let retried = tracker
      .track("place_bid", async { Ok::<_, ChainError>(()) })
      .await;
    assert!(retried.succeeded());
    assert_eq!(tracker.last_error("place_bid"), None);
  }
}
