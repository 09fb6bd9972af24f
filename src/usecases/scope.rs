//! Scan Scope - Cancellation for Long-running Reads
//!
//! A contract scan is O(count) sequential round trips. Starting a new
//! scan from the same scope supersedes the previous one; a superseded
//! or cancelled scan stops before its next round trip and never hands
//! back its partial results.

use tokio::sync::watch;

use crate::error::{ChainError, Result};

/// Generation counter shared by all scans started from one owner.
#[derive(Debug)]
pub struct ScanScope {
  generation: watch::Sender<u64>,
}

impl Default for ScanScope {
  fn default() -> Self {
    Self::new()
  }
}

impl ScanScope {
  pub fn new() -> Self {
    let (generation, _) = watch::channel(0);
    Self { generation }
  }

  /// Start a scan, superseding any scan started earlier.
  pub fn begin(&self) -> ScanToken {
    self.generation.send_modify(|g| *g += 1);
    let rx = self.generation.subscribe();
    let generation = *rx.borrow();
    ScanToken { generation, rx }
  }

  /// Cancel every scan started so far.
  pub fn cancel_all(&self) {
    self.generation.send_modify(|g| *g += 1);
  }
}

/// Handle held by one running scan.
#[derive(Debug, Clone)]
pub struct ScanToken {
  generation: u64,
  rx: watch::Receiver<u64>,
}

impl ScanToken {
  /// Whether a newer scan started or the scope was cancelled.
  pub fn is_cancelled(&self) -> bool {
    *self.rx.borrow() != self.generation
  }

  /// `Err(ChainError::Cancelled)` once superseded.
  pub fn check(&self) -> Result<()> {
    if self.is_cancelled() {
      Err(ChainError::Cancelled)
    } else {
      Ok(())
    }
  }
}
