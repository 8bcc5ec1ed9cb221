//! Message counters.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::dispatch::Dispatch;

#[derive(Debug, Default)]
pub struct BridgeStats {
    received: AtomicU64,
    republished: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`BridgeStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub received: u64,
    pub republished: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl BridgeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: &Dispatch) {
        self.received.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            Dispatch::Republished(_) => &self.republished,
            Dispatch::Skipped | Dispatch::NotSubscribed => &self.skipped,
            Dispatch::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            republished: self.republished.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    pub fn log_summary(&self) {
        let s = self.snapshot();
        info!(
            category = "bridge",
            received = s.received,
            republished = s.republished,
            skipped = s.skipped,
            failed = s.failed,
            "Bridge statistics"
        );
    }
}
