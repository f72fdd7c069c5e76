//! Completion notifications for the surrounding service

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Receives job outcome notifications
///
/// Implementations must be cheap and must not fail the job.
pub trait StatsRecorder: Send + Sync {
    fn record_completion(&self, preset_id: &str);

    fn record_failure(&self, _preset_id: &str) {}
}

/// Discards every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStats;

impl StatsRecorder for NoopStats {
    fn record_completion(&self, _preset_id: &str) {}
}

/// In-process counters, per preset
#[derive(Debug, Default)]
pub struct CountingStats {
    completed: AtomicU64,
    failed: AtomicU64,
    by_preset: Mutex<BTreeMap<String, u64>>,
}

impl CountingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Completed jobs per preset id
    pub fn completed_by_preset(&self) -> BTreeMap<String, u64> {
        self.by_preset
            .lock()
            .map(|counts| counts.clone())
            .unwrap_or_default()
    }
}

impl StatsRecorder for CountingStats {
    fn record_completion(&self, preset_id: &str) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut counts) = self.by_preset.lock() {
            *counts.entry(preset_id.to_string()).or_insert(0) += 1;
        }
    }

    fn record_failure(&self, _preset_id: &str) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}
