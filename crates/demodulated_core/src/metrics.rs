//! Per-update timing metrics.
//!
//! Collection is off by default. When enabled, each `update()` is timed with
//! `Instant` and folded into fixed counters, so the audio thread never
//! allocates.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingMetrics {
    /// Number of timed update() calls
    pub count: u64,
    /// Total nanoseconds spent in update()
    pub total_ns: u64,
    /// Minimum nanoseconds for a single update() call
    pub min_ns: u64,
    /// Maximum nanoseconds for a single update() call
    pub max_ns: u64,
}

impl Default for TimingMetrics {
    fn default() -> Self {
        Self {
            count: 0,
            total_ns: 0,
            min_ns: u64::MAX,
            max_ns: 0,
        }
    }
}

impl TimingMetrics {
    pub fn record(&mut self, elapsed: Duration) {
        let ns = elapsed.as_nanos().min(u64::MAX as u128) as u64;
        self.count += 1;
        self.total_ns = self.total_ns.saturating_add(ns);
        self.min_ns = self.min_ns.min(ns);
        self.max_ns = self.max_ns.max(ns);
    }

    pub fn avg_ns(&self) -> u64 {
        if self.count > 0 {
            self.total_ns / self.count
        } else {
            0
        }
    }

    /// Minimum, or 0 when nothing was recorded.
    pub fn min_ns(&self) -> u64 {
        if self.count > 0 { self.min_ns } else { 0 }
    }
}

/// Optional timer wrapped around a module's update.
#[derive(Debug, Clone, Default)]
pub struct UpdateTimer {
    enabled: bool,
    metrics: TimingMetrics,
}

impl UpdateTimer {
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Run `f`, timing it if collection is enabled.
    #[inline]
    pub fn time<R>(&mut self, f: impl FnOnce() -> R) -> R {
        if !self.enabled {
            return f();
        }
        let start = Instant::now();
        let result = f();
        self.metrics.record(start.elapsed());
        result
    }

    pub fn metrics(&self) -> Option<TimingMetrics> {
        self.enabled.then_some(self.metrics)
    }

    pub fn reset(&mut self) {
        self.metrics = TimingMetrics::default();
    }
}
