//! Logger metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing what happened to logged records
///
/// # Example
///
/// ```
/// use logtee::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_written();
/// metrics.record_filtered();
///
/// assert_eq!(metrics.records_written(), 1);
/// assert_eq!(metrics.records_filtered(), 1);
/// ```
#[derive(Debug, Default)]
pub struct LoggerMetrics {
    /// Records dispatched to at least one route
    records_written: AtomicU64,

    /// Records no route accepted
    records_filtered: AtomicU64,

    /// Individual route writes that failed or panicked
    route_failures: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            records_written: AtomicU64::new(0),
            records_filtered: AtomicU64::new(0),
            route_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_filtered(&self) -> u64 {
        self.records_filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn route_failures(&self) -> u64 {
        self.route_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_written(&self) -> u64 {
        self.records_written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.records_filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_route_failures(&self, count: u64) -> u64 {
        self.route_failures.fetch_add(count, Ordering::Relaxed)
    }

    /// Share of dispatched records that hit at least one failing route,
    /// as a percentage. Returns 0.0 before anything was written.
    pub fn failure_rate(&self) -> f64 {
        let written = self.records_written();
        if written == 0 {
            return 0.0;
        }
        (self.route_failures() as f64 / written as f64) * 100.0
    }

    pub fn reset(&self) {
        self.records_written.store(0, Ordering::Relaxed);
        self.records_filtered.store(0, Ordering::Relaxed);
        self.route_failures.store(0, Ordering::Relaxed);
    }
}
