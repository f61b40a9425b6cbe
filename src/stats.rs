use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters updated on every buffer operation.
pub(crate) struct StatsCounter {
    writes: AtomicU64,
    reads: AtomicU64,
    write_timeouts: AtomicU64,
    partial_reads: AtomicU64,
    resizes: AtomicU64,
}

impl StatsCounter {
    pub(crate) fn new() -> Self {
        StatsCounter {
            writes: AtomicU64::new(0),
            reads: AtomicU64::new(0),
            write_timeouts: AtomicU64::new(0),
            partial_reads: AtomicU64::new(0),
            resizes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_reads(&self, count: u64) {
        self.reads.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_write_timeout(&self) {
        self.write_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_partial_read(&self) {
        self.partial_reads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_resize(&self) {
        self.resizes.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of the counters.
    pub(crate) fn snapshot(&self) -> Stats {
        Stats {
            writes: self.writes.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            write_timeouts: self.write_timeouts.load(Ordering::Relaxed),
            partial_reads: self.partial_reads.load(Ordering::Relaxed),
            resizes: self.resizes.load(Ordering::Relaxed),
        }
    }
}

impl Default for StatsCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of buffer statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    /// Items successfully written.
    pub writes: u64,
    /// Items read out (each item counts once, batched or not).
    pub reads: u64,
    /// Writes that failed with `AcquireTimeout`.
    pub write_timeouts: u64,
    /// `read_many` calls that returned fewer items than requested.
    pub partial_reads: u64,
    /// Completed capacity changes.
    pub resizes: u64,
}

impl Stats {
    /// Items written but not yet read at snapshot time.
    ///
    /// Derived from monotonic counters, so it can lag the live occupancy.
    pub fn buffered(&self) -> u64 {
        self.writes.saturating_sub(self.reads)
    }
}
