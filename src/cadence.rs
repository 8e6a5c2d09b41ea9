//! Publish cadence bookkeeping.
//!
//! Times are milliseconds of monotonic uptime. The last-publish stamp starts
//! at 0 (boot), so the first batch goes out once uptime exceeds the interval.

/// Fixed interval between publish batches plus the time of the last batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishCadence {
    interval_ms: u64,
    last_publish_ms: u64,
}

impl PublishCadence {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_publish_ms: 0,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn last_publish_ms(&self) -> u64 {
        self.last_publish_ms
    }

    /// Time since the last completed batch. A clock that reads earlier than
    /// the stamp yields 0.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_publish_ms)
    }

    /// Strictly greater than the interval, never equal.
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.elapsed_ms(now_ms) > self.interval_ms
    }

    /// Record a completed batch. Call only after every publish in the batch
    /// has been attempted.
    pub fn mark(&mut self, now_ms: u64) {
        self.last_publish_ms = now_ms;
    }
}
