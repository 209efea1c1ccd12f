//! Lightweight pool metrics.
//!
//! Plain atomics rather than a metrics exporter; the numbers surface through
//! logs and health checks only.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for connection pool behaviour.
#[derive(Debug)]
pub struct StorageMetrics {
    pub connections_acquired: AtomicU64,
    pub connections_timeout: AtomicU64,
    pub connections_error: AtomicU64,
    total_acquisition_ms: AtomicU64,
    max_pool_size: u32,
}

impl StorageMetrics {
    pub fn new(max_pool_size: u32) -> Self {
        Self {
            connections_acquired: AtomicU64::new(0),
            connections_timeout: AtomicU64::new(0),
            connections_error: AtomicU64::new(0),
            total_acquisition_ms: AtomicU64::new(0),
            max_pool_size,
        }
    }

    pub fn record_connection_acquired(&self, duration_ms: u64) {
        self.connections_acquired.fetch_add(1, Ordering::Relaxed);
        self.total_acquisition_ms.fetch_add(duration_ms, Ordering::Relaxed);
    }

    pub fn record_connection_timeout(&self) {
        self.connections_timeout.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_error(&self) {
        self.connections_error.fetch_add(1, Ordering::Relaxed);
    }

    /// Average connection acquisition time in milliseconds.
    pub fn avg_connection_time_ms(&self) -> u64 {
        let acquired = self.connections_acquired.load(Ordering::Relaxed);
        if acquired == 0 {
            return 0;
        }
        self.total_acquisition_ms.load(Ordering::Relaxed) / acquired
    }

    pub fn max_pool_size(&self) -> u32 {
        self.max_pool_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_acquisition_time() {
        let metrics = StorageMetrics::new(4);
        metrics.record_connection_acquired(10);
        metrics.record_connection_acquired(30);
        assert_eq!(metrics.avg_connection_time_ms(), 20);
        assert_eq!(metrics.max_pool_size(), 4);
    }

    #[test]
    fn empty_metrics_report_zero() {
        let metrics = StorageMetrics::new(1);
        assert_eq!(metrics.avg_connection_time_ms(), 0);
    }
}
