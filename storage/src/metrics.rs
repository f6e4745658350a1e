//! Metrics collector (spec §4.D). Monotonic counters and timing
//! aggregates, updated inside the measurement wrapper of every primitive,
//! read out as an immutable snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::pool::PoolStats;

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub open_connections: usize,
    pub in_use: usize,
    pub idle: usize,
    pub wait_count: u64,
    pub wait_duration: Duration,
    pub evicted_for_idle: u64,
    pub evicted_for_lifetime: u64,
    pub prepared_statement_count: usize,
    pub total_queries: u64,
    pub total_prepared_queries: u64,
    pub avg_query_duration: Duration,
}

#[derive(Default)]
pub struct MetricsCollector {
    total_queries: AtomicU64,
    total_prepared_queries: AtomicU64,
    cumulative_query_time_nanos: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_query(&self, duration: Duration, prepared: bool) {
        self.total_queries.fetch_add(1, Ordering::SeqCst);
        if prepared {
            self.total_prepared_queries.fetch_add(1, Ordering::SeqCst);
        }
        self.cumulative_query_time_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn snapshot(&self, pool_stats: PoolStats, prepared_statement_count: usize) -> MetricsSnapshot {
        let total_queries = self.total_queries.load(Ordering::SeqCst);
        let total_prepared_queries = self.total_prepared_queries.load(Ordering::SeqCst);
        let cumulative_nanos = self.cumulative_query_time_nanos.load(Ordering::SeqCst);
        let denominator = total_queries + total_prepared_queries;
        let avg_query_duration = if denominator == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(cumulative_nanos / denominator)
        };

        MetricsSnapshot {
            open_connections: pool_stats.open_connections,
            in_use: pool_stats.in_use,
            idle: pool_stats.idle,
            wait_count: pool_stats.wait_count,
            wait_duration: pool_stats.wait_duration,
            evicted_for_idle: pool_stats.evicted_for_idle,
            evicted_for_lifetime: pool_stats.evicted_for_lifetime,
            prepared_statement_count,
            total_queries,
            total_prepared_queries,
            avg_query_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avg_duration_guards_against_division_by_zero() {
        let metrics = MetricsCollector::new();
        let snap = metrics.snapshot(PoolStats::default(), 0);
        assert_eq!(snap.avg_query_duration, Duration::ZERO);
    }

    #[test]
    fn avg_duration_averages_across_regular_and_prepared() {
        let metrics = MetricsCollector::new();
        metrics.record_query(Duration::from_millis(10), false);
        metrics.record_query(Duration::from_millis(30), true);
        let snap = metrics.snapshot(PoolStats::default(), 0);
        assert_eq!(snap.total_queries, 2);
        assert_eq!(snap.total_prepared_queries, 1);
        assert_eq!(snap.avg_query_duration, Duration::from_millis(20));
    }
}
