use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Outcome counters for dispatched technician actions
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    pub actions_attempted: AtomicU64,
    pub transitions_delivered: AtomicU64,
    pub transitions_rejected: AtomicU64,
    pub delivery_failures: AtomicU64,
    pub code_mismatches: AtomicU64,
    pub notifications_failed: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self) {
        self.actions_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.transitions_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.transitions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
        warn!("Job store refused a transition request");
    }

    pub fn record_code_mismatch(&self) {
        self.code_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notification_failure(&self) {
        self.notifications_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> DispatchStats {
        DispatchStats {
            actions_attempted: self.actions_attempted.load(Ordering::Relaxed),
            transitions_delivered: self.transitions_delivered.load(Ordering::Relaxed),
            transitions_rejected: self.transitions_rejected.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            code_mismatches: self.code_mismatches.load(Ordering::Relaxed),
            notifications_failed: self.notifications_failed.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Dispatch metrics: attempted={}, delivered={}, rejected={}, delivery_failures={}, code_mismatches={}, notifications_failed={}",
            stats.actions_attempted,
            stats.transitions_delivered,
            stats.transitions_rejected,
            stats.delivery_failures,
            stats.code_mismatches,
            stats.notifications_failed
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub actions_attempted: u64,
    pub transitions_delivered: u64,
    pub transitions_rejected: u64,
    pub delivery_failures: u64,
    pub code_mismatches: u64,
    pub notifications_failed: u64,
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}
