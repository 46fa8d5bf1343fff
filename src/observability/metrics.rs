use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// In-process counters for the reconciliation engine.
///
/// Duplicate deliveries are counted separately from first-time applications
/// so the duplicate rate of the webhook channel stays observable.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub transitions_applied: AtomicU64,
    pub transitions_rejected: AtomicU64,
    pub captures_applied: AtomicU64,
    pub duplicate_captures: AtomicU64,
    pub refunds_applied: AtomicU64,
    pub duplicate_refunds: AtomicU64,
    pub webhooks_received: AtomicU64,
    pub webhooks_rejected: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_transition_applied(&self) {
        self.transitions_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transition_rejected(&self) {
        self.transitions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capture_applied(&self) {
        self.captures_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate_capture(&self) {
        self.duplicate_captures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refund_applied(&self) {
        self.refunds_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate_refund(&self) {
        self.duplicate_refunds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_webhook_received(&self) {
        self.webhooks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_webhook_rejected(&self) {
        self.webhooks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            transitions_applied: self.transitions_applied.load(Ordering::Relaxed),
            transitions_rejected: self.transitions_rejected.load(Ordering::Relaxed),
            captures_applied: self.captures_applied.load(Ordering::Relaxed),
            duplicate_captures: self.duplicate_captures.load(Ordering::Relaxed),
            refunds_applied: self.refunds_applied.load(Ordering::Relaxed),
            duplicate_refunds: self.duplicate_refunds.load(Ordering::Relaxed),
            webhooks_received: self.webhooks_received.load(Ordering::Relaxed),
            webhooks_rejected: self.webhooks_rejected.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub transitions_applied: u64,
    pub transitions_rejected: u64,
    pub captures_applied: u64,
    pub duplicate_captures: u64,
    pub refunds_applied: u64,
    pub duplicate_refunds: u64,
    pub webhooks_received: u64,
    pub webhooks_rejected: u64,
}

impl MetricsSnapshot {
    /// Share of webhook deliveries that were duplicates of an already
    /// applied capture or refund.
    pub fn duplicate_rate(&self) -> f64 {
        if self.webhooks_received == 0 {
            return 0.0;
        }
        (self.duplicate_captures + self.duplicate_refunds) as f64 / self.webhooks_received as f64
    }
}
