//! Sync counters exposed on `/metrics`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    Report,
    Alert,
}

impl SyncKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::Alert => "alert",
        }
    }
}

#[derive(Debug, Default)]
struct Counter {
    success: AtomicU64,
    failed: AtomicU64,
}

impl Counter {
    fn snapshot(&self) -> OutcomeCounts {
        OutcomeCounts {
            success: self.success.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Default)]
pub struct SyncMetrics {
    reports: Counter,
    alerts: Counter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub success: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub report: OutcomeCounts,
    pub alert: OutcomeCounts,
}

impl SyncMetrics {
    pub fn record(&self, kind: SyncKind, success: bool) {
        let counter = match kind {
            SyncKind::Report => &self.reports,
            SyncKind::Alert => &self.alerts,
        };
        let slot = if success {
            &counter.success
        } else {
            &counter.failed
        };
        slot.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            report: self.reports.snapshot(),
            alert: self.alerts.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_kind_and_outcome() {
        let metrics = SyncMetrics::default();
        metrics.record(SyncKind::Report, true);
        metrics.record(SyncKind::Report, true);
        metrics.record(SyncKind::Report, false);
        metrics.record(SyncKind::Alert, false);

        let snap = metrics.snapshot();
        assert_eq!(snap.report, OutcomeCounts { success: 2, failed: 1 });
        assert_eq!(snap.alert, OutcomeCounts { success: 0, failed: 1 });
    }
}
