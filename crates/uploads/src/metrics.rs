use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters tracking upload outcomes.
///
/// All counters use relaxed ordering. For a point-in-time view, call
/// [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct UploadMetrics {
    /// Uploads that created a new record and blob.
    pub created: AtomicU64,
    /// Uploads whose content was already stored.
    pub duplicates: AtomicU64,
    /// Successful content reads.
    pub served: AtomicU64,
    /// Successful deletions.
    pub deleted: AtomicU64,
    /// Reads or deletes of identifiers with no reachable upload.
    pub not_found: AtomicU64,
    /// Operations that ended in a storage fault.
    pub failed: AtomicU64,
}

impl UploadMetrics {
    pub fn increment_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_duplicates(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_served(&self) {
        self.served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deleted(&self) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            created: self.created.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            served: self.served.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// A plain-data copy of [`UploadMetrics`] at one moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub created: u64,
    pub duplicates: u64,
    pub served: u64,
    pub deleted: u64,
    pub not_found: u64,
    pub failed: u64,
}
