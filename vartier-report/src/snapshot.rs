//! Immutable reported-variant snapshots.
//!
//! One row per variant per report, written at finalization and never
//! touched again. Rows are the ground truth for "what did the report
//! say", independent of how live annotations move afterwards.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use vartier_core::errors::StoreError;
use vartier_core::models::ReportedVariantSnapshot;

/// Snapshot row storage. `insert_if_absent` is keyed on
/// `(report_id, identity_digest)` and reports whether the row was new,
/// which is what makes pipeline replays safe.
pub trait SnapshotStore: Send + Sync {
    fn insert_if_absent(&self, row: ReportedVariantSnapshot) -> Result<bool, StoreError>;

    fn rows_for_report(&self, report_id: &str)
    -> Result<Vec<ReportedVariantSnapshot>, StoreError>;

    /// All snapshot rows ever written for a sample, in write order. This
    /// backs the reported-history view: report-time truth, not current
    /// truth.
    fn history(&self, sample_id: &str) -> Result<Vec<ReportedVariantSnapshot>, StoreError>;
}

#[derive(Debug, Default)]
struct MemorySnapshots {
    rows: Vec<ReportedVariantSnapshot>,
    keys: HashSet<(String, String)>,
}

#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    inner: Mutex<MemorySnapshots>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemorySnapshots> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn insert_if_absent(&self, row: ReportedVariantSnapshot) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let key = (row.report_id.clone(), row.identity_digest.clone());
        if !inner.keys.insert(key) {
            return Ok(false);
        }
        inner.rows.push(row);
        Ok(true)
    }

    fn rows_for_report(
        &self,
        report_id: &str,
    ) -> Result<Vec<ReportedVariantSnapshot>, StoreError> {
        Ok(self
            .lock()
            .rows
            .iter()
            .filter(|r| r.report_id == report_id)
            .cloned()
            .collect())
    }

    fn history(&self, sample_id: &str) -> Result<Vec<ReportedVariantSnapshot>, StoreError> {
        Ok(self
            .lock()
            .rows
            .iter()
            .filter(|r| r.sample_id == sample_id)
            .cloned()
            .collect())
    }
}

/// Writes a report's snapshot rows, tolerating partial failure.
///
/// The artifact and the sample's report entry are the source of truth for
/// a finalized report; a missing snapshot row degrades traceability but
/// must not fail an otherwise successful report. Failures are therefore
/// logged and skipped, and the caller learns how many rows were newly
/// written.
pub struct SnapshotWriter<'s, S: SnapshotStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: SnapshotStore + ?Sized> SnapshotWriter<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    pub fn write(&self, report_id: &str, rows: Vec<ReportedVariantSnapshot>) -> usize {
        let mut written = 0;
        for row in rows {
            let label = row.identity.label();
            match self.store.insert_if_absent(row) {
                Ok(true) => written += 1,
                Ok(false) => {
                    log::debug!("snapshot row for {label} already present in {report_id}");
                }
                Err(e) => {
                    log::warn!("snapshot write for {label} in {report_id} failed: {e}");
                }
            }
        }
        written
    }
}
