//! Sample store interface and in-memory implementations.
//!
//! The store is the coordination point between concurrent report
//! requests: `allocate_report_num` is the one operation that must be
//! atomic. Everything else on the sample is last-writer-wins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use vartier_core::errors::StoreError;
use vartier_core::models::{ReportEntry, Sample};

/// Mutable sample repository.
///
/// `allocate_report_num` performs the read-and-increment of the sample's
/// report counter as one atomic operation against the backing store, so
/// two concurrent callers can never both observe the same value. Stores
/// that allocate optimistically (compare-and-swap, uniqueness index on
/// `(sample, report_num)`) signal a lost race with `StoreError::Conflict`
/// and the sequencer retries. `append_report_entry` is idempotent on the
/// entry's `report_id`.
pub trait SampleStore: Send + Sync {
    fn get(&self, sample_id: &str) -> Result<Option<Sample>, StoreError>;

    fn allocate_report_num(&self, sample_id: &str) -> Result<u32, StoreError>;

    fn append_report_entry(&self, sample_id: &str, entry: ReportEntry) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemorySampleStore {
    samples: Mutex<HashMap<String, Sample>>,
}

impl MemorySampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, sample: Sample) {
        let mut samples = self.lock();
        samples.insert(sample.id.clone(), sample);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Sample>> {
        self.samples.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SampleStore for MemorySampleStore {
    fn get(&self, sample_id: &str) -> Result<Option<Sample>, StoreError> {
        Ok(self.lock().get(sample_id).cloned())
    }

    fn allocate_report_num(&self, sample_id: &str) -> Result<u32, StoreError> {
        let mut samples = self.lock();
        let sample = samples
            .get_mut(sample_id)
            .ok_or_else(|| StoreError::NotFound(sample_id.to_string()))?;
        // Increment under the same lock as the read; the returned number
        // is consumed whether or not the caller's report survives.
        sample.report_num += 1;
        Ok(sample.report_num)
    }

    fn append_report_entry(&self, sample_id: &str, entry: ReportEntry) -> Result<(), StoreError> {
        let mut samples = self.lock();
        let sample = samples
            .get_mut(sample_id)
            .ok_or_else(|| StoreError::NotFound(sample_id.to_string()))?;
        if sample.reports.iter().any(|r| r.report_id == entry.report_id) {
            log::debug!("report entry {} already appended, skipping", entry.report_id);
            return Ok(());
        }
        sample.reports.push(entry);
        Ok(())
    }
}

/// Fault-injecting wrapper for exercising retry and resume paths:
/// the first `n` allocations lose the race, the first `n` appends fail
/// mid-pipeline.
pub struct FlakySampleStore<S: SampleStore> {
    inner: S,
    allocation_conflicts: AtomicUsize,
    append_failures: AtomicUsize,
}

impl<S: SampleStore> FlakySampleStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            allocation_conflicts: AtomicUsize::new(0),
            append_failures: AtomicUsize::new(0),
        }
    }

    pub fn conflict_next_allocations(&self, n: usize) {
        self.allocation_conflicts.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_appends(&self, n: usize) {
        self.append_failures.store(n, Ordering::SeqCst);
    }

    /// The wrapped store, for seeding fixtures.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl<S: SampleStore> SampleStore for FlakySampleStore<S> {
    fn get(&self, sample_id: &str) -> Result<Option<Sample>, StoreError> {
        self.inner.get(sample_id)
    }

    fn allocate_report_num(&self, sample_id: &str) -> Result<u32, StoreError> {
        if Self::take(&self.allocation_conflicts) {
            return Err(StoreError::Conflict);
        }
        self.inner.allocate_report_num(sample_id)
    }

    fn append_report_entry(&self, sample_id: &str, entry: ReportEntry) -> Result<(), StoreError> {
        if Self::take(&self.append_failures) {
            return Err(StoreError::Corrupt("injected append failure".to_string()));
        }
        self.inner.append_report_entry(sample_id, entry)
    }
}
