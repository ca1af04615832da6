//! Report number allocation.
//!
//! One number per call, unique per sample, strictly increasing. Transient
//! allocation conflicts (optimistic stores losing a race) are retried with
//! exponential backoff and jitter; exhaustion fails closed. A number
//! handed out is consumed even if the caller's report never materializes:
//! gaps in the sequence are acceptable, duplicates are not.

use std::thread;
use std::time::Duration;

use rand::Rng;

use vartier_core::errors::StoreError;

use crate::errors::ReportError;
use crate::store::SampleStore;

/// Retry tunables for conflicted allocations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt: exponential in the attempt number,
    /// capped, with the upper half randomized so colliding callers spread
    /// out.
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(1u32 << attempt.min(16))
            .min(self.max_delay);
        let ms = exp.as_millis() as u64;
        let jitter = rand::rng().random_range(0..=ms / 2);
        Duration::from_millis(ms / 2 + jitter)
    }
}

pub struct ReportSequencer<'s, S: SampleStore + ?Sized> {
    store: &'s S,
    policy: RetryPolicy,
}

impl<'s, S: SampleStore + ?Sized> ReportSequencer<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self::with_policy(store, RetryPolicy::default())
    }

    pub fn with_policy(store: &'s S, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    /// Allocate the next report number for a sample.
    ///
    /// Returns `AllocationFailed` once retries are exhausted; by then no
    /// number has been consumed by this caller, so retrying the whole
    /// operation later is safe.
    pub fn next_report_number(&self, sample_id: &str) -> Result<u32, ReportError> {
        for attempt in 1..=self.policy.max_attempts {
            match self.store.allocate_report_num(sample_id) {
                Ok(num) => {
                    if attempt > 1 {
                        log::debug!(
                            "report number {num} for {sample_id} allocated on attempt {attempt}"
                        );
                    }
                    return Ok(num);
                }
                Err(StoreError::Conflict) if attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    log::debug!(
                        "allocation conflict for {sample_id} on attempt {attempt}, retrying in {delay:?}"
                    );
                    thread::sleep(delay);
                }
                Err(StoreError::Conflict) => {
                    return Err(ReportError::AllocationFailed {
                        sample_id: sample_id.to_string(),
                        attempts: self.policy.max_attempts,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
        // max_attempts >= 1 means the loop always returns; guard against a
        // zero-attempt policy anyway.
        Err(ReportError::AllocationFailed {
            sample_id: sample_id.to_string(),
            attempts: self.policy.max_attempts,
        })
    }
}
