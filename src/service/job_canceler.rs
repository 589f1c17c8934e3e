use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::domain::models::JobId;

/// Cooperative cancellation flags for running crawl attempts.
///
/// Each attempt registers a fresh flag, so a retry never inherits the
/// cancellation of the attempt before it.
pub struct JobCanceler {
    running: DashMap<JobId, Arc<AtomicBool>>,
}

impl JobCanceler {
    pub fn new() -> Self {
        Self {
            running: DashMap::with_capacity(10),
        }
    }

    /// Install a new, unraised flag for an attempt of `job_id`.
    pub fn register(&self, job_id: &str) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        self.running.insert(job_id.to_string(), flag.clone());
        flag
    }

    /// Raise the flag of a running attempt. Returns false when `job_id` has
    /// no running attempt.
    pub fn cancel(&self, job_id: &str) -> bool {
        match self.running.get(job_id) {
            Some(flag) => {
                flag.store(true, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Drop the flag of a finished attempt. A newer attempt's flag stays.
    pub fn release(&self, job_id: &str, flag: &Arc<AtomicBool>) {
        self.running
            .remove_if(job_id, |_, current| Arc::ptr_eq(current, flag));
    }

    /// Raise every flag not yet raised. Returns how many were.
    pub fn cancel_all(&self) -> usize {
        self.running
            .iter()
            .filter(|flag| !flag.swap(true, Ordering::Relaxed))
            .count()
    }
}

impl Default for JobCanceler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_raises_the_registered_flag() {
        let canceler = JobCanceler::new();
        let flag = canceler.register("job-1");
        assert!(!flag.load(Ordering::Relaxed));

        assert!(canceler.cancel("job-1"));
        assert!(flag.load(Ordering::Relaxed));
        assert!(!canceler.cancel("job-2"));
    }

    #[test]
    fn new_attempt_gets_a_fresh_flag() {
        let canceler = JobCanceler::new();
        let first = canceler.register("job-1");
        canceler.cancel("job-1");

        let second = canceler.register("job-1");
        assert!(first.load(Ordering::Relaxed));
        assert!(!second.load(Ordering::Relaxed));
    }

    #[test]
    fn release_forgets_the_attempt() {
        let canceler = JobCanceler::new();
        let flag = canceler.register("job-1");
        canceler.release("job-1", &flag);
        assert!(!canceler.cancel("job-1"));
    }

    #[test]
    fn stale_release_keeps_the_newer_attempt() {
        let canceler = JobCanceler::new();
        let old = canceler.register("job-1");
        let current = canceler.register("job-1");

        canceler.release("job-1", &old);
        assert!(canceler.cancel("job-1"));
        assert!(current.load(Ordering::Relaxed));
    }

    #[test]
    fn cancel_all_counts_newly_raised_flags() {
        let canceler = JobCanceler::new();
        canceler.register("a");
        let b = canceler.register("b");
        canceler.cancel("a");
        assert_eq!(canceler.cancel_all(), 1);
        assert!(b.load(Ordering::Relaxed));
    }
}
