use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-enrollment serialization point for the allocate + append unit.
///
/// Two submissions for the same enrollment queue behind one async mutex;
/// different enrollments get different mutexes and never contend.
#[derive(Debug, Clone, Default)]
pub struct EnrollmentLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

/// Held for the duration of one ledger-mutating operation
pub type EnrollmentGuard = OwnedMutexGuard<()>;

impl EnrollmentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to an enrollment's ledger
    pub async fn acquire(&self, enrollment_id: &str) -> EnrollmentGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

            // Drop mutexes nobody is holding or waiting on
            if locks.len() > 1024 {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }

            locks
                .entry(enrollment_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        lock.lock_owned().await
    }

    /// Number of enrollments with a live mutex
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
