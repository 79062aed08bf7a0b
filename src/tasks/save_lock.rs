//! Save Lock
//!
//! Process-wide exclusive gate held by maintenance jobs while the server's
//! automatic saving is suspended.

use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Binary lock serializing save-suspending jobs.
#[derive(Debug)]
pub struct SaveLock {
    semaphore: Semaphore,
}

/// Proof of holding the [`SaveLock`]; released on drop.
#[derive(Debug)]
pub struct SaveLockGuard<'a> {
    _permit: SemaphorePermit<'a>,
}

impl SaveLock {
    pub fn new() -> Self {
        Self {
            semaphore: Semaphore::new(1),
        }
    }

    /// Waits for the lock. Returns `None` if `cancel` fires first, in which
    /// case nothing is held.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Option<SaveLockGuard<'_>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            permit = self.semaphore.acquire() => {
                trace!("Save lock acquired");
                permit.ok().map(|permit| SaveLockGuard { _permit: permit })
            }
        }
    }

    /// Takes the lock only if it is free right now.
    pub fn try_acquire(&self) -> Option<SaveLockGuard<'_>> {
        self.semaphore
            .try_acquire()
            .ok()
            .map(|permit| SaveLockGuard { _permit: permit })
    }

    /// True while some job holds the lock.
    pub fn is_held(&self) -> bool {
        self.semaphore.available_permits() == 0
    }
}

impl Default for SaveLock {
    fn default() -> Self {
        Self::new()
    }
}
