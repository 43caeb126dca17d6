//! execution lock
//!
//! the resource being protected is the signer's nonce and the relayer's
//! view of it, which are process-wide. two overlapping submissions (a
//! double click, a remount retrying) would sign the same nonce twice.
//! holding an [`ExecutionGuard`] is the only way to run an execution, and
//! dropping it is the only way to release one.

use std::sync::{Arc, OnceLock};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

static GLOBAL: OnceLock<ExecutionLock> = OnceLock::new();

/// single-permit gate; clones share the same permit
#[derive(Clone, Debug)]
pub struct ExecutionLock {
    permit: Arc<Semaphore>,
}

/// held for the lifetime of one execution
#[derive(Debug)]
pub struct ExecutionGuard {
    _permit: OwnedSemaphorePermit,
}

impl ExecutionLock {
    pub fn new() -> Self {
        Self {
            permit: Arc::new(Semaphore::new(1)),
        }
    }

    /// the process-wide instance
    pub fn global() -> Self {
        GLOBAL.get_or_init(ExecutionLock::new).clone()
    }

    /// non-blocking: `None` while another execution holds the lock
    pub fn try_acquire(&self) -> Option<ExecutionGuard> {
        self.permit
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| ExecutionGuard { _permit: permit })
    }

    pub fn is_locked(&self) -> bool {
        self.permit.available_permits() == 0
    }
}

impl Default for ExecutionLock {
    fn default() -> Self {
        Self::new()
    }
}
