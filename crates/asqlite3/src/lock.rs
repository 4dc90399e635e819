// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The lock shared by a connection and every cursor derived from it.
//!
//! A single-permit [`Semaphore`]: at most one holder, waiters granted in the
//! order they queued, and a cancelled waiter simply leaves the queue.

use std::fmt;
use std::sync::Arc;

use asqlite3_core::AsqliteError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::trace;

/// Binary async mutex shared by reference across a connection family.
///
/// Cloning yields another reference to the same lock.
#[derive(Clone)]
pub struct SharedLock {
    permit: Arc<Semaphore>,
}

/// Scoped ownership of a [`SharedLock`]. Dropping it releases the lock.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    _permit: OwnedSemaphorePermit,
}

impl SharedLock {
    /// A fresh, unlocked lock.
    pub fn new() -> Self {
        Self {
            permit: Arc::new(Semaphore::new(1)),
        }
    }

    /// Wait until the lock is free and take it.
    pub async fn acquire(&self) -> Result<LockGuard, AsqliteError> {
        if self.is_locked() {
            trace!("waiting for connection lock");
        }
        let permit = Arc::clone(&self.permit)
            .acquire_owned()
            .await
            .map_err(|_| AsqliteError::Internal("connection lock was closed".to_string()))?;
        Ok(LockGuard { _permit: permit })
    }

    /// Take the lock only if nobody holds it and nobody is queued ahead.
    pub fn try_acquire(&self) -> Option<LockGuard> {
        match Arc::clone(&self.permit).try_acquire_owned() {
            Ok(permit) => Some(LockGuard { _permit: permit }),
            Err(TryAcquireError::NoPermits | TryAcquireError::Closed) => None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.permit.available_permits() == 0
    }

    /// Whether both values refer to the same lock.
    pub fn same_as(&self, other: &SharedLock) -> bool {
        Arc::ptr_eq(&self.permit, &other.permit)
    }
}

impl Default for SharedLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedLock")
            .field("locked", &self.is_locked())
            .finish()
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").finish_non_exhaustive()
    }
}
