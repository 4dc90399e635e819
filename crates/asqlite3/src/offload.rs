// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread-offload primitive.
//!
//! Every engine call runs on Tokio's blocking pool so the scheduler threads are
//! never stalled by SQLite I/O. Only synchronous closures are accepted: the
//! closure must return the engine result directly, so an async body cannot be
//! offloaded by mistake.

use std::panic;
use std::sync::{Arc, Mutex, MutexGuard};

use asqlite3_core::AsqliteError;
use tokio::runtime::Handle;
use tracing::trace;

/// Run `f` on a worker thread and suspend the calling task until it returns.
///
/// The closure's error is returned unchanged. A panic on the worker is resumed
/// on the awaiting task. Awaiting this outside a Tokio runtime is a usage error.
pub async fn run_blocking<F, R>(f: F) -> Result<R, AsqliteError>
where
    F: FnOnce() -> Result<R, AsqliteError> + Send + 'static,
    R: Send + 'static,
{
    let runtime = Handle::try_current().map_err(|_| {
        AsqliteError::Usage("engine calls must be awaited inside a Tokio runtime".to_string())
    })?;

    match runtime.spawn_blocking(f).await {
        Ok(result) => result,
        Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
        Err(err) => Err(AsqliteError::Worker(err.to_string())),
    }
}

/// Lock `handle` on a worker thread and run `f` against it.
pub(crate) async fn offload<H, F, R>(handle: &Arc<Mutex<H>>, f: F) -> Result<R, AsqliteError>
where
    H: Send + 'static,
    F: FnOnce(&mut H) -> Result<R, AsqliteError> + Send + 'static,
    R: Send + 'static,
{
    let handle = Arc::clone(handle);
    run_blocking(move || {
        let mut guard = lock_native(&handle)?;
        trace!("running offloaded engine call");
        f(&mut guard)
    })
    .await
}

/// Lock a native handle's mutex. Only ever called on worker threads.
pub(crate) fn lock_native<H>(handle: &Mutex<H>) -> Result<MutexGuard<'_, H>, AsqliteError> {
    handle.lock().map_err(|_| {
        AsqliteError::Internal("native handle poisoned by a panicked engine call".to_string())
    })
}
