// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forwarding objects and the per-operation synchronization policy.
//!
//! A [`Forwarder`] owns one native handle and holds a reference to the lock of
//! its connection family. Each public operation on [`Connection`] and
//! [`Cursor`] names its [`Policy`] when it forwards to the native handle.
//!
//! [`Connection`]: crate::Connection
//! [`Cursor`]: crate::Cursor

use std::sync::{Arc, Mutex};

use asqlite3_core::AsqliteError;
use tracing::trace;

use crate::lock::SharedLock;
use crate::offload::offload;

/// How an operation reaches the native handle.
///
/// Pure local reads never go through a forwarder; they read published state directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Policy {
    /// Run on a worker thread without taking the family lock.
    Offload,
    /// Take the family lock, then run on a worker thread. The lock is held
    /// until the engine call returns, even if the awaiting task is cancelled.
    Locked,
}

pub(crate) struct Forwarder<H> {
    handle: Arc<Mutex<H>>,
    lock: SharedLock,
}

impl<H> Clone for Forwarder<H> {
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
            lock: self.lock.clone(),
        }
    }
}

impl<H: Send + 'static> Forwarder<H> {
    pub(crate) fn new(handle: H, lock: SharedLock) -> Self {
        Self {
            handle: Arc::new(Mutex::new(handle)),
            lock,
        }
    }

    pub(crate) fn lock(&self) -> &SharedLock {
        &self.lock
    }

    pub(crate) fn handle(&self) -> &Arc<Mutex<H>> {
        &self.handle
    }

    /// Wrap a child handle produced by this object. The child shares this lock.
    pub(crate) fn child<C: Send + 'static>(&self, handle: C) -> Forwarder<C> {
        Forwarder::new(handle, self.lock.clone())
    }

    /// Apply `policy` and run `f` against the native handle.
    pub(crate) async fn forward<F, R>(
        &self,
        op: &'static str,
        policy: Policy,
        f: F,
    ) -> Result<R, AsqliteError>
    where
        F: FnOnce(&mut H) -> Result<R, AsqliteError> + Send + 'static,
        R: Send + 'static,
    {
        trace!(op, ?policy, "forwarding");
        match policy {
            Policy::Offload => offload(&self.handle, f).await,
            Policy::Locked => {
                let guard = self.lock.acquire().await?;
                offload(&self.handle, move |handle| {
                    let _guard = guard;
                    f(handle)
                })
                .await
            }
        }
    }
}
