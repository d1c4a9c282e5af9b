// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session single-flight locks.
//!
//! Two connections on the same session id take turns instead of interleaving
//! their appends. Entries exist only while some turn holds or awaits them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed mutex map, one entry per session with a turn in flight.
#[derive(Debug, Default)]
pub struct SessionLocks {
    inner: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other turn holds `session_id`, then holds it until the
    /// returned guard is dropped.
    pub async fn acquire(&self, session_id: &str) -> SessionGuard<'_> {
        let mutex = self
            .inner
            .entry(session_id.to_string())
            .or_default()
            .clone();
        let guard = mutex.lock_owned().await;
        SessionGuard {
            locks: self,
            session_id: session_id.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of sessions with a turn in flight or waiting.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Held for the duration of one turn.
#[derive(Debug)]
pub struct SessionGuard<'a> {
    locks: &'a SessionLocks,
    session_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        // Release before checking the count: the guard holds an Arc too.
        self.guard.take();
        self.locks
            .inner
            .remove_if(&self.session_id, |_, m| Arc::strong_count(m) == 1);
    }
}
