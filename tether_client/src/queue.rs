// Outbound queue: the only mutable state shared between caller threads and
// the send duty.
//
// Two FIFO lanes (placements, updates) plus an auto-reset wake signal and a
// session-close flag, all under one mutex with a condvar. Callers enqueue
// from any thread without blocking; exactly one send duty drains at a time
// (multi-writer / single-reader, so only the writer side needs to contend).
// `wait_for_work` is the send duty's sole blocking point.
//
// The queue outlives sessions. On close the flag wakes the send duty, and
// whatever is still queued is drained by the next session after `reopen`.
// The close signal takes priority over pending work so a dying session
// never drains items that belong to its successor.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tether_protocol::{ObjectId, Pose};

/// Why `wait_for_work` returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Wake {
    /// At least one enqueue happened since the last wait.
    Work,
    /// The session-close signal fired.
    Closed,
    /// Neither; the timeout elapsed.
    TimedOut,
}

#[derive(Default)]
struct Inner {
    placements: VecDeque<Pose>,
    updates: VecDeque<(ObjectId, Pose)>,
    signaled: bool,
    closed: bool,
}

pub(crate) struct OutboundQueue {
    inner: Mutex<Inner>,
    wake: Condvar,
}

impl OutboundQueue {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            wake: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Poison only ever means an enqueuer panicked mid-push; the deques
        // stay coherent, so waiters continue.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn enqueue_placement(&self, pose: Pose) {
        let mut inner = self.lock();
        inner.placements.push_back(pose);
        inner.signaled = true;
        self.wake.notify_one();
    }

    pub(crate) fn enqueue_update(&self, id: ObjectId, pose: Pose) {
        let mut inner = self.lock();
        inner.updates.push_back((id, pose));
        inner.signaled = true;
        self.wake.notify_one();
    }

    /// Pop everything queued at the time of the call. Enqueues that race
    /// this drain land in the next pass.
    pub(crate) fn drain_placements(&self) -> VecDeque<Pose> {
        std::mem::take(&mut self.lock().placements)
    }

    pub(crate) fn drain_updates(&self) -> VecDeque<(ObjectId, Pose)> {
        std::mem::take(&mut self.lock().updates)
    }

    /// Put a drained-but-unsent tail back at the queue front, in order, so
    /// a mid-drain socket death loses nothing but the failed item itself.
    pub(crate) fn requeue_placements(&self, items: VecDeque<Pose>) {
        let mut inner = self.lock();
        for item in items.into_iter().rev() {
            inner.placements.push_front(item);
        }
        inner.signaled = true;
    }

    pub(crate) fn requeue_updates(&self, items: VecDeque<(ObjectId, Pose)>) {
        let mut inner = self.lock();
        for item in items.into_iter().rev() {
            inner.updates.push_front(item);
        }
        inner.signaled = true;
    }

    /// Block until an enqueue since the last wait, the close signal, or the
    /// timeout — whichever comes first. Close wins over pending work.
    pub(crate) fn wait_for_work(&self, timeout: Duration) -> Wake {
        let deadline = Instant::now() + timeout;
        let mut inner = self.lock();
        loop {
            if inner.closed {
                return Wake::Closed;
            }
            if inner.signaled {
                inner.signaled = false;
                return Wake::Work;
            }
            let now = Instant::now();
            if now >= deadline {
                return Wake::TimedOut;
            }
            let (guard, _) = self
                .wake
                .wait_timeout(inner, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            inner = guard;
        }
    }

    /// Mark the current session dead and wake the send duty.
    pub(crate) fn signal_close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        self.wake.notify_all();
    }

    /// Arm the queue for a new session. Items left over from the previous
    /// session re-signal so the first wait drains them immediately.
    pub(crate) fn reopen(&self) {
        let mut inner = self.lock();
        inner.closed = false;
        if !inner.placements.is_empty() || !inner.updates.is_empty() {
            inner.signaled = true;
        }
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        let inner = self.lock();
        inner.placements.is_empty() && inner.updates.is_empty()
    }
}
