/*
 * Thread control block.
 *
 * This module defines the Thread structure and related types for the
 * preemptive scheduler. A Thread is pure data: all mutation happens
 * under the scheduler's critical-section guard, so no field needs its
 * own synchronization.
 */

use std::fmt;

use super::context::ThreadContext;
use crate::STACK_SIZE;

/// Thread identifier: the thread's slot index in the scheduler table.
/// Assigned as the lowest unused slot at spawn time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ThreadId(pub usize);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thread({})", self.0)
    }
}

/// Thread state. Exactly one thread is Running at any moment once
/// initialization completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Ready,
    Running,
    Blocked,
}

/// One logical thread.
///
/// Every spawned thread owns a fixed-size stack; the main thread (id 0)
/// reuses the process stack and owns none. The saved context is written
/// on preemption and read on resumption.
pub(crate) struct Thread {
    pub id: ThreadId,
    pub state: ThreadState,
    /// Stack buffer, never aliased; `None` for the main thread.
    pub stack: Option<Box<[u8]>>,
    pub context: ThreadContext,
    /// Quanta during which this thread has been the running thread,
    /// including the current one.
    pub quantum_count: u64,
    /// Absolute quantum number before which this thread must not run.
    pub sleep_until: Option<u64>,
    /// Set by an explicit block call, cleared by resume. A sleeping
    /// thread with this flag set stays blocked past its deadline.
    pub user_blocked: bool,
    /// Entry point, taken by the trampoline on first dispatch.
    pub entry: Option<fn()>,
}

impl Thread {
    /// TCB for the main thread: runs on the process stack, created in
    /// the Running state.
    pub(crate) fn main() -> Self {
        Self {
            id: ThreadId(0),
            state: ThreadState::Running,
            stack: None,
            context: ThreadContext::empty(),
            quantum_count: 0,
            sleep_until: None,
            user_blocked: false,
            entry: None,
        }
    }

    /// TCB for a spawned thread: owns a fresh stack and begins at
    /// `entry` on its first dispatch.
    pub(crate) fn spawned(id: ThreadId, entry: fn()) -> Self {
        let mut stack = vec![0u8; STACK_SIZE].into_boxed_slice();
        let context = ThreadContext::for_entry(&mut stack);
        Self {
            id,
            state: ThreadState::Ready,
            stack: Some(stack),
            context,
            quantum_count: 0,
            sleep_until: None,
            user_blocked: false,
            entry: Some(entry),
        }
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("stack_size", &self.stack.as_ref().map_or(0, |s| s.len()))
            .field("quantum_count", &self.quantum_count)
            .field("sleep_until", &self.sleep_until)
            .field("user_blocked", &self.user_blocked)
            .finish()
    }
}
