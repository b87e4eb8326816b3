/*
 * Critical-section guard.
 *
 * Scheduler state is shared between ordinary calls and the preemption
 * signal handler on the same OS thread. Every scheduler operation masks
 * the preemption signal for its whole duration, so state transitions are
 * atomic with respect to preemption; a tick that lands while masked is
 * deferred by the kernel, not lost.
 *
 * The guard nests: an operation that reaches dispatch through block or
 * sleep holds more than one level, and only the outermost release
 * unmasks. The depth counter is process-global while the continuation
 * that unwinds it is per-thread, so a context transfer re-establishes
 * the depth captured with the context (see ThreadContext).
 */

use std::sync::atomic::{AtomicU32, Ordering};

use crate::scheduler::timer::PREEMPT_SIGNAL;

/// Nesting depth. Zero means the preemption signal is deliverable.
static DEPTH: AtomicU32 = AtomicU32::new(0);

fn preempt_sigset() -> libc::sigset_t {
    unsafe {
        let mut set = std::mem::zeroed();
        libc::sigemptyset(&mut set);
        libc::sigaddset(&mut set, PREEMPT_SIGNAL);
        set
    }
}

/// Mask or unmask the preemption signal for the (sole) OS thread.
fn set_mask(how: libc::c_int) {
    let set = preempt_sigset();
    unsafe { libc::sigprocmask(how, &set, std::ptr::null_mut()) };
}

/// Enter the critical section.
///
/// A tick that lands between the depth check and the mask syscall simply
/// preempts us here: no scheduler state is held yet, and the resumed
/// continuation finishes entering as if nothing happened.
pub(crate) fn enter() {
    if DEPTH.load(Ordering::SeqCst) == 0 {
        set_mask(libc::SIG_BLOCK);
    }
    DEPTH.fetch_add(1, Ordering::SeqCst);
}

/// Leave the critical section; the outermost release unmasks.
pub(crate) fn exit() {
    let depth = DEPTH.fetch_sub(1, Ordering::SeqCst);
    debug_assert!(depth > 0, "guard released more often than entered");
    if depth == 1 {
        set_mask(libc::SIG_UNBLOCK);
    }
}

/// Depth as captured alongside a thread context.
pub(crate) fn depth() -> u32 {
    DEPTH.load(Ordering::SeqCst)
}

/// Re-establish the depth captured with a context about to be resumed.
/// Called with the preemption signal masked, immediately before the jump.
pub(crate) fn set_depth(depth: u32) {
    DEPTH.store(depth, Ordering::SeqCst);
}

/// RAII handle for the critical section; release happens on every exit
/// path of the scope that holds it.
pub(crate) struct SignalGuard(());

impl SignalGuard {
    pub(crate) fn new() -> Self {
        enter();
        SignalGuard(())
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        exit();
    }
}
