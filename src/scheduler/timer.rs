/*
 * Timer and signal binding.
 *
 * Preemption is driven by a virtual-time interval timer: ITIMER_VIRTUAL
 * counts down only while the process is actually executing, and raises
 * SIGVTALRM on expiry. The timer is armed one-shot for a single quantum
 * and re-armed on every dispatch, so a thread that yields early still
 * grants its successor a full quantum.
 */

use crate::error;

/// The preemption signal, raised when the virtual-time quantum expires.
pub(crate) const PREEMPT_SIGNAL: libc::c_int = libc::SIGVTALRM;

extern "C" fn alarm_handler(_signal: libc::c_int) {
    // The kernel delivers this with the preemption signal already
    // blocked; the guard taken inside preempt keeps the masking
    // discipline uniform across entry points.
    crate::scheduler::preempt();
}

/// Install the preemption signal handler.
///
/// A failure is reported; the library is unusable without a handler but
/// does not unwind.
pub(crate) fn install_handler() {
    let handler: extern "C" fn(libc::c_int) = alarm_handler;
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handler as usize;
        action.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut action.sa_mask);
        if libc::sigaction(PREEMPT_SIGNAL, &action, std::ptr::null_mut()) != 0 {
            error::report_system("sigaction");
        }
    }
}

/// Arm the one-shot virtual-time timer for one quantum.
///
/// A failure is reported and skipped: the missed tick only delays the
/// preemption of that quantum.
pub(crate) fn arm(quantum_usecs: u32) {
    let timer = libc::itimerval {
        it_interval: libc::timeval {
            tv_sec: 0,
            tv_usec: 0,
        },
        it_value: libc::timeval {
            tv_sec: (quantum_usecs / 1_000_000) as libc::time_t,
            tv_usec: (quantum_usecs % 1_000_000) as libc::suseconds_t,
        },
    };
    if unsafe { libc::setitimer(libc::ITIMER_VIRTUAL, &timer, std::ptr::null_mut()) } != 0 {
        error::report_system("setitimer");
    }
}

/// Stop the timer; used on shutdown.
pub(crate) fn disarm() {
    let stopped: libc::itimerval = unsafe { std::mem::zeroed() };
    if unsafe { libc::setitimer(libc::ITIMER_VIRTUAL, &stopped, std::ptr::null_mut()) } != 0 {
        error::report_system("setitimer");
    }
}
