/*
 * vthreads - user-space preemptive threads on a single OS thread
 *
 * Many logical threads of execution are multiplexed onto the OS thread
 * that calls init. Scheduling is strict round-robin, driven by a
 * virtual-time interval timer: when the running thread has consumed its
 * quantum of process execution time, it is suspended and the next ready
 * thread resumes. Threads can be spawned, terminated, blocked, resumed
 * and put to sleep for a number of quanta.
 *
 * This module is the public facade: it validates arguments, enforces the
 * main-thread protections, and translates scheduler results into the
 * numeric return contract (0 or an id on success, -1 on failure, with
 * one diagnostic line per error). The mechanics live in the scheduler
 * module.
 */

mod arch;
mod error;
mod scheduler;

pub use error::ThreadError;

use scheduler::thread::ThreadId;

/// Maximum number of concurrently live threads, the main thread included.
pub const MAX_THREADS: usize = 100;

/// Stack size of a spawned thread, in bytes.
pub const STACK_SIZE: usize = 64 * 1024;

fn fail(err: ThreadError) -> i32 {
    error::report(err);
    -1
}

fn checked_tid(tid: i32) -> Result<ThreadId, ThreadError> {
    usize::try_from(tid)
        .ok()
        .filter(|&slot| slot < MAX_THREADS)
        .map(ThreadId)
        .ok_or(ThreadError::NoSuchThread)
}

/// Initialize the library. The calling thread becomes thread 0, the
/// first running thread, and the preemption timer starts counting its
/// first quantum of `quantum_usecs` microseconds of virtual time.
///
/// Returns 0, or -1 if the quantum is not positive or the library is
/// already initialized.
pub fn init(quantum_usecs: i32) -> i32 {
    if quantum_usecs <= 0 {
        return fail(ThreadError::BadQuantum);
    }
    match scheduler::init(quantum_usecs as u32) {
        Ok(()) => 0,
        Err(err) => fail(err),
    }
}

/// Spawn a new thread that runs `entry` once it is first dispatched. A
/// thread whose entry function returns is terminated as if it had called
/// `terminate` on itself.
///
/// Returns the new thread id (the lowest free slot), or -1 if every slot
/// is taken.
pub fn spawn(entry: fn()) -> i32 {
    match scheduler::spawn(entry) {
        Ok(tid) => tid.0 as i32,
        Err(err) => fail(err),
    }
}

/// Terminate the given thread and release its resources; its id becomes
/// reusable. Terminating the running thread never returns to it.
/// Terminating thread 0 shuts the library down and exits the process
/// with code 0.
///
/// Returns 0, or -1 if no such thread exists or the library is not
/// initialized.
pub fn terminate(tid: i32) -> i32 {
    if tid == 0 {
        // shutdown comes back only when the library is not live
        return fail(scheduler::shutdown());
    }
    match checked_tid(tid).and_then(scheduler::terminate) {
        Ok(()) => 0,
        Err(err) => fail(err),
    }
}

/// Move the given thread into the blocked state; it runs again only
/// after `resume`. Blocking the running thread yields immediately.
/// Blocking an already blocked thread is allowed and changes nothing.
///
/// Returns 0, or -1 for the main thread or a dead id.
pub fn block(tid: i32) -> i32 {
    if tid == 0 {
        return fail(ThreadError::BlockMain);
    }
    match checked_tid(tid).and_then(|tid| scheduler::block(tid, false)) {
        Ok(()) => 0,
        Err(err) => fail(err),
    }
}

/// Clear the given thread's blocked flag and, unless it is still inside
/// a sleep, make it runnable again. Resuming a thread that is not
/// blocked is a no-op.
///
/// Returns 0, or -1 if no such thread exists.
pub fn resume(tid: i32) -> i32 {
    match checked_tid(tid).and_then(scheduler::resume) {
        Ok(()) => 0,
        Err(err) => fail(err),
    }
}

/// Put the calling thread to sleep for `num_quantums` quanta of virtual
/// time. The deadline is measured against the global quantum counter,
/// so the call returns only after at least that many quanta have been
/// dispatched. The main thread cannot sleep.
///
/// Returns 0, or -1 if the count is not positive or the caller is the
/// main thread.
pub fn sleep(num_quantums: i32) -> i32 {
    if num_quantums <= 0 {
        return fail(ThreadError::BadQuantum);
    }
    match scheduler::sleep(num_quantums as u64) {
        Ok(()) => 0,
        Err(err) => fail(err),
    }
}

/// Id of the calling thread.
pub fn get_tid() -> i32 {
    match scheduler::current_tid() {
        Ok(tid) => tid.0 as i32,
        Err(err) => fail(err),
    }
}

/// Total number of quanta since init, the current one included. Starts
/// at 1 and advances by exactly one per dispatch.
pub fn get_total_quantums() -> i32 {
    match scheduler::total_quanta() {
        Ok(total) => total as i32,
        Err(err) => fail(err),
    }
}

/// Number of quanta during which the given thread has run, the current
/// one included for the running thread.
///
/// Returns the count, or -1 if no such thread exists.
pub fn get_quantums(tid: i32) -> i32 {
    match checked_tid(tid).and_then(scheduler::thread_quanta) {
        Ok(count) => count as i32,
        Err(err) => fail(err),
    }
}
