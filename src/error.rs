/*
 * Error taxonomy and the diagnostics channel.
 *
 * Scheduler operations return typed errors; the public API facade maps
 * them to the numeric contract (-1) after reporting them here. User
 * errors and system-call failures go to separate one-line prefixes on
 * stderr so callers can tell a bad argument from a failing syscall.
 */

use thiserror::Error;

/// Errors returned by scheduler operations to the public API facade.
///
/// None of these abort the process and none of them leave scheduler
/// state half-changed: an operation that fails performs no transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ThreadError {
    /// A quantum length or sleep duration was zero or negative.
    #[error("quantum must be a positive number")]
    BadQuantum,
    /// The thread id does not reference a live thread.
    #[error("no thread with the given id exists")]
    NoSuchThread,
    /// The main thread (id 0) cannot be blocked.
    #[error("cannot block the main thread")]
    BlockMain,
    /// The main thread (id 0) cannot be put to sleep.
    #[error("cannot put the main thread to sleep")]
    SleepMain,
    /// Every thread table slot is occupied.
    #[error("maximum number of threads exceeded")]
    TooManyThreads,
    /// An operation other than init was called before init.
    #[error("the thread library is not initialized")]
    NotInitialized,
    /// init was called while a scheduler is already live.
    #[error("the thread library is already initialized")]
    AlreadyInitialized,
}

/// Report a user error on the diagnostics channel, one line per error.
pub(crate) fn report(err: ThreadError) {
    eprintln!("thread library error: {err}.");
}

/// Report a system-call failure on the diagnostics channel.
///
/// System errors do not unwind the library; the caller decides whether
/// the failure is survivable.
pub(crate) fn report_system(what: &str) {
    let errno = std::io::Error::last_os_error();
    eprintln!("system error: {what} failed: {errno}.");
}
