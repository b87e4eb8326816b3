/*
 * Preemptive Round-Robin Scheduler
 *
 * This module multiplexes many logical threads onto the one OS thread
 * the library runs on. Scheduling is driven by a virtual-time interval
 * timer: when the quantum expires, SIGVTALRM suspends the running thread
 * and the head of the ready queue resumes.
 *
 * THREAD LIFECYCLE:
 *
 * Ready -> Running (quantum expires) -> Ready
 *   ^                                     |
 *   |                                     v
 *   +------------- Blocked <-------------+
 *
 * - Ready: waiting in the FIFO ready queue
 * - Running: executing; exactly one thread at a time
 * - Blocked: blocked by request, sleeping, or both
 *
 * OWNERSHIP:
 *
 * The thread table owns every TCB; the ready queue and the blocked and
 * sleeping sets hold ids only. A TCB is destroyed only after its table
 * slot is cleared and its id has left every container. The one exception
 * is a running thread terminating itself: its TCB is parked in `zombie`
 * and dropped at the next arrival point, after control has left the
 * dying stack.
 *
 * REENTRANCY:
 *
 * State is shared with the SIGVTALRM handler. Every entry point masks
 * the preemption signal (guard module) before taking the singleton lock,
 * and no lock guard is ever held across a context transfer. The dispatch
 * path neither logs nor allocates: it may run inside the signal handler,
 * and the logger and the allocator are not reentrant from there.
 */

use std::collections::VecDeque;

use spin::Mutex;

use crate::MAX_THREADS;
use crate::error::ThreadError;

pub(crate) mod context;
pub(crate) mod guard;
pub(crate) mod thread;
pub(crate) mod timer;

use context::{SaveOutcome, ThreadContext};
use guard::SignalGuard;
use thread::{Thread, ThreadId, ThreadState};

/// Global scheduler instance. Exactly one scheduler exists between init
/// and shutdown; every `lock()` happens with the preemption signal
/// masked.
static SCHEDULER: Mutex<Option<Scheduler>> = Mutex::new(None);

/// Run `f` on the live scheduler, or fail with NotInitialized.
fn try_with<R>(f: impl FnOnce(&mut Scheduler) -> R) -> Result<R, ThreadError> {
    let mut slot = SCHEDULER.lock();
    match slot.as_mut() {
        Some(scheduler) => Ok(f(scheduler)),
        None => Err(ThreadError::NotInitialized),
    }
}

/// Run `f` on the scheduler from a path that only exists while the
/// scheduler is live (dispatch, trampoline).
fn with_live<R>(f: impl FnOnce(&mut Scheduler) -> R) -> R {
    try_with(f).expect("scheduler is not initialized")
}

/// Main scheduler structure.
///
/// Owns the thread table and the ready/blocked/sleeping sets. All
/// methods are pure state transitions; the context transfers and the
/// timer syscalls happen in the module-level functions so that no lock
/// is held across them.
pub(crate) struct Scheduler {
    /// Slot map from id to TCB; the slot index is the thread id.
    table: [Option<Box<Thread>>; MAX_THREADS],
    /// FIFO queue of Ready threads. Dispatch pops the head; demotion and
    /// resumption append to the tail.
    ready_queue: VecDeque<ThreadId>,
    /// Threads in the Blocked state.
    blocked: Vec<ThreadId>,
    /// Blocked threads with a sleep deadline.
    sleeping: Vec<ThreadId>,
    /// The unique Running thread; None only between terminating the
    /// running thread and dispatching its successor.
    running: Option<ThreadId>,
    /// TCB of a running thread that terminated itself, parked until the
    /// successor has the CPU (its stack is in use until then).
    zombie: Option<Box<Thread>>,
    /// Quantum length in microseconds of virtual time.
    quantum_usecs: u32,
    /// Total quanta since init, the first one included. Advances by
    /// exactly one per dispatch.
    total_quanta: u64,
}

impl Scheduler {
    /// Fresh scheduler: the main thread occupies slot 0, Running, inside
    /// the library's first quantum. No dispatch happens here.
    fn new(quantum_usecs: u32) -> Self {
        let mut table = [const { None }; MAX_THREADS];
        let mut main = Box::new(Thread::main());
        main.quantum_count = 1;
        table[0] = Some(main);
        Self {
            table,
            // reserved up front: the dispatch path must never allocate
            ready_queue: VecDeque::with_capacity(MAX_THREADS),
            blocked: Vec::with_capacity(MAX_THREADS),
            sleeping: Vec::with_capacity(MAX_THREADS),
            running: Some(ThreadId(0)),
            zombie: None,
            quantum_usecs,
            total_quanta: 1,
        }
    }

    fn get(&self, tid: ThreadId) -> Result<&Thread, ThreadError> {
        self.table
            .get(tid.0)
            .and_then(|slot| slot.as_deref())
            .ok_or(ThreadError::NoSuchThread)
    }

    fn get_mut(&mut self, tid: ThreadId) -> Result<&mut Thread, ThreadError> {
        self.table
            .get_mut(tid.0)
            .and_then(|slot| slot.as_deref_mut())
            .ok_or(ThreadError::NoSuchThread)
    }

    /// Infallible lookup for ids the scheduler itself put in a container.
    fn thread(&self, tid: ThreadId) -> &Thread {
        self.table[tid.0].as_deref().expect("dead id in scheduler set")
    }

    fn thread_mut(&mut self, tid: ThreadId) -> &mut Thread {
        self.table[tid.0]
            .as_deref_mut()
            .expect("dead id in scheduler set")
    }

    fn lowest_free_id(&self) -> Option<ThreadId> {
        (0..MAX_THREADS)
            .find(|&slot| self.table[slot].is_none())
            .map(ThreadId)
    }

    /// Create a thread in the lowest free slot and append it to the
    /// ready queue.
    fn spawn(&mut self, entry: fn()) -> Result<ThreadId, ThreadError> {
        let tid = self.lowest_free_id().ok_or(ThreadError::TooManyThreads)?;
        self.table[tid.0] = Some(Box::new(Thread::spawned(tid, entry)));
        self.ready_queue.push_back(tid);
        Ok(tid)
    }

    /// Remove a thread from the table and from whichever container holds
    /// it. Returns true when the target was the running thread: its TCB
    /// is parked in `zombie` and the caller must dispatch a successor.
    fn terminate(&mut self, tid: ThreadId) -> Result<bool, ThreadError> {
        let thread = self
            .table
            .get_mut(tid.0)
            .and_then(Option::take)
            .ok_or(ThreadError::NoSuchThread)?;
        match thread.state {
            ThreadState::Running => {
                self.running = None;
                debug_assert!(self.zombie.is_none(), "unreaped zombie at terminate");
                // the dying stack is in use until dispatch hands off
                self.zombie = Some(thread);
                Ok(true)
            }
            ThreadState::Ready => {
                self.ready_queue.retain(|&t| t != tid);
                Ok(false)
            }
            ThreadState::Blocked => {
                self.blocked.retain(|&t| t != tid);
                self.sleeping.retain(|&t| t != tid);
                Ok(false)
            }
        }
    }

    /// Transition a thread into the Blocked state. Blocking an already
    /// blocked thread only updates the user flag. Returns true when the
    /// target was the running thread and the caller must dispatch.
    fn block(&mut self, tid: ThreadId, from_sleep: bool) -> Result<bool, ThreadError> {
        let thread = self.get_mut(tid)?;
        if !from_sleep {
            thread.user_blocked = true;
        }
        match thread.state {
            ThreadState::Running => {
                thread.state = ThreadState::Blocked;
                self.blocked.push(tid);
                Ok(true)
            }
            ThreadState::Ready => {
                thread.state = ThreadState::Blocked;
                self.ready_queue.retain(|&t| t != tid);
                self.blocked.push(tid);
                Ok(false)
            }
            ThreadState::Blocked => Ok(false),
        }
    }

    /// Clear the user-blocked flag and, unless the thread is still
    /// sleeping, make it runnable again. Resuming a thread that is not
    /// blocked only clears the flag.
    fn resume(&mut self, tid: ThreadId) -> Result<(), ThreadError> {
        let thread = self.get_mut(tid)?;
        thread.user_blocked = false;
        if thread.state == ThreadState::Blocked && thread.sleep_until.is_none() {
            thread.state = ThreadState::Ready;
            self.blocked.retain(|&t| t != tid);
            self.ready_queue.push_back(tid);
        }
        Ok(())
    }

    /// Stamp the running thread's sleep deadline and register it in the
    /// sleeping set; the caller blocks it and dispatches.
    fn begin_sleep(&mut self, num_quanta: u64) -> Result<ThreadId, ThreadError> {
        let tid = self.running.expect("no running thread");
        if tid.0 == 0 {
            return Err(ThreadError::SleepMain);
        }
        let deadline = self.total_quanta + num_quanta;
        self.thread_mut(tid).sleep_until = Some(deadline);
        self.sleeping.push(tid);
        Ok(tid)
    }

    /// Wake every sleeper whose deadline has arrived. A woken thread
    /// becomes Ready unless it is also user-blocked, in which case it
    /// stays Blocked awaiting an explicit resume.
    fn wake(&mut self) {
        let now = self.total_quanta;
        let mut i = 0;
        while i < self.sleeping.len() {
            let tid = self.sleeping[i];
            if self.thread(tid).sleep_until.is_none_or(|due| due > now) {
                i += 1;
                continue;
            }
            // removal replaces the current element, so the index is
            // revisited rather than advanced
            self.sleeping.swap_remove(i);
            let thread = self.thread_mut(tid);
            thread.sleep_until = None;
            if !thread.user_blocked {
                thread.state = ThreadState::Ready;
                self.blocked.retain(|&t| t != tid);
                self.ready_queue.push_back(tid);
            }
        }
    }

    /// First half of a dispatch: a running thread that is still runnable
    /// goes to the tail of the ready queue. Returns the outgoing
    /// thread's context slot for the caller to capture, or None when the
    /// outgoing thread was just terminated.
    fn demote_running(&mut self) -> Option<*mut ThreadContext> {
        let tid = self.running?;
        if self.thread(tid).state == ThreadState::Running {
            self.thread_mut(tid).state = ThreadState::Ready;
            self.ready_queue.push_back(tid);
        }
        Some(&mut self.thread_mut(tid).context as *mut ThreadContext)
    }

    /// Second half of a dispatch: pop the head of the ready queue, make
    /// it the running thread, advance the quantum counters, wake due
    /// sleepers. Returns the successor's context and the quantum to arm.
    fn switch_to_next(&mut self) -> (*const ThreadContext, u32) {
        let next = self
            .ready_queue
            .pop_front()
            .expect("ready queue empty at dispatch");
        self.running = Some(next);
        self.total_quanta += 1;
        let thread = self.thread_mut(next);
        thread.state = ThreadState::Running;
        thread.quantum_count += 1;
        self.wake();
        (
            &self.thread(next).context as *const ThreadContext,
            self.quantum_usecs,
        )
    }

    fn thread_quanta(&self, tid: ThreadId) -> Result<u64, ThreadError> {
        Ok(self.get(tid)?.quantum_count)
    }
}

/// Initialize the library: main thread TCB, signal handler, first
/// quantum. The main thread is the first running thread; no dispatch
/// happens here.
pub(crate) fn init(quantum_usecs: u32) -> Result<(), ThreadError> {
    let _guard = SignalGuard::new();
    {
        let mut slot = SCHEDULER.lock();
        if slot.is_some() {
            return Err(ThreadError::AlreadyInitialized);
        }
        *slot = Some(Scheduler::new(quantum_usecs));
    }
    timer::install_handler();
    timer::arm(quantum_usecs);
    log::info!("thread library initialized with a {quantum_usecs} us quantum");
    Ok(())
}

/// Create a new thread; it runs `entry` once dispatched.
pub(crate) fn spawn(entry: fn()) -> Result<ThreadId, ThreadError> {
    let _guard = SignalGuard::new();
    let tid = try_with(|s| s.spawn(entry))??;
    log::debug!("spawned {tid}");
    Ok(tid)
}

/// Terminate a thread. Terminating the running thread dispatches its
/// successor and never returns to the caller.
pub(crate) fn terminate(tid: ThreadId) -> Result<(), ThreadError> {
    let _guard = SignalGuard::new();
    let was_running = try_with(|s| s.terminate(tid))??;
    log::debug!("terminated {tid}");
    if was_running {
        dispatch();
        unreachable!("dispatch returned to a terminated thread");
    }
    Ok(())
}

/// Block a thread. Blocking the running thread yields; the call returns
/// once the thread has been resumed and dispatched again.
pub(crate) fn block(tid: ThreadId, from_sleep: bool) -> Result<(), ThreadError> {
    let _guard = SignalGuard::new();
    let was_running = try_with(|s| s.block(tid, from_sleep))??;
    if was_running {
        dispatch();
    }
    Ok(())
}

/// Make a blocked thread runnable again (see `Scheduler::resume`).
pub(crate) fn resume(tid: ThreadId) -> Result<(), ThreadError> {
    let _guard = SignalGuard::new();
    try_with(|s| s.resume(tid))??;
    Ok(())
}

/// Put the running thread to sleep for `num_quanta` quanta of virtual
/// time. Returns once the deadline has passed and the thread has been
/// dispatched again.
pub(crate) fn sleep(num_quanta: u64) -> Result<(), ThreadError> {
    let _guard = SignalGuard::new();
    try_with(|s| -> Result<(), ThreadError> {
        let tid = s.begin_sleep(num_quanta)?;
        s.block(tid, true)?;
        Ok(())
    })??;
    dispatch();
    Ok(())
}

/// Id of the running thread.
pub(crate) fn current_tid() -> Result<ThreadId, ThreadError> {
    let _guard = SignalGuard::new();
    try_with(|s| s.running.expect("no running thread"))
}

/// Total quanta since init.
pub(crate) fn total_quanta() -> Result<u64, ThreadError> {
    let _guard = SignalGuard::new();
    try_with(|s| s.total_quanta)
}

/// Quanta during which the given thread has run.
pub(crate) fn thread_quanta(tid: ThreadId) -> Result<u64, ThreadError> {
    let _guard = SignalGuard::new();
    try_with(|s| s.thread_quanta(tid))?
}

/// Shut the library down: mask preemption for good, stop the timer and
/// exit cleanly. TCB storage is reclaimed by process teardown; the stack
/// currently executing is never freed first.
///
/// Returns only when no scheduler is live, with the error for the
/// facade to report; otherwise the process exits with code 0.
pub(crate) fn shutdown() -> ThreadError {
    let _guard = SignalGuard::new();
    let live = SCHEDULER.lock().is_some();
    if !live {
        return ThreadError::NotInitialized;
    }
    timer::disarm();
    log::info!("thread library shut down");
    std::process::exit(0);
}

/// Preemption entry, called from the SIGVTALRM handler.
pub(crate) fn preempt() {
    let _guard = SignalGuard::new();
    let live = SCHEDULER.lock().is_some();
    if !live {
        // a stray tick delivered before init or around shutdown
        return;
    }
    dispatch();
}

/// Quantum tick: suspend the outgoing thread and transfer to the head of
/// the ready queue.
///
/// Entered with the preemption signal masked, from the alarm handler or
/// from a voluntary yield point (block, sleep, terminate). No logging
/// and no allocation on this path: it may run inside the signal handler.
pub(crate) fn dispatch() {
    debug_assert!(guard::depth() > 0, "dispatch outside the critical section");

    // Demote a still-runnable outgoing thread, then capture its context.
    // A later restore lands on the Resumed branch below.
    let outgoing = with_live(|s| s.demote_running());
    if let Some(ctx) = outgoing {
        match unsafe { (*ctx).save() } {
            SaveOutcome::Resumed => {
                // We are the thread being switched back in.
                reap_zombie();
                return;
            }
            SaveOutcome::First => {}
        }
    }

    let (next, quantum_usecs) = with_live(|s| s.switch_to_next());

    // A fresh quantum for the successor, even after a voluntary yield.
    timer::arm(quantum_usecs);

    // The transfer happens masked; the arrival code unmasks by unwinding
    // its guard levels.
    unsafe { ThreadContext::restore(next) }
}

/// Drop the TCB parked by a self-terminating thread. Called at every
/// arrival point, once control has left the dying stack.
pub(crate) fn reap_zombie() {
    let _ = with_live(|s| s.zombie.take());
}

/// Hand the trampoline its entry function on a thread's first dispatch.
pub(crate) fn take_current_entry() -> fn() {
    with_live(|s| {
        let tid = s.running.expect("no running thread");
        s.thread_mut(tid)
            .entry
            .take()
            .expect("spawned thread without an entry point")
    })
}

/// Terminate the running thread from the trampoline, after its entry
/// function returned.
pub(crate) fn exit_current() -> ! {
    guard::enter();
    let tid = with_live(|s| s.running.expect("no running thread"));
    let was_running = with_live(|s| s.terminate(tid)).expect("running thread is live");
    debug_assert!(was_running);
    dispatch();
    unreachable!("dispatch returned to a terminated thread");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parked() {}

    fn fresh() -> Scheduler {
        Scheduler::new(1_000)
    }

    /// Bookkeeping half of a dispatch; no context transfer, no timer.
    fn rotate(s: &mut Scheduler) {
        let _ = s.demote_running();
        let _ = s.switch_to_next();
    }

    fn quanta_sum(s: &Scheduler) -> u64 {
        s.table.iter().flatten().map(|t| t.quantum_count).sum()
    }

    impl Scheduler {
        fn assert_invariants(&self) {
            for slot in self.table.iter().flatten() {
                let tid = slot.id;
                let in_ready = self.ready_queue.iter().filter(|&&t| t == tid).count();
                let in_blocked = self.blocked.iter().filter(|&&t| t == tid).count();
                let is_running = self.running == Some(tid);
                match slot.state {
                    ThreadState::Running => {
                        assert!(is_running, "{tid} marked Running but not running");
                        assert_eq!((in_ready, in_blocked), (0, 0));
                    }
                    ThreadState::Ready => {
                        assert!(!is_running);
                        assert_eq!((in_ready, in_blocked), (1, 0));
                    }
                    ThreadState::Blocked => {
                        assert!(!is_running);
                        assert_eq!((in_ready, in_blocked), (0, 1));
                    }
                }
                if self.sleeping.contains(&tid) {
                    assert_eq!(slot.state, ThreadState::Blocked);
                    assert!(slot.sleep_until.is_some());
                }
            }
        }
    }

    #[test]
    fn init_starts_inside_the_first_quantum() {
        let s = fresh();
        assert_eq!(s.running, Some(ThreadId(0)));
        assert_eq!(s.total_quanta, 1);
        assert_eq!(s.thread(ThreadId(0)).quantum_count, 1);
        s.assert_invariants();
    }

    #[test]
    fn spawn_assigns_lowest_free_ids_in_order() {
        let mut s = fresh();
        assert_eq!(s.spawn(parked), Ok(ThreadId(1)));
        assert_eq!(s.spawn(parked), Ok(ThreadId(2)));
        assert_eq!(
            s.ready_queue.iter().copied().collect::<Vec<_>>(),
            vec![ThreadId(1), ThreadId(2)]
        );
        s.assert_invariants();
    }

    #[test]
    fn spawn_fails_once_every_slot_is_taken() {
        let mut s = fresh();
        for expected in 1..MAX_THREADS {
            assert_eq!(s.spawn(parked), Ok(ThreadId(expected)));
        }
        assert_eq!(s.spawn(parked), Err(ThreadError::TooManyThreads));
        s.assert_invariants();
    }

    #[test]
    fn terminating_a_ready_thread_frees_the_lowest_slot() {
        let mut s = fresh();
        for _ in 1..=3 {
            s.spawn(parked).unwrap();
        }
        assert_eq!(s.terminate(ThreadId(2)), Ok(false));
        s.assert_invariants();
        assert_eq!(s.spawn(parked), Ok(ThreadId(2)));
    }

    #[test]
    fn terminating_a_dead_slot_fails() {
        let mut s = fresh();
        assert_eq!(s.terminate(ThreadId(5)), Err(ThreadError::NoSuchThread));
        assert_eq!(
            s.terminate(ThreadId(MAX_THREADS + 7)),
            Err(ThreadError::NoSuchThread)
        );
    }

    #[test]
    fn rotation_is_fifo_and_counters_stay_consistent() {
        let mut s = fresh();
        s.spawn(parked).unwrap();
        s.spawn(parked).unwrap();

        rotate(&mut s);
        assert_eq!(s.running, Some(ThreadId(1)));
        rotate(&mut s);
        assert_eq!(s.running, Some(ThreadId(2)));
        rotate(&mut s);
        assert_eq!(s.running, Some(ThreadId(0)));

        assert_eq!(s.total_quanta, 4);
        assert_eq!(s.total_quanta, quanta_sum(&s));
        s.assert_invariants();
    }

    #[test]
    fn terminating_the_running_thread_parks_a_zombie() {
        let mut s = fresh();
        s.spawn(parked).unwrap();
        rotate(&mut s);
        assert_eq!(s.running, Some(ThreadId(1)));

        assert_eq!(s.terminate(ThreadId(1)), Ok(true));
        assert_eq!(s.running, None);
        assert!(s.zombie.is_some());
        assert!(s.table[1].is_none());

        // what dispatch does next: hand off, then the arrival reaps
        let _ = s.switch_to_next();
        assert_eq!(s.running, Some(ThreadId(0)));
        let _ = s.zombie.take();
        s.assert_invariants();
        assert_eq!(s.spawn(parked), Ok(ThreadId(1)));
    }

    #[test]
    fn blocking_a_ready_thread_and_resuming_appends_to_the_tail() {
        let mut s = fresh();
        s.spawn(parked).unwrap();
        s.spawn(parked).unwrap();

        assert_eq!(s.block(ThreadId(1), false), Ok(false));
        assert_eq!(s.thread(ThreadId(1)).state, ThreadState::Blocked);
        assert!(s.thread(ThreadId(1)).user_blocked);
        s.assert_invariants();

        s.resume(ThreadId(1)).unwrap();
        assert_eq!(
            s.ready_queue.iter().copied().collect::<Vec<_>>(),
            vec![ThreadId(2), ThreadId(1)]
        );
        assert!(!s.thread(ThreadId(1)).user_blocked);
        s.assert_invariants();
    }

    #[test]
    fn block_is_idempotent() {
        let mut s = fresh();
        s.spawn(parked).unwrap();
        assert_eq!(s.block(ThreadId(1), false), Ok(false));
        assert_eq!(s.block(ThreadId(1), false), Ok(false));
        assert_eq!(s.blocked.len(), 1);
        s.assert_invariants();
    }

    #[test]
    fn resuming_a_ready_thread_is_a_no_op() {
        let mut s = fresh();
        s.spawn(parked).unwrap();
        s.resume(ThreadId(1)).unwrap();
        assert_eq!(s.thread(ThreadId(1)).state, ThreadState::Ready);
        assert_eq!(s.ready_queue.len(), 1);
        s.assert_invariants();
    }

    #[test]
    fn self_block_hands_the_cpu_to_the_successor() {
        let mut s = fresh();
        s.spawn(parked).unwrap();
        rotate(&mut s);
        assert_eq!(s.running, Some(ThreadId(1)));

        assert_eq!(s.block(ThreadId(1), false), Ok(true));
        assert_eq!(s.thread(ThreadId(1)).state, ThreadState::Blocked);

        rotate(&mut s);
        assert_eq!(s.running, Some(ThreadId(0)));
        s.assert_invariants();
    }

    #[test]
    fn sleepers_wake_when_their_deadline_arrives() {
        let mut s = fresh();
        s.spawn(parked).unwrap();
        rotate(&mut s);
        assert_eq!(s.running, Some(ThreadId(1)));

        // total_quanta is 2; sleep for 3 -> runnable again at quantum 5
        assert_eq!(s.begin_sleep(3), Ok(ThreadId(1)));
        assert_eq!(s.block(ThreadId(1), true), Ok(true));
        assert!(!s.thread(ThreadId(1)).user_blocked);
        s.switch_to_next();
        s.assert_invariants();

        while s.total_quanta < 5 {
            assert_eq!(s.thread(ThreadId(1)).state, ThreadState::Blocked);
            rotate(&mut s);
        }
        assert_eq!(s.thread(ThreadId(1)).state, ThreadState::Ready);
        assert_eq!(s.thread(ThreadId(1)).sleep_until, None);
        s.assert_invariants();
    }

    #[test]
    fn a_sleeping_thread_that_is_also_user_blocked_stays_blocked() {
        let mut s = fresh();
        s.spawn(parked).unwrap();
        rotate(&mut s);
        s.begin_sleep(2).unwrap();
        s.block(ThreadId(1), true).unwrap();
        s.switch_to_next();

        // blocked by request on top of the sleep
        assert_eq!(s.block(ThreadId(1), false), Ok(false));

        while s.total_quanta < 6 {
            rotate(&mut s);
        }
        let sleeper = s.thread(ThreadId(1));
        assert_eq!(sleeper.state, ThreadState::Blocked);
        assert_eq!(sleeper.sleep_until, None);
        s.assert_invariants();

        s.resume(ThreadId(1)).unwrap();
        assert_eq!(s.thread(ThreadId(1)).state, ThreadState::Ready);
        s.assert_invariants();
    }

    #[test]
    fn sleeping_the_main_thread_is_rejected() {
        let mut s = fresh();
        assert_eq!(s.begin_sleep(2), Err(ThreadError::SleepMain));
        assert!(s.sleeping.is_empty());
        s.assert_invariants();
    }

    #[test]
    fn terminating_a_sleeper_clears_every_set() {
        let mut s = fresh();
        s.spawn(parked).unwrap();
        rotate(&mut s);
        s.begin_sleep(4).unwrap();
        s.block(ThreadId(1), true).unwrap();
        s.switch_to_next();

        assert_eq!(s.terminate(ThreadId(1)), Ok(false));
        assert!(s.sleeping.is_empty());
        assert!(s.blocked.is_empty());
        assert!(s.table[1].is_none());
        s.assert_invariants();
    }
}
