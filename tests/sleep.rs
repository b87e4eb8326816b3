/*
 * Sleep semantics: sleeping advances virtual time by at least the
 * requested number of quanta, and the main thread cannot sleep.
 */

mod common;

use std::sync::atomic::{AtomicBool, Ordering};

static DONE: AtomicBool = AtomicBool::new(false);

fn sleeper() {
    let before = vthreads::get_total_quantums();
    assert_eq!(vthreads::sleep(5), 0);
    let after = vthreads::get_total_quantums();
    assert!(after - before >= 5, "slept from quantum {before} to {after}");
    DONE.store(true, Ordering::SeqCst);
    vthreads::terminate(vthreads::get_tid());
}

fn scenario() {
    assert_eq!(vthreads::init(5_000), 0);

    // the main thread must not sleep, and the failed call changes nothing
    let total = vthreads::get_total_quantums();
    assert_eq!(vthreads::sleep(3), -1);
    assert_eq!(vthreads::get_tid(), 0);
    assert!(vthreads::get_total_quantums() - total < 3);

    assert_eq!(vthreads::spawn(sleeper), 1);
    while !DONE.load(Ordering::SeqCst) {
        // burn virtual time so the sleeper's deadline arrives
        std::hint::black_box(vthreads::get_total_quantums());
    }
    vthreads::terminate(0);
}

#[test]
fn sleep_advances_virtual_time() {
    common::run_scenario(scenario);
}
