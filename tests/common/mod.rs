/*
 * Fork-and-wait harness for scheduler scenarios.
 *
 * The preemption timer and the SIGVTALRM disposition are process-wide,
 * so every scenario runs in a forked child with its own scheduler and
 * leaves through terminate(0); the parent asserts on the exit status.
 * Each scenario lives in its own test binary for the same reason.
 */

/// Run `scenario` in a forked child and require a clean exit(0).
pub fn run_scenario(scenario: fn()) {
    let _ = env_logger::try_init();
    unsafe {
        let pid = libc::fork();
        assert!(pid >= 0, "fork failed");
        if pid == 0 {
            // a wedged scheduler should kill the child, not hang the suite
            libc::alarm(120);
            let outcome = std::panic::catch_unwind(scenario);
            // scenarios leave through terminate(0); reaching here is a bug
            libc::_exit(if outcome.is_err() { 99 } else { 86 });
        }
        let mut status = 0;
        assert_eq!(libc::waitpid(pid, &mut status, 0), pid);
        assert!(
            libc::WIFEXITED(status),
            "child did not exit cleanly (wait status {status:#x})"
        );
        assert_eq!(libc::WEXITSTATUS(status), 0, "scenario failed in the child");
    }
}
