//! Keys pressed at the prompt, while no pipeline is executing.
//!
//! This lives in its own test binary: the pending-signal flags are
//! process-global, so sharing a process with other signal-raising tests
//! would race.

use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};

use tsh::{initialize, parser, Shell};

#[test]
fn keys_pressed_at_the_prompt_do_not_target_the_next_job() {
    initialize().unwrap();
    let mut shell = Shell::new();

    // Latch both flags while the job table is empty.
    signal::raise(Signal::SIGINT).unwrap();
    signal::raise(Signal::SIGTSTP).unwrap();

    let mut sequence = parser::parse("sleep 1").unwrap();
    let start = Instant::now();
    shell.execute_pipeline(sequence.pop().unwrap()).unwrap();

    // The sleep ran to completion in the foreground: the stale interrupt did
    // not terminate it and the stale stop did not background it.
    assert!(start.elapsed() >= Duration::from_millis(500));
    assert!(!shell.has_jobs());
}
