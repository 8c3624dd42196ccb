//! Suspend/interrupt handling.
//!
//! The terminal's stop and interrupt keys must be able to retarget the
//! foreground job while the shell sits in a blocking `waitpid`. The handlers
//! themselves do as little as async-signal-safety allows: each one stores
//! `true` into a pending flag and returns. All job-table work happens later,
//! on the main control flow, when [`JobTable`](crate::jobs::JobTable) polls
//! the flags; handlers never allocate, free, or walk the table.
//!
//! The handlers are installed without `SA_RESTART` on purpose: the blocking
//! foreground wait has to come back with `EINTR` so it can observe the flags.

use std::sync::atomic::{AtomicBool, Ordering};

use failure::ResultExt;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::errors::{ErrorKind, Result};

static STOP_PENDING: AtomicBool = AtomicBool::new(false);
static INTERRUPT_PENDING: AtomicBool = AtomicBool::new(false);
static INSTALLED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_stop(_signal: libc::c_int) {
    STOP_PENDING.store(true, Ordering::SeqCst);
}

extern "C" fn handle_interrupt(_signal: libc::c_int) {
    INTERRUPT_PENDING.store(true, Ordering::SeqCst);
}

/// Installs the SIGTSTP and SIGINT handlers for the shell process.
///
/// Must run once before any pipeline is executed; calling it again is a
/// no-op. Spawned children get the default dispositions back automatically
/// when they exec.
pub fn initialize() -> Result<()> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let stop = SigAction::new(
        SigHandler::Handler(handle_stop),
        SaFlags::empty(),
        SigSet::empty(),
    );
    let interrupt = SigAction::new(
        SigHandler::Handler(handle_interrupt),
        SaFlags::empty(),
        SigSet::empty(),
    );
    unsafe {
        signal::sigaction(Signal::SIGTSTP, &stop).context(ErrorKind::Nix)?;
        signal::sigaction(Signal::SIGINT, &interrupt).context(ErrorKind::Nix)?;
    }

    Ok(())
}

/// Consumes the pending-stop flag, returning whether a stop key arrived.
pub(crate) fn take_stop() -> bool {
    STOP_PENDING.swap(false, Ordering::SeqCst)
}

/// Consumes the pending-interrupt flag, returning whether an interrupt key
/// arrived.
pub(crate) fn take_interrupt() -> bool {
    INTERRUPT_PENDING.swap(false, Ordering::SeqCst)
}
