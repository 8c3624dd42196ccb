//! Tsh builtins
//!
//! The four commands implemented inside the shell itself: `jobs`, `fg`,
//! `cd`, and `exit`. The execution engine intercepts them before any process
//! is spawned and runs them synchronously in the shell's own process.

use std::io::Write;
use std::iter;

use docopt::Docopt;
use failure::Fail;

use self::dirs::Cd;
use self::exit::Exit;
use self::jobs::{Fg, Jobs};
use crate::errors::{ErrorKind, Result};
use crate::shell::Shell;

mod dirs;
mod exit;
mod jobs;

const CD_NAME: &str = "cd";
const EXIT_NAME: &str = "exit";
const FG_NAME: &str = "fg";
const JOBS_NAME: &str = "jobs";

/// Represents a tsh builtin command such as cd or jobs.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// The usage string, in docopt format.
    const HELP: &'static str;
    /// Runs the command with the given arguments in the `shell` environment.
    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()>;
}

pub fn is_builtin<T: AsRef<str>>(program: T) -> bool {
    [CD_NAME, EXIT_NAME, FG_NAME, JOBS_NAME].contains(&program.as_ref())
}

/// precondition: `program` is a builtin.
pub fn run<S1, S2>(
    shell: &mut Shell,
    program: S1,
    args: &[S2],
    stdout: &mut dyn Write,
) -> Result<()>
where
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    debug_assert!(is_builtin(&program));

    match program.as_ref() {
        CD_NAME => Cd::run(shell, args, stdout),
        EXIT_NAME => Exit::run(shell, args, stdout),
        FG_NAME => Fg::run(shell, args, stdout),
        JOBS_NAME => Jobs::run(shell, args, stdout),
        _ => unreachable!(),
    }
}

pub(crate) fn parse_args<'de, D, S, I>(usage: &str, program: S, args: I) -> Result<D>
where
    D: serde::Deserialize<'de>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Docopt::new(usage)
        .unwrap()
        .argv(iter::once(program).chain(args))
        .deserialize()
        .map_err(|e| e.context(ErrorKind::Docopt).into())
}
