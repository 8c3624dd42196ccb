//! Tsh, the execution core of a small Unix command-line shell.
//!
//! The crate turns raw input lines into pipelines and runs them as chains of
//! connected processes with job control: background/foreground tracking,
//! suspend/interrupt handling, builtin commands, and append-mode I/O
//! redirection. The interactive read loop, line editing, and
//! variable/glob expansion are deliberately left to the front end.
//!
//! A front end drives the crate like this:
//!
//! ```no_run
//! use tsh::{initialize, parser, Shell};
//!
//! initialize().expect("failed to install signal handlers");
//! let mut shell = Shell::new();
//! let mut sequence = parser::parse("cat notes.txt | wc -l &").expect("syntax error");
//! while let Some(pipeline) = sequence.pop() {
//!     shell.execute(pipeline);
//! }
//! ```

pub mod errors;
pub mod jobs;
pub mod parser;
pub mod shell;

mod builtins;
mod execute_command;
mod signals;

pub use crate::jobs::{Job, JobId, JobTable};
pub use crate::parser::{parse, Command, Pipeline, Sequence};
pub use crate::shell::Shell;
pub use crate::signals::initialize;
