//! Passive structures produced by the sequence parser.
//!
//! The execution engine only ever goes through the accessors defined here; it
//! never pokes at parser internals.

use std::collections::VecDeque;

/// One parsed command: the program name followed by its arguments, plus the
/// optional append-mode redirect targets for stdout and stderr.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Command {
    pub(crate) args: Vec<String>,
    pub(crate) stdout_redirect: Option<String>,
    pub(crate) stderr_redirect: Option<String>,
}

impl Command {
    /// The program name (the first argument), if any was parsed.
    pub fn program(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// The full argument vector, program name first.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The arguments after the program name.
    pub fn args_after_program(&self) -> &[String] {
        if self.args.is_empty() {
            &self.args
        } else {
            &self.args[1..]
        }
    }

    /// File to append stdout to, if `>>`/`1>>` was given.
    pub fn stdout_redirect(&self) -> Option<&str> {
        self.stdout_redirect.as_ref().map(String::as_str)
    }

    /// File to append stderr to, if `2>>` was given.
    pub fn stderr_redirect(&self) -> Option<&str> {
        self.stderr_redirect.as_ref().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// An ordered chain of commands whose outputs feed the next stage's input,
/// plus a flag recording whether the chain was sent to the background.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pipeline {
    pub(crate) commands: Vec<Command>,
    pub(crate) background: bool,
}

impl Pipeline {
    /// All stages, in pipeline order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// The `nth` stage, or `None` past the stage count.
    pub fn command(&self, nth: usize) -> Option<&Command> {
        self.commands.get(nth)
    }

    /// Whether the `nth` stage is the final one in this pipeline.
    pub fn is_final(&self, nth: usize) -> bool {
        nth + 1 == self.commands.len()
    }

    pub fn background(&self) -> bool {
        self.background
    }

    /// A pipeline with no stages, or only an argument-less stage, runs
    /// nothing.
    pub fn is_empty(&self) -> bool {
        self.commands.iter().all(Command::is_empty)
    }

    /// The rendered command line used for the `jobs` listing: each stage's
    /// arguments space-joined, with `" | "` between stages.
    pub fn render(&self) -> String {
        self.commands
            .iter()
            .map(|command| command.args.join(" "))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// The FIFO queue of pipelines parsed from one input line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sequence {
    pub(crate) pipelines: VecDeque<Pipeline>,
}

impl Sequence {
    /// Removes and returns the next pipeline, oldest first. The caller owns
    /// the returned pipeline.
    pub fn pop(&mut self) -> Option<Pipeline> {
        self.pipelines.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }
}
