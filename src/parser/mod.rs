//! The sequence parser.
//!
//! Turns one raw input line into a [`Sequence`] of pipelines, validating the
//! pipe/background/redirection grammar as it goes. Grammar violations are
//! returned as specific [`ErrorKind`](crate::errors::ErrorKind)s; the caller
//! reports them and keeps accepting input.
//!
//! The grammar is deliberately small: whitespace-separated words, `|` to
//! connect stages, `;` to separate pipelines, `&` to background the pipeline
//! it terminates, and the append-only redirections `>>`/`1>>` (stdout) and
//! `2>>` (stderr). The three single-character delimiters are recognized even
//! without surrounding whitespace, so `a|b|c` is a three-stage pipeline. The
//! redirection spellings are only recognized as whole words.

use std::collections::VecDeque;

use log::debug;

use crate::errors::{ErrorKind, Result};

pub use self::ast::{Command, Pipeline, Sequence};

pub mod ast;

/// Most arguments a single command may carry, program name included.
pub const MAX_ARGS: usize = 16;

/// Most stages a single pipeline may chain together.
pub const MAX_PIPELINE_STAGES: usize = 16;

/// Per-command redirection state: one "opened" and one "filename consumed"
/// bit for each of the two redirectable streams.
#[derive(Debug, Default)]
struct RedirectState {
    stdout_open: bool,
    stdout_named: bool,
    stderr_open: bool,
    stderr_named: bool,
}

impl RedirectState {
    fn any(&self) -> bool {
        self.stdout_open || self.stdout_named || self.stderr_open || self.stderr_named
    }

    /// A redirection was opened but its filename has not been seen yet.
    fn pending_filename(&self) -> bool {
        (self.stdout_open && !self.stdout_named) || (self.stderr_open && !self.stderr_named)
    }

    fn reset(&mut self) {
        *self = Default::default();
    }
}

/// Parses one line of input into a FIFO queue of pipelines.
///
/// On error, nothing of the partially built sequence survives; the caller's
/// state is untouched.
///
/// # Examples
///
/// ```
/// use tsh::parser;
///
/// let mut sequence = parser::parse("cat foo | wc -l ; echo done &").unwrap();
/// let pipeline = sequence.pop().unwrap();
/// assert_eq!(pipeline.commands().len(), 2);
/// assert!(!pipeline.background());
/// assert!(sequence.pop().unwrap().background());
/// assert!(sequence.pop().is_none());
/// ```
pub fn parse(input: &str) -> Result<Sequence> {
    let mut pipelines: VecDeque<Pipeline> = VecDeque::new();
    let mut current: Option<Pipeline> = None;
    // Set by `|` until the next plain token shows up; catches trailing pipes.
    let mut open_pipe = false;
    // Whether the most recent pipeline boundary was `&`; selects the error
    // reported for a pipe with nothing before it.
    let mut background_last = false;
    let mut redirect = RedirectState::default();

    for token in tokenize(input) {
        match token {
            "&" => {
                match current.as_mut() {
                    Some(pipeline) => pipeline.background = true,
                    None => return Err(ErrorKind::MisusedBackground.into()),
                }
                background_last = true;
                if open_pipe {
                    return Err(ErrorKind::PipeMissingCommand.into());
                }
                if redirect.pending_filename() {
                    return Err(ErrorKind::NoRedirectFilename.into());
                }
                redirect.reset();
                pipelines.extend(current.take());
            }
            ";" => {
                if open_pipe {
                    return Err(ErrorKind::PipeMissingCommand.into());
                }
                if redirect.pending_filename() {
                    return Err(ErrorKind::NoRedirectFilename.into());
                }
                redirect.reset();
                pipelines.extend(current.take());
                background_last = false;
            }
            "|" => {
                let no_command = current
                    .as_ref()
                    .map_or(true, |p| p.commands.last().map_or(true, Command::is_empty));
                if no_command {
                    return Err(if background_last {
                        ErrorKind::MisusedBackground.into()
                    } else {
                        ErrorKind::PipeMissingCommand.into()
                    });
                }
                if redirect.stdout_open {
                    // A stage cannot both pipe its stdout and append it to a
                    // file.
                    return Err(ErrorKind::RedundantPipeRedirection.into());
                }
                if redirect.pending_filename() {
                    return Err(ErrorKind::NoRedirectFilename.into());
                }
                redirect.reset();

                let pipeline = current.as_mut().expect("checked above");
                if pipeline.commands.len() == MAX_PIPELINE_STAGES {
                    return Err(ErrorKind::TooManyCommands.into());
                }
                pipeline.commands.push(Command::default());
                open_pipe = true;
            }
            _ => {
                open_pipe = false;
                let pipeline = current.get_or_insert_with(|| Pipeline {
                    commands: vec![Command::default()],
                    background: false,
                });
                let command = pipeline.commands.last_mut().expect("at least one stage");

                if token == ">>" || token == "1>>" {
                    if command.args.is_empty() {
                        return Err(ErrorKind::RedirectMissingCommand.into());
                    }
                    if redirect.stdout_open {
                        return Err(ErrorKind::MultipleRedirections.into());
                    }
                    redirect.stdout_open = true;
                } else if redirect.stdout_open && !redirect.stdout_named {
                    command.stdout_redirect = Some(token.to_string());
                    redirect.stdout_named = true;
                } else if token == "2>>" {
                    if command.args.is_empty() {
                        return Err(ErrorKind::RedirectMissingCommand.into());
                    }
                    if redirect.stderr_open {
                        return Err(ErrorKind::MultipleRedirections.into());
                    }
                    redirect.stderr_open = true;
                } else if redirect.stderr_open && !redirect.stderr_named {
                    command.stderr_redirect = Some(token.to_string());
                    redirect.stderr_named = true;
                } else if redirect.any() {
                    // Both streams (or all pending slots) already have their
                    // files; nothing else may follow for this command.
                    return Err(ErrorKind::RedirectedToTooManyFiles.into());
                } else {
                    if command.args.len() == MAX_ARGS {
                        return Err(ErrorKind::TooManyArgs.into());
                    }
                    command.args.push(token.to_string());
                }
            }
        }
    }

    if open_pipe {
        return Err(ErrorKind::PipeMissingCommand.into());
    }
    if redirect.pending_filename() {
        return Err(ErrorKind::NoRedirectFilename.into());
    }
    pipelines.extend(current.take());

    let sequence = Sequence { pipelines };
    debug!("parsed {:?} from {:?}", sequence, input);
    Ok(sequence)
}

/// Splits the line on whitespace, then peels `|`, `;`, and `&` off as
/// standalone tokens wherever they are glued to a word.
fn tokenize(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for word in input.split_whitespace() {
        let mut rest = word;
        while let Some(index) = rest.find(|c| c == '|' || c == ';' || c == '&') {
            if index > 0 {
                tokens.push(&rest[..index]);
            }
            tokens.push(&rest[index..=index]);
            rest = &rest[index + 1..];
        }
        if !rest.is_empty() {
            tokens.push(rest);
        }
    }
    tokens
}
