//! The execution engine: consumes one pipeline, spawns its stages as
//! connected processes, intercepts builtins, and drives both reaping paths
//! through the job table.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::FromRawFd;
use std::process::{Child, Command, Stdio};

use failure::{Fail, ResultExt};
use log::{debug, warn};
use nix::unistd::{self, Pid};

use crate::builtins;
use crate::errors::{Error, ErrorKind, Result};
use crate::parser::{ast, Pipeline};
use crate::shell::Shell;
use crate::signals;

/// Runs one pipeline to the point where control can return to the caller:
/// immediately for background pipelines, after the last stage exits (or is
/// stopped) for foreground ones.
///
/// The pipeline is consumed; an empty pipeline is a no-op. Errors returned
/// from here are fatal to the shell (see `Shell::execute`), with one
/// exception handled internally: a stage whose program does not exist is
/// reported on stderr and skipped.
pub(crate) fn run_pipeline(shell: &mut Shell, pipeline: Pipeline) -> Result<()> {
    if pipeline.is_empty() {
        return Ok(());
    }

    // Reap finished background jobs before touching the table; this is the
    // only cleanup long-idle jobs ever get.
    shell.jobs.reap_background()?;

    // A stop or interrupt key pressed while no pipeline was executing
    // targeted no job; drop anything that latched before this submission so
    // only signals arriving during the wait below act on the new job.
    signals::take_stop();
    signals::take_interrupt();

    shell
        .jobs
        .register(pipeline.render(), pipeline.background());

    // True once the job record allocated above has been discarded because a
    // builtin claimed this pipeline.
    let mut job_discarded = false;
    // Read end of the pipe connecting the previous stage to the next one.
    let mut next_stdin: Option<File> = None;

    for (nth, command) in pipeline.commands().iter().enumerate() {
        let program = match command.program() {
            Some(program) => program,
            None => continue,
        };

        if builtins::is_builtin(program) {
            // Builtins read no pipeline input.
            next_stdin = None;
            if !job_discarded {
                if shell.jobs.head().map_or(false, |job| job.pids().is_empty()) {
                    shell.jobs.discard_head();
                    job_discarded = true;
                } else {
                    // Externals were already spawned for this pipeline; their
                    // job record must stay so they can be reaped.
                    warn!(
                        "builtin `{}` follows external commands in a pipeline; keeping job record",
                        program
                    );
                }
            }
            builtins::run(shell, program, command.args_after_program(), &mut io::stdout())?;
            continue;
        }

        if job_discarded {
            // A builtin already claimed this pipeline's job record. What a
            // builtin piped together with external commands should mean is
            // anyone's guess, so refuse instead of inventing an answer.
            eprintln!(
                "tsh: {}: builtins cannot be combined with external commands in a pipeline",
                program
            );
            warn!("skipping external stage `{}` after a builtin", program);
            continue;
        }

        let (read_end, write_end) = if pipeline.is_final(nth) {
            (None, None)
        } else {
            let (read_end, write_end) = create_pipe()?;
            (Some(read_end), Some(write_end))
        };

        match spawn_stage(command, next_stdin.take(), write_end) {
            Ok(child) => {
                debug!("spawned pid {} for `{}`", child.id(), program);
                shell
                    .jobs
                    .push_head_pid(Pid::from_raw(child.id() as libc::pid_t));
            }
            Err(e) => {
                if let ErrorKind::CommandNotFound(_) = *e.kind() {
                    eprintln!("tsh: {}", e);
                } else {
                    return Err(e);
                }
            }
        }
        next_stdin = read_end;
    }
    drop(next_stdin);

    // All stages are dispatched; release the pipeline before blocking.
    drop(pipeline);

    shell.jobs.wait_for_foreground()
}

/// Wires one external stage and spawns it.
///
/// Stdin comes from the previous stage's pipe, stdout goes to the next
/// stage's pipe, unless an explicit redirect file was given, which wins over
/// pipe wiring. The write end left unused by a redirect is dropped here, so
/// a downstream reader sees end-of-file.
fn spawn_stage(
    command: &ast::Command,
    stdin: Option<File>,
    stdout_pipe: Option<File>,
) -> Result<Child> {
    let program = command.program().expect("stage has a program");

    let mut process = Command::new(program);
    process.args(command.args_after_program());
    if let Some(stdin) = stdin {
        process.stdin(Stdio::from(stdin));
    }
    match (command.stdout_redirect(), stdout_pipe) {
        (Some(filename), _) => {
            process.stdout(Stdio::from(open_append(filename)?));
        }
        (None, Some(write_end)) => {
            process.stdout(Stdio::from(write_end));
        }
        (None, None) => {}
    }
    if let Some(filename) = command.stderr_redirect() {
        process.stderr(Stdio::from(open_append(filename)?));
    }

    process.spawn().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            Error::command_not_found(program)
        } else {
            e.context(ErrorKind::Io).into()
        }
    })
}

/// Opens a redirect target for appending, creating it with mode 0644 if it
/// does not exist.
fn open_append(filename: &str) -> Result<File> {
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .mode(0o644)
        .open(filename)
        .with_context(|_| ErrorKind::Redirect(filename.to_string()))?;
    Ok(file)
}

/// Wraps `unistd::pipe()` to return RAII structs instead of raw, owning file
/// descriptors. Returns (`read_end`, `write_end`).
fn create_pipe() -> Result<(File, File)> {
    // Move the raw fds into `File`s immediately so they cannot leak.
    let (read_end, write_end) = unistd::pipe().context(ErrorKind::Nix)?;
    unsafe {
        Ok((
            File::from_raw_fd(read_end),
            File::from_raw_fd(write_end),
        ))
    }
}
