use std::io::Write;

use failure::ResultExt;
use serde_derive::Deserialize;

use super::{parse_args, BuiltinCommand};
use crate::errors::{ErrorKind, Result};
use crate::jobs::JobId;
use crate::shell::Shell;

pub struct Jobs;

impl BuiltinCommand for Jobs {
    const NAME: &'static str = super::JOBS_NAME;

    const HELP: &'static str = "\
Usage: jobs

List every tracked job in ascending id order, one `[id] command-line` per
line.";

    fn run<T: AsRef<str>>(shell: &mut Shell, _args: &[T], stdout: &mut dyn Write) -> Result<()> {
        for job in shell.jobs.ordered() {
            writeln!(stdout, "{}", job).context(ErrorKind::Io)?;
        }
        Ok(())
    }
}

pub struct Fg;

#[derive(Debug, Deserialize)]
struct FgArgs {
    arg_job: Option<u32>,
}

impl BuiltinCommand for Fg {
    const NAME: &'static str = super::FG_NAME;

    const HELP: &'static str = "\
Usage: fg <job>

Mark the job with the given id as the foreground job and move it to the head
of the job table; its id is unchanged. An unknown id is ignored.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let args: Result<FgArgs> = parse_args(Self::HELP, Self::NAME, args.iter().map(AsRef::as_ref));
        match args {
            Ok(FgArgs { arg_job: Some(job) }) => shell.jobs.promote(JobId(job)),
            _ => eprintln!("tsh: fg: job id required"),
        }
        Ok(())
    }
}
