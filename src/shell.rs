//! The shell session context.
//!
//! A [`Shell`] owns the job table and the job id counter, so multiple
//! independent sessions can coexist (and be tested) without shared mutable
//! globals. The interactive read loop lives outside this crate; it is
//! expected to call [`initialize`](crate::signals::initialize) once, then
//! feed parsed pipelines to a `Shell`.

use std::fmt;
use std::process;

use log::error;

use crate::errors::Result;
use crate::execute_command;
use crate::jobs::{Job, JobTable};
use crate::parser::{Pipeline, Sequence};

/// One shell session: a job table plus the execution engine driving it.
#[derive(Default)]
pub struct Shell {
    pub(crate) jobs: JobTable,
}

impl Shell {
    pub fn new() -> Self {
        Default::default()
    }

    /// Executes one pipeline, blocking until its foreground processes exit
    /// (or are stopped), and returns any fatal error to the caller.
    ///
    /// This is the fallible core of [`execute`](Shell::execute); front ends
    /// that want to control shutdown themselves (and tests) use this
    /// directly.
    pub fn execute_pipeline(&mut self, pipeline: Pipeline) -> Result<()> {
        execute_command::run_pipeline(self, pipeline)
    }

    /// Executes every pipeline of a sequence, in order.
    pub fn execute_sequence(&mut self, mut sequence: Sequence) -> Result<()> {
        while let Some(pipeline) = sequence.pop() {
            self.execute_pipeline(pipeline)?;
        }
        Ok(())
    }

    /// Executes one pipeline; on a fatal error, prints a diagnostic and
    /// terminates the shell process. There is no soft failure path here:
    /// anything short of fatal was already handled internally.
    pub fn execute(&mut self, pipeline: Pipeline) {
        if let Err(e) = self.execute_pipeline(pipeline) {
            error!("fatal: {}", e);
            eprintln!("tsh: {}", e);
            process::exit(1);
        }
    }

    /// The tracked jobs, in ascending id order.
    pub fn get_jobs(&self) -> Vec<&Job> {
        self.jobs.ordered()
    }

    pub fn has_jobs(&self) -> bool {
        self.jobs.has_jobs()
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.jobs)
    }
}
