//! The job table: tracking records for submitted pipelines and both reaping
//! paths (the non-blocking background sweep and the blocking foreground
//! wait).
//!
//! The newest job sits at the head of the table. Foreground pipelines are
//! always inserted at the head and drained before control returns to the
//! caller, so at any instant at most the head job can legitimately be "the
//! foreground job". `fg` promotes a job by splicing it back to the head
//! without changing its id.

use std::collections::VecDeque;
use std::fmt;

use failure::{Fail, ResultExt};
use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::errors::{ErrorKind, Result};
use crate::signals;

/// Identifies one job for the lifetime of a shell session.
///
/// Ids are handed out from a monotonically increasing per-session counter.
/// The only reuse is the rollback performed when a pre-allocated job is
/// discarded because its pipeline turned out to be a builtin.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct JobId(pub u32);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The tracking record for one submitted pipeline's live processes.
#[derive(Debug)]
pub struct Job {
    id: JobId,
    background: bool,
    display: String,
    pids: Vec<Pid>,
}

impl Job {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    /// The rendered command line shown by the `jobs` builtin.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Process ids of the stages still running, in spawn order.
    pub fn pids(&self) -> &[Pid] {
        &self.pids
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.display)
    }
}

/// Registry of the jobs a shell session is tracking, newest at the head.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: VecDeque<Job>,
    next_id: u32,
}

impl JobTable {
    pub fn has_jobs(&self) -> bool {
        !self.jobs.is_empty()
    }

    /// Registers a new job at the table head and assigns it the next id.
    pub(crate) fn register(&mut self, display: String, background: bool) -> JobId {
        let id = JobId(self.next_id);
        self.next_id += 1;
        debug!("registering job [{}] {}", id, display);
        self.jobs.push_front(Job {
            id,
            background,
            display,
            pids: Vec::new(),
        });
        id
    }

    /// Unregisters the head job and rolls the id counter back by one.
    ///
    /// Used when a freshly registered pipeline turns out to be a builtin and
    /// no process was ever spawned for it.
    pub(crate) fn discard_head(&mut self) {
        if let Some(job) = self.jobs.pop_front() {
            debug!("discarding job [{}] {}", job.id, job.display);
            self.next_id -= 1;
        }
    }

    pub(crate) fn head(&self) -> Option<&Job> {
        self.jobs.front()
    }

    /// Records a freshly spawned pid against the head job.
    pub(crate) fn push_head_pid(&mut self, pid: Pid) {
        if let Some(job) = self.jobs.front_mut() {
            job.pids.push(pid);
        }
    }

    /// Marks the job with `id` as foreground and splices it to the table
    /// head. An unknown id is silently ignored. The job's id is unchanged.
    ///
    /// This is bookkeeping only: no SIGCONT is delivered, so a stopped job
    /// promoted this way does not resume until a signal arrives from
    /// elsewhere. The blocking foreground wait will pick the job up on the
    /// next pipeline submission.
    pub(crate) fn promote(&mut self, id: JobId) {
        match self.jobs.iter().position(|job| job.id == id) {
            Some(index) => {
                let mut job = self.jobs.remove(index).expect("position is valid");
                job.background = false;
                self.jobs.push_front(job);
            }
            None => debug!("fg: no such job [{}]", id),
        }
    }

    /// Jobs in ascending id order, regardless of table order.
    pub fn ordered(&self) -> Vec<&Job> {
        let mut jobs: Vec<&Job> = self.jobs.iter().collect();
        jobs.sort_by_key(|job| job.id);
        jobs
    }

    /// The non-blocking reaping path: polls every background job's pids,
    /// dropping the ones that have exited and evicting jobs whose pid lists
    /// drain. Foreground jobs are skipped. Runs on every new pipeline
    /// submission; there is no reaper independent of submissions.
    pub(crate) fn reap_background(&mut self) -> Result<()> {
        for job in &mut self.jobs {
            if !job.background {
                continue;
            }

            let mut remaining = Vec::with_capacity(job.pids.len());
            for &pid in &job.pids {
                match waitpid(pid, Some(WaitPidFlag::WNOHANG)).context(ErrorKind::Nix)? {
                    WaitStatus::StillAlive => remaining.push(pid),
                    status => debug!("reaped background pid {}: {:?}", pid, status),
                }
            }
            job.pids = remaining;
        }

        self.jobs.retain(|job| {
            if job.background && job.pids.is_empty() {
                debug!("evicting finished job [{}] {}", job.id, job.display);
                false
            } else {
                true
            }
        });

        Ok(())
    }

    /// The blocking reaping path: waits for the head job's pids in the order
    /// they were recorded, as long as the head job is foreground.
    ///
    /// A wait interrupted by signal delivery is retried after the pending
    /// signal flags have been applied; if a stop key flipped the head job to
    /// background mid-wait, the wait stands down and the job stays in the
    /// table for later background reaping or `fg`. When the head job's pid
    /// list fully drains it is evicted.
    pub(crate) fn wait_for_foreground(&mut self) -> Result<()> {
        loop {
            self.apply_pending_signals()?;

            let next_pid = {
                let job = match self.jobs.front() {
                    Some(job) => job,
                    None => return Ok(()),
                };
                if job.background {
                    return Ok(());
                }
                job.pids.first().copied()
            };
            let pid = match next_pid {
                Some(pid) => pid,
                None => {
                    self.jobs.pop_front();
                    return Ok(());
                }
            };

            match waitpid(pid, None) {
                Ok(status) => {
                    debug!("reaped foreground pid {}: {:?}", pid, status);
                    let job = self.jobs.front_mut().expect("head job present");
                    job.pids.remove(0);
                    if job.pids.is_empty() {
                        self.jobs.pop_front();
                        return Ok(());
                    }
                }
                // Signal delivery, not an exit; loop to apply the flags and
                // retry.
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.context(ErrorKind::Nix).into()),
            }
        }
    }

    /// Applies the handlers' pending flags to the table on the main control
    /// flow (the handlers themselves only ever toggle the flags).
    ///
    /// A pending stop puts the head job into the background; the operating
    /// system has already stopped its processes, so nothing is signalled
    /// here. A pending interrupt delivers SIGTERM to every pid of the head
    /// job if it is foreground; a pid that has already exited is a benign
    /// race.
    pub(crate) fn apply_pending_signals(&mut self) -> Result<()> {
        if signals::take_stop() {
            if let Some(job) = self.jobs.front_mut() {
                debug!("stop key: moving job [{}] to the background", job.id);
                job.background = true;
            }
        }

        if signals::take_interrupt() {
            if let Some(job) = self.jobs.front() {
                if !job.background {
                    for &pid in &job.pids {
                        match signal::kill(pid, Signal::SIGTERM) {
                            Ok(()) => debug!("interrupt key: terminated pid {}", pid),
                            Err(Errno::ESRCH) => {
                                warn!("interrupt key: pid {} already gone", pid)
                            }
                            Err(e) => return Err(e.context(ErrorKind::Nix).into()),
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(displays: &[(&str, bool)]) -> JobTable {
        let mut table = JobTable::default();
        for &(display, background) in displays {
            table.register(display.to_string(), background);
        }
        table
    }

    #[test]
    fn ids_are_assigned_in_submission_order() {
        let table = table_with(&[("a", false), ("b", true), ("c", true)]);
        let ids: Vec<JobId> = table.ordered().iter().map(|job| job.id()).collect();
        assert_eq!(ids, vec![JobId(0), JobId(1), JobId(2)]);
    }

    #[test]
    fn newest_job_is_at_the_head() {
        let table = table_with(&[("a", false), ("b", false)]);
        assert_eq!(table.head().unwrap().display(), "b");
    }

    #[test]
    fn discard_head_rolls_back_the_id_counter() {
        let mut table = table_with(&[("a", false)]);
        table.discard_head();
        assert!(!table.has_jobs());
        let id = table.register("b".to_string(), false);
        assert_eq!(id, JobId(0));
    }

    #[test]
    fn promote_splices_to_head_without_changing_id() {
        let mut table = table_with(&[("a", true), ("b", true), ("c", true)]);
        table.promote(JobId(0));
        let head = table.head().unwrap();
        assert_eq!(head.id(), JobId(0));
        assert_eq!(head.display(), "a");
        assert!(!head.is_background());
        // Listing order is by id, untouched by the splice.
        let displays: Vec<&str> = table.ordered().iter().map(|job| job.display()).collect();
        assert_eq!(displays, vec!["a", "b", "c"]);
    }

    #[test]
    fn promote_unknown_id_leaves_the_table_unchanged() {
        let mut table = table_with(&[("a", true)]);
        table.promote(JobId(42));
        assert_eq!(table.head().unwrap().display(), "a");
        assert_eq!(table.ordered().len(), 1);
        assert!(table.head().unwrap().is_background());
    }

    #[test]
    fn pending_stop_moves_head_job_to_background() {
        let _guard = crate::signals::testing::SIGNAL_LOCK.lock().unwrap();
        crate::signals::initialize().unwrap();
        let mut table = table_with(&[("a", false)]);
        let _ = crate::signals::take_stop();
        signal::raise(Signal::SIGTSTP).unwrap();
        table.apply_pending_signals().unwrap();
        assert!(table.head().unwrap().is_background());
    }

    #[test]
    fn wait_for_foreground_stands_down_for_background_head() {
        let _guard = crate::signals::testing::SIGNAL_LOCK.lock().unwrap();
        let mut table = table_with(&[("a", true)]);
        table.push_head_pid(Pid::from_raw(1));
        // Would block forever (or fail) if the background flag were ignored.
        table.wait_for_foreground().unwrap();
        assert!(table.has_jobs());
    }

    #[test]
    fn wait_for_foreground_evicts_a_drained_head_job() {
        let _guard = crate::signals::testing::SIGNAL_LOCK.lock().unwrap();
        let mut table = table_with(&[("a", false)]);
        table.wait_for_foreground().unwrap();
        assert!(!table.has_jobs());
    }
}
