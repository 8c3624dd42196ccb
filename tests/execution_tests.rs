//! Integration tests driving the parser and execution engine with real
//! processes.

#[macro_use]
extern crate lazy_static;
extern crate tempdir;

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use tempdir::TempDir;
use tsh::{parser, JobId, Pipeline, Shell};

lazy_static! {
    // The working directory is process-global; cd tests take this lock.
    static ref CWD_LOCK: Mutex<()> = Mutex::new(());
}

fn single_pipeline(input: &str) -> Pipeline {
    let mut sequence = parser::parse(input).expect("parse failed");
    let pipeline = sequence.pop().expect("no pipeline parsed");
    assert!(sequence.pop().is_none(), "more than one pipeline parsed");
    pipeline
}

fn run(shell: &mut Shell, input: &str) {
    shell
        .execute_pipeline(single_pipeline(input))
        .expect("execution failed");
}

#[test]
fn empty_pipeline_is_a_no_op_twice() {
    let mut shell = Shell::new();
    shell.execute_pipeline(Pipeline::default()).unwrap();
    shell.execute_pipeline(Pipeline::default()).unwrap();
    assert!(!shell.has_jobs());
}

#[test]
fn foreground_command_is_reaped_before_returning() {
    let mut shell = Shell::new();
    run(&mut shell, "true");
    assert!(!shell.has_jobs());
}

#[test]
fn foreground_pipeline_drains_every_stage() {
    let mut shell = Shell::new();
    run(&mut shell, "echo hello | cat | cat");
    assert!(!shell.has_jobs());
}

#[test]
fn pipeline_output_lands_in_append_redirect() {
    let dir = TempDir::new("tsh-redirect").unwrap();
    let out = dir.path().join("out.txt");
    let mut shell = Shell::new();

    let input = format!("echo hello | cat >> {}", out.display());
    run(&mut shell, &input);
    assert_eq!(fs::read_to_string(&out).unwrap(), "hello\n");

    // Appends on re-run instead of truncating.
    run(&mut shell, &input);
    assert_eq!(fs::read_to_string(&out).unwrap(), "hello\nhello\n");
}

#[test]
fn stderr_redirect_captures_diagnostics() {
    let dir = TempDir::new("tsh-redirect").unwrap();
    let err = dir.path().join("err.txt");
    let mut shell = Shell::new();

    run(
        &mut shell,
        &format!("ls /tsh-definitely-missing 2>> {}", err.display()),
    );
    assert!(!fs::read_to_string(&err).unwrap().is_empty());
}

#[test]
fn background_pipeline_returns_without_blocking() {
    let mut shell = Shell::new();
    let start = Instant::now();
    run(&mut shell, "sleep 2 &");
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(shell.has_jobs());
    let jobs = shell.get_jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].display(), "sleep 2");
    assert!(jobs[0].is_background());
}

#[test]
fn background_jobs_are_listed_by_ascending_id() {
    let mut shell = Shell::new();
    run(&mut shell, "sleep 2 &");
    run(&mut shell, "sleep 3 &");
    let jobs = shell.get_jobs();
    let ids: Vec<JobId> = jobs.iter().map(|job| job.id()).collect();
    assert_eq!(ids, vec![JobId(0), JobId(1)]);
    assert_eq!(jobs[0].display(), "sleep 2");
    assert_eq!(jobs[1].display(), "sleep 3");
}

#[test]
fn sweep_on_next_submission_evicts_exited_background_job() {
    let mut shell = Shell::new();
    run(&mut shell, "sleep 0.1 &");
    assert!(shell.has_jobs());

    thread::sleep(Duration::from_millis(400));
    run(&mut shell, "true");
    assert!(!shell.has_jobs());
}

#[test]
fn builtin_discard_rolls_the_job_id_back() {
    let mut shell = Shell::new();
    run(&mut shell, "sleep 2 &");
    // `jobs` pre-registers a job record, then discards it and rolls the id
    // counter back, so the next real job reuses its id.
    run(&mut shell, "jobs");
    run(&mut shell, "sleep 3 &");
    let ids: Vec<JobId> = shell.get_jobs().iter().map(|job| job.id()).collect();
    assert_eq!(ids, vec![JobId(0), JobId(1)]);
}

#[test]
fn fg_brings_a_background_job_to_the_foreground_and_waits() {
    let mut shell = Shell::new();
    run(&mut shell, "sleep 1 &");
    let start = Instant::now();
    // The promoted job becomes the head job, so the foreground wait of this
    // very submission blocks until it drains.
    run(&mut shell, "fg 0");
    assert!(start.elapsed() >= Duration::from_millis(500));
    assert!(!shell.has_jobs());
}

#[test]
fn fg_with_unknown_id_leaves_the_table_unchanged() {
    let mut shell = Shell::new();
    run(&mut shell, "sleep 2 &");
    run(&mut shell, "fg 99");
    let jobs = shell.get_jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id(), JobId(0));
    assert!(jobs[0].is_background());
}

#[test]
fn missing_program_is_not_fatal() {
    let mut shell = Shell::new();
    run(&mut shell, "tsh-definitely-not-a-command");
    assert!(!shell.has_jobs());
}

#[test]
fn builtin_mixed_with_external_commands_is_refused() {
    let mut shell = Shell::new();
    run(&mut shell, "jobs | cat");
    assert!(!shell.has_jobs());
}

#[test]
fn cd_changes_the_working_directory() {
    let _guard = CWD_LOCK.lock().unwrap();
    let original = env::current_dir().unwrap();
    let dir = TempDir::new("tsh-cd").unwrap();
    let target = dir.path().canonicalize().unwrap();

    let mut shell = Shell::new();
    run(&mut shell, &format!("cd {}", target.display()));
    assert_eq!(env::current_dir().unwrap(), target);

    run(&mut shell, "cd /");
    assert_eq!(env::current_dir().unwrap(), PathBuf::from("/"));

    env::set_current_dir(original).unwrap();
}

#[test]
fn cd_ignores_extra_arguments() {
    let _guard = CWD_LOCK.lock().unwrap();
    let original = env::current_dir().unwrap();
    let dir = TempDir::new("tsh-cd").unwrap();
    let target = dir.path().canonicalize().unwrap();

    let mut shell = Shell::new();
    run(&mut shell, &format!("cd {} extra", target.display()));
    assert_eq!(env::current_dir().unwrap(), target);

    env::set_current_dir(original).unwrap();
}

#[test]
fn cd_to_a_missing_directory_is_fatal() {
    let _guard = CWD_LOCK.lock().unwrap();
    let mut shell = Shell::new();
    let result = shell.execute_pipeline(single_pipeline("cd /tsh-definitely-missing"));
    assert!(result.is_err());
}

#[test]
fn sequence_runs_pipelines_in_fifo_order() {
    let dir = TempDir::new("tsh-seq").unwrap();
    let out = dir.path().join("out.txt");
    let mut shell = Shell::new();

    let input = format!("echo one >> {0} ; echo two >> {0}", out.display());
    let sequence = parser::parse(&input).unwrap();
    shell.execute_sequence(sequence).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap(), "one\ntwo\n");
}
