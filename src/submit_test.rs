use crate::config;
use crate::job::JobSpec;
use crate::scan;
use crate::submit::{command_line, parse_scheduler_id, Submitter};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn job(name: &str, backend: &str) -> JobSpec {
    let raw = format!(
        r#"
[environment]
backend = "{backend}"

[job]
name = "{name}"

[script]
n_gaps = 4
"#
    );

    JobSpec::from_config(raw.parse().unwrap()).unwrap()
}

fn entries(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

#[test]
pub fn dry_run_writes_nothing() {
    let dir = tempdir().unwrap();
    let jobs = vec![job("a", "local"), job("b", "local"), job("c", "slurm")];

    let results = Submitter::new(dir.path()).submit_batch(&jobs, true, false);

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|result| result.succeeded()));
    assert_eq!(entries(dir.path()), 0);
}

#[test]
pub fn local_submission_cleans_up() {
    let dir = tempdir().unwrap();
    let result = Submitter::new(dir.path()).submit_one(&job("bii", "local"), true, false);

    assert!(result.succeeded());
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(entries(dir.path()), 0);
}

#[test]
pub fn disabled_cleanup_retains_artifacts() {
    let dir = tempdir().unwrap();
    let result = Submitter::new(dir.path()).submit_one(&job("bii", "local"), false, false);

    assert!(result.succeeded());
    let script = fs::read_to_string(&result.script_path).unwrap();
    assert!(script.starts_with("#!/bin/bash\n"));
    assert!(script.contains("--config_file"));

    // the per-job config round-trips through the store
    let config = config::load(&result.config_path).unwrap();
    let written = scan::single(&config);
    assert_eq!(written.name, "bii");
}

#[test]
pub fn keep_configs_retains_only_the_config() {
    let dir = tempdir().unwrap();
    let result = Submitter::new(dir.path()).submit_one(&job("bii", "local"), true, true);

    assert!(result.succeeded());
    assert!(!result.script_path.exists());
    assert!(result.config_path.exists());
}

#[test]
pub fn failed_enqueue_is_recorded_and_cleaned_up() {
    let dir = tempdir().unwrap();
    // ccc_msub is not installed here, so the spawn fails
    let result = Submitter::new(dir.path()).submit_one(&job("bii", "ccrt"), true, false);

    assert!(!result.succeeded());
    // cleanup still ran on the failure path
    assert_eq!(entries(dir.path()), 0);
}

#[test]
pub fn batch_continues_past_failures() {
    let dir = tempdir().unwrap();
    let jobs = vec![job("a", "ccrt"), job("b", "local")];

    let results = Submitter::new(dir.path()).submit_batch(&jobs, false, false);

    assert_eq!(results.len(), 2);
    assert!(!results[0].succeeded());
    assert!(results[1].succeeded());
}

#[test]
pub fn scheduler_id_is_the_trailing_token() {
    assert_eq!(
        parse_scheduler_id("Submitted batch job 123456\n"),
        Some("123456".to_string())
    );
    assert_eq!(parse_scheduler_id(""), None);
}

#[test]
pub fn command_line_invokes_the_entry_point() {
    let job = job("bii", "local");
    let line = command_line(&job, Path::new("bii_config.toml"));

    assert_eq!(line, "python track_bii.py --config_file bii_config.toml");
}
