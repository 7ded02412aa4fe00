use crate::{
    backends,
    config::{self, ConfigErrors},
    job::JobSpec,
    scan,
};
use std::{
    fs,
    io::Error,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SubmitErrors {
    #[error("Failed to serialize job configuration")]
    Config(#[from] ConfigErrors),
    #[error("Failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: Error,
    },
    #[error("Failed to spawn {command}")]
    Spawn {
        command: &'static str,
        #[source]
        source: Error,
    },
    #[error("{command} exited with status {status}")]
    Enqueue { command: &'static str, status: i32 },
}

/// Outcome of one submission attempt. `error` is `None` on success; for a
/// dry run the paths are the ones that would have been written.
#[derive(Debug)]
pub struct SubmissionResult {
    pub job: String,
    pub script_path: PathBuf,
    pub config_path: PathBuf,
    pub exit_code: Option<i32>,
    // opaque identifier echoed by the scheduler, when one was parseable
    pub scheduler_id: Option<String>,
    pub error: Option<SubmitErrors>,
}

impl SubmissionResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Writes per-job artifacts into a working directory, enqueues them with the
/// backend command and cleans up afterwards.
pub struct Submitter {
    work_dir: PathBuf,
}

/// the command the generated script ultimately runs
pub fn command_line(job: &JobSpec, config_path: &Path) -> String {
    format!(
        "{} {} --config_file {}",
        job.environment.interpreter,
        job.environment.script,
        config_path.display()
    )
}

impl Submitter {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    /// write, enqueue and clean up a single job
    ///
    /// Submission failures end up in the result instead of aborting, and
    /// cleanup runs on every exit path, a failed enqueue included.
    pub fn submit_one(&self, job: &JobSpec, cleanup: bool, keep_config: bool) -> SubmissionResult {
        let config_path = self.work_dir.join(format!("{}_config.toml", job.name));
        let script_path = self.work_dir.join(&job.name);

        let mut result = SubmissionResult {
            job: job.name.clone(),
            script_path: script_path.clone(),
            config_path: config_path.clone(),
            exit_code: None,
            scheduler_id: None,
            error: None,
        };

        match self.run(job, &config_path, &script_path) {
            Ok((exit_code, scheduler_id)) => {
                result.exit_code = exit_code;
                result.scheduler_id = scheduler_id;
            }
            Err(error) => {
                if let SubmitErrors::Enqueue { status, .. } = &error {
                    result.exit_code = Some(*status);
                }
                result.error = Some(error);
            }
        }

        debug!(
            job = result.job.as_str(),
            script = %result.script_path.display(),
            config = %result.config_path.display(),
            exit = ?result.exit_code,
            "Submission attempt finished"
        );

        if cleanup {
            remove_artifact(&script_path);
            if !keep_config {
                remove_artifact(&config_path);
            }
        }

        result
    }

    /// submit every job of a batch in sequence
    ///
    /// One failed enqueue does not abort the batch, the remaining jobs are
    /// still attempted. A dry run touches nothing on disk and only reports
    /// the job names with their scanned parameter subsets.
    pub fn submit_batch(
        &self,
        jobs: &[JobSpec],
        dry_run: bool,
        keep_configs: bool,
    ) -> Vec<SubmissionResult> {
        let total = jobs.len();
        let mut results = Vec::with_capacity(total);

        for (index, job) in jobs.iter().enumerate() {
            if dry_run {
                println!(
                    "  [{}/{total}] {}: {{{}}}",
                    index + 1,
                    job.name,
                    format_scanned(job)
                );
                results.push(SubmissionResult {
                    job: job.name.clone(),
                    script_path: self.work_dir.join(&job.name),
                    config_path: self.work_dir.join(format!("{}_config.toml", job.name)),
                    exit_code: None,
                    scheduler_id: None,
                    error: None,
                });
                continue;
            }

            println!("Submitting [{}/{total}]: {}", index + 1, job.name);
            let result = self.submit_one(job, true, keep_configs);
            match (&result.error, &result.scheduler_id) {
                (Some(error), _) => println!("  {} failed: {error}", job.name),
                (None, Some(id)) => println!("  {} enqueued as {id}", job.name),
                (None, None) => {}
            }
            results.push(result);
        }

        results
    }

    fn run(
        &self,
        job: &JobSpec,
        config_path: &Path,
        script_path: &Path,
    ) -> Result<(Option<i32>, Option<String>), SubmitErrors> {
        config::save(&job.config, config_path)?;

        let command_line = command_line(job, config_path);
        let script = backends::synthesize(job, &command_line);
        fs::write(script_path, script).map_err(|source| SubmitErrors::Write {
            path: script_path.to_path_buf(),
            source,
        })?;

        let Some(enqueue) = job.environment.backend.enqueue_command() else {
            debug!(job = job.name.as_str(), "Local backend, nothing to enqueue");
            return Ok((Some(0), None));
        };

        let output = Command::new(enqueue)
            .arg(script_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| SubmitErrors::Spawn {
                command: enqueue,
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if output.status.success() {
            Ok((output.status.code(), parse_scheduler_id(&stdout)))
        } else {
            warn!(
                job = job.name.as_str(),
                "{enqueue} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );

            Err(SubmitErrors::Enqueue {
                command: enqueue,
                status: output.status.code().unwrap_or(-1),
            })
        }
    }
}

/// pull the job identifier out of the enqueue output
/// (`Submitted batch job 42` and the ccc_msub equivalent both end in the id)
pub fn parse_scheduler_id(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().last())
        .map(str::to_string)
}

fn remove_artifact(path: &Path) {
    if path.exists() {
        if let Err(error) = fs::remove_file(path) {
            warn!("Failed to clean up {}: {error}", path.display());
        }
    }
}

fn format_scanned(job: &JobSpec) -> String {
    job.scanned
        .iter()
        .map(|(key, value)| format!("{key}: {}", scan::format_value(value)))
        .collect::<Vec<_>>()
        .join(", ")
}
