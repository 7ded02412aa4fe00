//! Compatibility facade for the pre-CLI submission API.
//!
//! Earlier revisions exposed free functions that wrote and submitted scripts
//! directly; these forward to the current components and exist only so old
//! call sites keep working until they migrate to `jobsmith submit`.

// only the legacy call sites and the shim tests reach these
#![allow(dead_code, deprecated)]

use crate::{
    backends,
    config::Table,
    job::{JobErrors, JobSpec},
    submit::{self, SubmissionResult, Submitter},
};
use std::path::Path;

#[deprecated(note = "use submit::command_line instead")]
pub fn get_command_string(config_file: &str, script_name: &str) -> String {
    format!("python {script_name} --config_file {config_file}\n")
}

#[deprecated(note = "use backends::synthesize through Submitter instead")]
pub fn write_tmp_submission_script(
    config: &Table,
    config_file: &Path,
) -> Result<String, JobErrors> {
    let job = JobSpec::from_config(config.clone())?;

    Ok(backends::synthesize(
        &job,
        &submit::command_line(&job, config_file),
    ))
}

#[deprecated(note = "use Submitter::submit_one instead")]
pub fn submit_job(config: &Table, work_dir: &Path) -> Result<SubmissionResult, JobErrors> {
    let job = JobSpec::from_config(config.clone())?;

    Ok(Submitter::new(work_dir).submit_one(&job, true, false))
}
