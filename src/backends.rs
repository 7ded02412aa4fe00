mod ccrt;
mod local;
mod slurm;


use crate::job::JobSpec;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ScriptErrors {
    #[error("Backend not supported: {0}")]
    UnknownBackend(String),
}

/// The scheduler convention a job is written for.
/// (this is deliberately a closed enum, every variant owns its own
/// resource-directive and container syntax)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Local,
    Ccrt,
    Slurm,
}

impl FromStr for Backend {
    type Err = ScriptErrors;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "local" => Ok(Self::Local),
            "ccrt" => Ok(Self::Ccrt),
            "slurm" => Ok(Self::Slurm),
            _ => Err(ScriptErrors::UnknownBackend(name.to_string())),
        }
    }
}

impl Backend {
    /// the external enqueue command, None for local execution
    pub fn enqueue_command(&self) -> Option<&'static str> {
        match self {
            Self::Local => None,
            Self::Ccrt => Some("ccc_msub"),
            Self::Slurm => Some("sbatch"),
        }
    }
}

/// render the submission script for one job
///
/// Pure text synthesis, no IO: writing the script to disk and invoking the
/// scheduler belong to the submitter.
pub fn synthesize(job: &JobSpec, command_line: &str) -> String {
    match job.environment.backend {
        Backend::Local => local::script(job, command_line),
        Backend::Ccrt => ccrt::script(job, command_line),
        Backend::Slurm => slurm::script(job, command_line),
    }
}
