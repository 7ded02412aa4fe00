use crate::{
    backends::{Backend, ScriptErrors},
    config::{self, ConfigErrors, EnvironmentConfig, JobConfig, Table},
    scan::GridPoint,
};
use std::path::PathBuf;
use thiserror::Error;
use toml::Value;

#[derive(Error, Debug)]
pub enum JobErrors {
    #[error("Job configuration is invalid")]
    Config(#[from] ConfigErrors),
    #[error("Job environment is invalid")]
    Backend(#[from] ScriptErrors),
}

/// A (host path, in-container path) binding passed to the container runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountPair {
    pub source: String,
    pub dest: String,
}

impl MountPair {
    pub fn parse(raw: &str) -> Result<Self, ConfigErrors> {
        match raw.split_once(':') {
            Some((source, dest)) if !source.is_empty() && !dest.is_empty() => Ok(Self {
                source: source.to_string(),
                dest: dest.to_string(),
            }),
            _ => Err(ConfigErrors::InvalidMount(raw.to_string())),
        }
    }
}

/// Scheduler resource requests for one job.
#[derive(Clone, Debug)]
pub struct Resources {
    pub time: u64,
    pub cpus: u32,
    pub nodes: u32,
    pub partition: String,
    pub gpu_partition: String,
    pub gpu: bool,
    pub queue: String,
    pub account: String,
    pub mail: Option<String>,
    pub err_folder: PathBuf,
    pub out_folder: PathBuf,
}

/// Execution environment: backend plus container image and mounts.
#[derive(Clone, Debug)]
pub struct Environment {
    pub backend: Backend,
    pub image: String,
    pub gpu_image: String,
    pub mounts: Vec<MountPair>,
    pub interpreter: String,
    pub script: String,
}

/// Fully resolved, immutable job: one grid point ready for synthesis.
///
/// `config` is the complete per-job configuration that gets written next to
/// the submission script; the `[script]` keys inside it are opaque to us.
#[derive(Clone, Debug)]
pub struct JobSpec {
    pub name: String,
    pub config: Table,
    pub resources: Resources,
    pub environment: Environment,
    // scanned (key, value) subset, used only for dry-run reporting
    pub scanned: Vec<(String, Value)>,
}

impl JobSpec {
    /// resolve the typed sections of a per-job configuration
    ///
    /// Fails fast on a malformed section, an unparseable mount or an unknown
    /// backend, before anything touches the filesystem.
    pub fn from_config(config: Table) -> Result<Self, JobErrors> {
        let job: JobConfig = config::section(&config, "job")?;
        let environment: EnvironmentConfig = config::section(&config, "environment")?;

        let backend = environment.backend.parse::<Backend>()?;
        let mounts = environment
            .mounts
            .iter()
            .map(|raw| MountPair::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: job.name.clone(),
            config,
            resources: Resources {
                time: job.time,
                cpus: job.cpus,
                nodes: job.nodes,
                partition: job.partition,
                gpu_partition: job.gpu_partition,
                gpu: job.gpu,
                queue: job.queue,
                account: job.account,
                mail: job.mail,
                err_folder: job.err_folder,
                out_folder: job.out_folder,
            },
            environment: Environment {
                backend,
                image: environment.image,
                gpu_image: environment.gpu_image,
                mounts,
                interpreter: environment.interpreter,
                script: environment.script,
            },
            scanned: Vec::new(),
        })
    }

    /// resolve one grid point, keeping its scanned key subset around
    pub fn from_grid_point(point: GridPoint) -> Result<Self, JobErrors> {
        let mut job = Self::from_config(point.config)?;
        job.name = point.name;
        job.scanned = point.values;

        Ok(job)
    }
}
