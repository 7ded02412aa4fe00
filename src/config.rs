use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs,
    io::Error,
    path::{Path, PathBuf},
};
use thiserror::Error;
use toml::Value;

pub use toml::Table;

/// Sections that every submittable configuration must carry.
/// `[environment]` and `[scan]` are optional, `[script]` is passed through
/// opaquely to the simulation entry point.
const REQUIRED_SECTIONS: [&str; 2] = ["job", "script"];

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Error,
    },
    #[error("Invalid TOML in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),
    #[error("Missing required section [{0}]")]
    MissingSection(&'static str),
    #[error("Section [{section}] is malformed: {source}")]
    MalformedSection {
        section: &'static str,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid mount '{0}', expected 'source:destination'")]
    InvalidMount(String),
}

/// load a raw configuration table from a TOML file
pub fn load(path: &Path) -> Result<Table, ConfigErrors> {
    if !path.is_file() {
        return Err(ConfigErrors::NotFound(path.to_path_buf()));
    }

    let raw = fs::read_to_string(path).map_err(|source| ConfigErrors::Io {
        path: path.to_path_buf(),
        source,
    })?;

    raw.parse::<Table>().map_err(|source| ConfigErrors::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// write a configuration table back out as TOML
///
/// The serializer emits top-level scalar keys first and every nested table as
/// a `[section]` block, so `load(save(config)) == config` for all supported
/// value kinds.
pub fn save(config: &Table, path: &Path) -> Result<(), ConfigErrors> {
    let rendered = toml::to_string(config)?;

    fs::write(path, rendered).map_err(|source| ConfigErrors::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// check that the configuration can be turned into jobs at all
///
/// This runs before anything is expanded or written to disk so that a broken
/// configuration never leaves half a batch behind.
pub fn validate(config: &Table) -> Result<(), ConfigErrors> {
    for section in REQUIRED_SECTIONS {
        match config.get(section) {
            Some(Value::Table(_)) => {}
            _ => return Err(ConfigErrors::MissingSection(section)),
        }
    }

    Ok(())
}

/// deserialize a named section into its typed view, defaulting absent
/// sections to an empty table so serde defaults apply
pub fn section<T: DeserializeOwned>(config: &Table, name: &'static str) -> Result<T, ConfigErrors> {
    let value = config
        .get(name)
        .cloned()
        .unwrap_or_else(|| Value::Table(Table::new()));

    value
        .try_into()
        .map_err(|source| ConfigErrors::MalformedSection {
            section: name,
            source,
        })
}

/// Typed view of the `[job]` section: scheduler resource requests.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    #[serde(default = "default_job_name")]
    pub name: String,
    // walltime request, passed verbatim to the scheduler
    #[serde(default = "default_time")]
    pub time: u64,
    #[serde(default = "default_cpus")]
    pub cpus: u32,
    #[serde(default = "default_nodes")]
    pub nodes: u32,
    #[serde(default = "default_partition")]
    pub partition: String,
    // partition used instead of `partition` when `gpu` is set
    #[serde(default = "default_gpu_partition")]
    pub gpu_partition: String,
    #[serde(default)]
    pub gpu: bool,
    #[serde(default = "default_queue")]
    pub queue: String,
    #[serde(default = "default_account")]
    pub account: String,
    // mail notifications are skipped entirely when no address is configured
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub err_folder: PathBuf,
    #[serde(default)]
    pub out_folder: PathBuf,
}

/// Typed view of the `[environment]` section: where and how a job runs.
///
/// The container images and mounts used to be hardcoded per cluster; they are
/// explicit fields now so no ambient state leaks into script synthesis.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(default = "default_gpu_image")]
    pub gpu_image: String,
    // mount pairs as 'source:destination'
    #[serde(default)]
    pub mounts: Vec<String>,
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    #[serde(default = "default_script")]
    pub script: String,
}

fn default_job_name() -> String {
    String::from("job")
}

fn default_time() -> u64 {
    10000
}

fn default_cpus() -> u32 {
    32
}

fn default_nodes() -> u32 {
    1
}

fn default_partition() -> String {
    String::from("milan")
}

fn default_gpu_partition() -> String {
    String::from("a100")
}

fn default_queue() -> String {
    String::from("long")
}

fn default_account() -> String {
    String::from("soleil")
}

fn default_backend() -> String {
    String::from("local")
}

fn default_image() -> String {
    String::from("pycomplete")
}

fn default_gpu_image() -> String {
    String::from("pycompletecuda")
}

fn default_interpreter() -> String {
    String::from("python")
}

fn default_script() -> String {
    String::from("track_bii.py")
}
