use crate::config::Table;
use itertools::Itertools;
use thiserror::Error;
use toml::Value;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ScanErrors {
    #[error("scan.{key} is malformed: {reason}")]
    InvalidSpec { key: String, reason: String },
    #[error("scan.{key} contains duplicate value {value}")]
    DuplicateValue { key: String, value: String },
}

/// A single scanned parameter: either explicit values or a linspace range.
#[derive(Clone, Debug, PartialEq)]
pub enum ScanSpec {
    List(Vec<Value>),
    Range { start: f64, stop: f64, num: usize },
}

impl ScanSpec {
    /// interpret one `[scan]` entry
    ///
    /// Arrays are explicit value lists, tables are `{start, stop, num}`
    /// ranges and a bare scalar is a one-element list.
    pub fn parse(key: &str, value: &Value) -> Result<Self, ScanErrors> {
        match value {
            Value::Array(values) => {
                if values.is_empty() {
                    return Err(ScanErrors::InvalidSpec {
                        key: key.to_string(),
                        reason: "empty value list".to_string(),
                    });
                }

                Ok(Self::List(values.clone()))
            }
            Value::Table(range) => Ok(Self::Range {
                start: float_field(key, range, "start", 0.0)?,
                stop: float_field(key, range, "stop", 1.0)?,
                num: num_field(key, range)?,
            }),
            scalar => Ok(Self::List(vec![scalar.clone()])),
        }
    }

    /// expand the spec into the concrete ordered value sequence
    pub fn values(&self) -> Vec<Value> {
        match self {
            Self::List(values) => values.clone(),
            Self::Range { start, stop, num } => linspace(*start, *stop, *num)
                .into_iter()
                .map(Value::Float)
                .collect(),
        }
    }
}

/// `num` evenly spaced samples from `start` to `stop` inclusive
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    if num == 1 {
        return vec![start];
    }

    let step = (stop - start) / (num - 1) as f64;
    (0..num).map(|i| start + step * i as f64).collect()
}

/// One grid point: the job name, the fully resolved per-job configuration
/// and the scanned key subset that produced it (kept for dry-run reporting).
#[derive(Clone, Debug)]
pub struct GridPoint {
    pub name: String,
    pub config: Table,
    pub values: Vec<(String, Value)>,
}

/// the degenerate one-element grid for configurations without a scan
pub fn single(base: &Table) -> GridPoint {
    let mut config = base.clone();
    config.remove("scan");

    GridPoint {
        name: job_name(base).unwrap_or_else(|| "job".to_string()),
        config,
        values: Vec::new(),
    }
}

/// expand the `[scan]` section into the full Cartesian grid
///
/// Scan keys iterate in declaration order and the first declared key varies
/// slowest, so job names are deterministic across runs. Names are built as
/// `{base}_{key}_{value}` per scanned key; floats >= 1 keep one decimal
/// digit, floats < 1 keep three.
pub fn expand(base: &Table) -> Result<Vec<GridPoint>, ScanErrors> {
    let scan = match base.get("scan") {
        Some(Value::Table(scan)) if !scan.is_empty() => scan,
        _ => {
            warn!("No [scan] section found, expanding to a single job");
            return Ok(vec![single(base)]);
        }
    };

    let base_name = job_name(base).unwrap_or_else(|| "scan".to_string());

    let mut keys = Vec::new();
    let mut value_sets = Vec::new();
    for (key, spec) in scan {
        let values = ScanSpec::parse(key, spec)?.values();

        // duplicate values within one key would collide in the job name
        for (index, value) in values.iter().enumerate() {
            if values[..index].contains(value) {
                return Err(ScanErrors::DuplicateValue {
                    key: key.clone(),
                    value: format_value(value),
                });
            }
        }

        keys.push(key.clone());
        value_sets.push(values);
    }

    let mut points = Vec::new();
    for combination in value_sets.into_iter().multi_cartesian_product() {
        let mut config = base.clone();
        config.remove("scan");

        let mut name = base_name.clone();
        let mut values = Vec::new();
        for (key, value) in keys.iter().zip(combination) {
            set_script_key(&mut config, key, value.clone());
            name.push('_');
            name.push_str(key);
            name.push('_');
            name.push_str(&format_value(&value));
            values.push((key.clone(), value));
        }

        set_job_name(&mut config, &name);
        points.push(GridPoint {
            name,
            config,
            values,
        });
    }

    Ok(points)
}

/// render a scanned value the way it appears in job names
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Float(float) if *float >= 1.0 => format!("{float:.1}"),
        Value::Float(float) => format!("{float:.3}"),
        Value::String(string) => string.clone(),
        other => other.to_string(),
    }
}

fn float_field(key: &str, range: &Table, field: &str, default: f64) -> Result<f64, ScanErrors> {
    match range.get(field) {
        None => Ok(default),
        Some(Value::Float(value)) => Ok(*value),
        Some(Value::Integer(value)) => Ok(*value as f64),
        Some(other) => Err(ScanErrors::InvalidSpec {
            key: key.to_string(),
            reason: format!("{field} must be a number, got {other}"),
        }),
    }
}

fn num_field(key: &str, range: &Table) -> Result<usize, ScanErrors> {
    match range.get("num") {
        None => Ok(10),
        Some(Value::Integer(num)) if *num >= 1 => Ok(*num as usize),
        Some(other) => Err(ScanErrors::InvalidSpec {
            key: key.to_string(),
            reason: format!("num must be an integer >= 1, got {other}"),
        }),
    }
}

fn job_name(config: &Table) -> Option<String> {
    config
        .get("job")
        .and_then(Value::as_table)
        .and_then(|job| job.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn set_job_name(config: &mut Table, name: &str) {
    if let Some(Value::Table(job)) = config.get_mut("job") {
        job.insert("name".to_string(), Value::String(name.to_string()));
    }
}

fn set_script_key(config: &mut Table, key: &str, value: Value) {
    if let Some(Value::Table(script)) = config.get_mut("script") {
        script.insert(key.to_string(), value);
    }
}
