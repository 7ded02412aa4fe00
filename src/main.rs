mod backends;
mod config;
mod job;
mod merge;
mod scan;
mod shim;
mod submit;

#[cfg(test)]
mod scan_test;
#[cfg(test)]
mod shim_test;
#[cfg(test)]
mod submit_test;

use clap::{Args, Parser, Subcommand};
use job::JobSpec;
use merge::Overrides;
use std::{path::PathBuf, process::exit};
use submit::Submitter;
use toml::Value;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "jobsmith",
    version,
    about = "Submit simulation jobs to HPC schedulers from a TOML configuration"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit the single job described by a configuration file
    Submit(SubmitArgs),
    /// Expand the [scan] section into a Cartesian grid and submit every grid point
    SubmitScan(SubmitArgs),
}

#[derive(Args, Debug)]
struct SubmitArgs {
    /// Path to the .toml configuration file
    #[arg(long = "config_file", value_name = "CONFIG_FILE")]
    config_file: PathBuf,

    /// Print the jobs that would be submitted without submitting them
    #[arg(long)]
    dry_run: bool,

    /// Keep generated per-job config files after submission
    #[arg(long)]
    keep_configs: bool,

    /// Override job.name
    #[arg(long, value_name = "JOB_NAME")]
    job_name: Option<String>,

    /// Override job.time
    #[arg(long, value_name = "JOB_TIME")]
    time: Option<u64>,

    /// Override environment.backend ("local", "ccrt" or "slurm")
    #[arg(long, value_name = "BACKEND")]
    backend: Option<String>,

    /// Override a [script] parameter (repeatable)
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Submit(args) => run(&args, false),
        Commands::SubmitScan(args) => run(&args, true),
    };

    exit(code);
}

fn run(args: &SubmitArgs, scan_mode: bool) -> i32 {
    let file = match config::load(&args.config_file) {
        Ok(file) => file,
        Err(e) => {
            error!("{e}");
            return 1;
        }
    };

    let overrides = match cli_overrides(args) {
        Ok(overrides) => overrides,
        Err(param) => {
            error!("Invalid --param '{param}', expected KEY=VALUE");
            return 1;
        }
    };

    let resolved = merge::merge(&merge::default_config(), &file, &overrides);
    if let Err(e) = config::validate(&resolved) {
        error!("{e}");
        return 1;
    }

    let points = if scan_mode {
        match scan::expand(&resolved) {
            Ok(points) => points,
            Err(e) => {
                error!("{e}");
                return 1;
            }
        }
    } else {
        vec![scan::single(&resolved)]
    };

    // resolve every grid point before anything is written, so an unknown
    // backend or malformed section aborts with no partial batch on disk
    let jobs: Vec<JobSpec> = match points.into_iter().map(JobSpec::from_grid_point).collect() {
        Ok(jobs) => jobs,
        Err(e) => {
            error!("{e}");
            return 1;
        }
    };

    println!("Generated {} job(s) from configuration.", jobs.len());

    let submitter = Submitter::new(".");
    let results = submitter.submit_batch(&jobs, args.dry_run, args.keep_configs);
    let failures = results.iter().filter(|result| !result.succeeded()).count();

    if args.dry_run {
        println!("\n(Dry run mode - no jobs were submitted)");
    } else {
        println!(
            "Submitted {}/{} job(s), {failures} failure(s).",
            results.len() - failures,
            results.len()
        );
    }

    if failures > 0 {
        1
    } else {
        0
    }
}

/// turn the CLI flags into the merge override layer; flags that were not
/// supplied stay unset and never override the configuration file
fn cli_overrides(args: &SubmitArgs) -> Result<Overrides, String> {
    let mut overrides = Overrides::new();
    overrides.insert("job.name".to_string(), args.job_name.clone().map(Value::String));
    overrides.insert(
        "job.time".to_string(),
        args.time.map(|time| Value::Integer(time as i64)),
    );
    overrides.insert(
        "environment.backend".to_string(),
        args.backend.clone().map(Value::String),
    );

    for param in &args.params {
        let (key, raw) = param.split_once('=').ok_or_else(|| param.clone())?;
        overrides.insert(format!("script.{key}"), Some(parse_scalar(raw)));
    }

    Ok(overrides)
}

/// parse an override value as TOML, falling back to a bare string
fn parse_scalar(raw: &str) -> Value {
    toml::from_str::<config::Table>(&format!("value = {raw}"))
        .ok()
        .and_then(|mut table| table.remove("value"))
        .unwrap_or_else(|| Value::String(raw.to_string()))
}
