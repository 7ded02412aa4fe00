#![allow(deprecated)]

use crate::config::Table;
use crate::shim;
use std::path::Path;
use tempfile::tempdir;

fn legacy_config() -> Table {
    r#"
[environment]
backend = "local"

[job]
name = "legacy"

[script]
n_gaps = 4
"#
    .parse()
    .unwrap()
}

#[test]
pub fn command_string_matches_legacy_format() {
    assert_eq!(
        shim::get_command_string("config.toml", "track_bii.py"),
        "python track_bii.py --config_file config.toml\n"
    );
}

#[test]
pub fn legacy_script_writer_forwards_to_the_synthesizer() {
    let script =
        shim::write_tmp_submission_script(&legacy_config(), Path::new("config.toml")).unwrap();

    assert!(script.starts_with("#!/bin/bash\n"));
    assert!(script.contains("--config_file config.toml"));
}

#[test]
pub fn legacy_submit_forwards_to_the_submitter() {
    let dir = tempdir().unwrap();
    let result = shim::submit_job(&legacy_config(), dir.path()).unwrap();

    assert!(result.succeeded());
    assert_eq!(result.job, "legacy");
}
