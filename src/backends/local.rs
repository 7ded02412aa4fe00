use crate::job::JobSpec;

/// local execution needs no resource directives, just the command
pub fn script(_job: &JobSpec, command_line: &str) -> String {
    format!("#!/bin/bash\n{command_line}\n")
}
