use crate::job::JobSpec;
use itertools::Itertools;

/// SBATCH-style submission script
///
/// Jobs run inside a singularity image; GPU jobs additionally request a GPU
/// gres, pass the nvidia runtime through and use the GPU image.
pub fn script(job: &JobSpec, command_line: &str) -> String {
    let resources = &job.resources;
    let environment = &job.environment;

    let image = if resources.gpu {
        &environment.gpu_image
    } else {
        &environment.image
    };

    let mut script = String::from("#!/bin/bash\n");
    script.push_str(&format!("#SBATCH --partition {}\n", resources.partition));
    script.push_str(&format!("#SBATCH -n {}\n", resources.cpus));
    script.push_str(&format!("#SBATCH -N {}\n", resources.nodes));
    script.push_str(&format!("#SBATCH --time={}\n", resources.time));
    script.push_str("#SBATCH --export=ALL\n");
    if resources.gpu {
        script.push_str("#SBATCH --gres=gpu:1\n");
    }
    if let Some(mail) = &resources.mail {
        script.push_str(&format!("#SBATCH --mail-user='{mail}'\n"));
        script.push_str("#SBATCH --mail-type=begin,end,requeue\n");
    }
    script.push_str(&format!(
        "#SBATCH --error={}\n",
        resources
            .err_folder
            .join(format!("{}.err", job.name))
            .display()
    ));
    script.push_str(&format!(
        "#SBATCH --output={}\n",
        resources
            .out_folder
            .join(format!("{}.out", job.name))
            .display()
    ));
    script.push_str("module load tools/singularity/current\n");

    let mut invocation = vec!["singularity".to_string(), "exec".to_string()];
    invocation.push("--no-home".to_string());
    if resources.gpu {
        invocation.push("--nv".to_string());
    }
    if !environment.mounts.is_empty() {
        // singularity takes a comma separated bind list
        let binds = environment
            .mounts
            .iter()
            .map(|mount| format!("{}:{}", mount.source, mount.dest))
            .join(",");
        invocation.push(format!("-B {binds}"));
    }
    invocation.push(image.clone());
    invocation.push(command_line.to_string());

    script.push_str(&invocation.join(" "));
    script.push('\n');
    script
}
