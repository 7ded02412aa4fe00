use crate::job::JobSpec;

/// MSUB-style submission script for the ccrt cluster
///
/// Jobs run inside a pcocc container; GPU jobs switch to the GPU partition
/// and image and load the nvidia container module.
pub fn script(job: &JobSpec, command_line: &str) -> String {
    let resources = &job.resources;
    let environment = &job.environment;

    let partition = if resources.gpu {
        &resources.gpu_partition
    } else {
        &resources.partition
    };
    let image = if resources.gpu {
        &environment.gpu_image
    } else {
        &environment.image
    };

    let mut script = String::from("#!/bin/bash\n");
    script.push_str("#MSUB -m work,scratch\n");
    script.push_str(&format!("#MSUB -q {partition}\n"));
    script.push_str(&format!("#MSUB -Q {}\n", resources.queue));
    script.push_str(&format!("#MSUB -n {}\n", resources.nodes));
    script.push_str(&format!("#MSUB -c {}\n", resources.cpus));
    script.push_str(&format!("#MSUB -T {}\n", resources.time));
    script.push_str(&format!("#MSUB -A {}\n", resources.account));
    if let Some(mail) = &resources.mail {
        script.push_str(&format!("#MSUB -@ {mail}:begin,end,requeue\n"));
    }
    script.push_str(&format!(
        "#MSUB -o {}\n",
        resources
            .out_folder
            .join(format!("{}.out", job.name))
            .display()
    ));
    script.push_str(&format!(
        "#MSUB -e {}\n",
        resources
            .err_folder
            .join(format!("{}.err", job.name))
            .display()
    ));
    script.push_str("module purge\n");

    let mut invocation = vec!["pcocc".to_string(), "run".to_string()];
    for mount in &environment.mounts {
        invocation.push(format!("--mount src={},dst={}", mount.source, mount.dest));
    }
    if resources.gpu {
        invocation.push("-M nvidia".to_string());
    }
    invocation.push(format!("-I {image}"));
    invocation.push("--entry-point".to_string());
    invocation.push(format!("-- {command_line}"));

    script.push_str(&invocation.join(" "));
    script.push('\n');
    script
}
