use std::io::BufRead;

use tracing::info;

use crate::config::RunConfig;
use crate::confirm::{read_confirmation, CONFIRMATION_TOKEN};
use crate::error::Result;
use crate::host::HostSystem;
use crate::model::SizeSnapshot;
use crate::pipeline::{Pipeline, StepReport};
use crate::plan::{build_plan, render, write_plan_json, ResizePlan};
use crate::preflight::{check_environment, detect_root_mount};
use crate::runlog::RunLog;
use crate::{snapshot, topology};

#[derive(Debug)]
pub enum RunOutcome {
    DryRun {
        plan: ResizePlan,
    },
    Completed {
        plan: ResizePlan,
        steps: Vec<StepReport>,
        after: SizeSnapshot,
    },
}

pub fn run(
    config: &RunConfig,
    host: &dyn HostSystem,
    input: &mut dyn BufRead,
    log: &mut RunLog,
) -> Result<RunOutcome> {
    log.info("Checking privileges and required tools");
    check_environment(host)?;

    let mount = detect_root_mount(host)?;
    log.info(format!(
        "Root filesystem {} ({}) is on LVM",
        mount.source, mount.fstype
    ));

    let resolved = topology::resolve(host, &mount)?;
    let topology = &resolved.topology;
    if !topology.selection_certain {
        log.warn(format!(
            "Volume group {} has {} physical volumes and none could be matched to the root \
             device's disk; defaulting to the first listed, {}",
            topology.vg_name,
            topology.physical_volumes.len(),
            topology.selected_pv
        ));
    }

    let before = snapshot::capture(host, &mount.target, topology, &resolved.disk);
    let plan = build_plan(&mount, topology, &resolved.disk, before);
    for line in render(&plan) {
        log.plain(line);
    }

    if let Some(path) = &config.plan_json {
        write_plan_json(&plan, path)?;
        log.info(format!("Plan written to {}", path.display()));
    }

    if config.dry_run {
        log.success("Dry run: no changes were made");
        return Ok(RunOutcome::DryRun { plan });
    }

    if config.assume_yes {
        log.info("--assume-yes given, skipping confirmation");
    } else {
        log.prompt(&format!(
            "These changes cannot be undone. Type '{CONFIRMATION_TOKEN}' to continue: "
        ));
        read_confirmation(input)?;
        log.info("Confirmed by operator");
    }

    info!(vg = %topology.vg_name, lv = %topology.lv_path, "starting resize pipeline");
    let steps = Pipeline::new(host, &mount, topology, &resolved.disk).run(log)?;

    let after = snapshot::capture(host, &mount.target, topology, &resolved.disk);
    report(log, &plan.before, &after);

    Ok(RunOutcome::Completed { plan, steps, after })
}

fn report(log: &mut RunLog, before: &SizeSnapshot, after: &SizeSnapshot) {
    log.success("Root filesystem resized");
    log.plain("Before -> after:");
    for line in snapshot::compare(before, after) {
        log.plain(format!("  {line}"));
    }
    match log.path().map(|path| path.display().to_string()) {
        Some(path) => log.info(format!("Log written to {path}")),
        None => log.warn("No log file could be opened; this run was not recorded"),
    }
}
