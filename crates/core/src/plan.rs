use std::fs;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ResizeError, Result};
use crate::model::{
    FilesystemKind, MountInfo, PhysicalDisk, SizeSnapshot, StepKind, VolumeTopology, STEP_COUNT,
};
use crate::snapshot;
use crate::tools::{grow_command, rescan_path};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResizePlan {
    pub generated_at: String,
    pub mount: MountInfo,
    pub topology: VolumeTopology,
    pub disk: PhysicalDisk,
    pub filesystem: Option<FilesystemKind>,
    pub actions: Vec<PlannedAction>,
    pub before: SizeSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlannedAction {
    pub step: StepKind,
    pub description: String,
    pub runs: bool,
}

pub fn build_plan(
    mount: &MountInfo,
    topology: &VolumeTopology,
    disk: &PhysicalDisk,
    before: SizeSnapshot,
) -> ResizePlan {
    let filesystem = FilesystemKind::from_fstype(&mount.fstype);
    let actions = StepKind::ALL
        .iter()
        .map(|step| planned_action(*step, mount, topology, disk, filesystem))
        .collect();

    ResizePlan {
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        mount: mount.clone(),
        topology: topology.clone(),
        disk: disk.clone(),
        filesystem,
        actions,
        before,
    }
}

fn planned_action(
    step: StepKind,
    mount: &MountInfo,
    topology: &VolumeTopology,
    disk: &PhysicalDisk,
    filesystem: Option<FilesystemKind>,
) -> PlannedAction {
    let (description, runs) = match step {
        StepKind::Rescan => (
            format!(
                "rescan {} capacity via {} (best effort)",
                disk.disk,
                rescan_path(disk).display()
            ),
            true,
        ),
        StepKind::GrowPartition => match disk.partition {
            Some(number) => (
                format!("grow partition {number} of {} to 100% of the disk", disk.disk),
                true,
            ),
            None => (
                format!("skip: {} is a whole-disk physical volume", topology.selected_pv),
                false,
            ),
        },
        StepKind::ResizePhysicalVolume => {
            (format!("pvresize {}", topology.selected_pv), true)
        }
        StepKind::ExtendLogicalVolume => (
            format!("lvextend -l +100%FREE {}", topology.lv_path),
            true,
        ),
        StepKind::GrowFilesystem => match filesystem {
            Some(kind) => {
                let (program, args) = grow_command(kind, &topology.lv_path, &mount.target);
                (
                    format!("grow {} filesystem: {program} {}", mount.fstype, args.join(" ")),
                    true,
                )
            }
            None => (
                format!(
                    "cannot grow '{}' automatically; the run will stop here",
                    mount.fstype
                ),
                false,
            ),
        },
    };

    PlannedAction {
        step,
        description,
        runs,
    }
}

pub fn render(plan: &ResizePlan) -> Vec<String> {
    let topology = &plan.topology;
    let mut lines = vec![
        "Detected layout:".to_string(),
        format!("  Root mount:      {} ({})", plan.mount.source, plan.mount.fstype),
        format!("  Volume group:    {}", topology.vg_name),
        format!(
            "  Logical volume:  {} ({})",
            topology.lv_name, topology.lv_path
        ),
        format!(
            "  Physical vols:   {}",
            topology.physical_volumes.join(", ")
        ),
        format!("  Growing PV:      {}", topology.selected_pv),
        format!(
            "  Backing disk:    {}{}",
            plan.disk.disk,
            plan.disk
                .partition
                .map(|number| format!(" (partition {number})"))
                .unwrap_or_else(|| " (whole disk)".to_string())
        ),
        "Current sizes:".to_string(),
    ];
    lines.extend(
        snapshot::describe(&plan.before)
            .into_iter()
            .map(|line| format!("  {line}")),
    );
    lines.push("Planned actions:".to_string());
    lines.extend(plan.actions.iter().map(|action| {
        format!(
            "  {}/{STEP_COUNT} {}: {}",
            action.step.index(),
            action.step,
            action.description
        )
    }));
    lines
}

pub fn write_plan_json(plan: &ResizePlan, path: &Path) -> Result<()> {
    let payload = serde_json::to_string_pretty(plan).map_err(|err| {
        ResizeError::Environment(format!("failed to serialize plan: {err}"))
    })?;
    fs::write(path, payload).map_err(|err| {
        ResizeError::Environment(format!(
            "failed to write plan to {}: {err}",
            path.display()
        ))
    })
}
