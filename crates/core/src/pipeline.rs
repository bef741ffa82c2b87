use serde::Serialize;
use tracing::warn;

use crate::error::{ResizeError, Result, ToolError};
use crate::host::HostSystem;
use crate::model::{FilesystemKind, MountInfo, PhysicalDisk, StepKind, VolumeTopology, STEP_COUNT};
use crate::runlog::RunLog;
use crate::tools::{BlockDevices, FilesystemTool, PartitionGrowth, PartitionTool, VolumeManager};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed(String),
    Skipped(String),
    /// The step did not do its job but the run continues.
    Warned(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: StepKind,
    pub outcome: StepOutcome,
}

pub struct Pipeline<'a> {
    host: &'a dyn HostSystem,
    mount: &'a MountInfo,
    topology: &'a VolumeTopology,
    disk: &'a PhysicalDisk,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        host: &'a dyn HostSystem,
        mount: &'a MountInfo,
        topology: &'a VolumeTopology,
        disk: &'a PhysicalDisk,
    ) -> Self {
        Self {
            host,
            mount,
            topology,
            disk,
        }
    }

    pub fn run(&self, log: &mut RunLog) -> Result<Vec<StepReport>> {
        let mut reports = Vec::with_capacity(STEP_COUNT);
        for step in StepKind::ALL {
            log.step(format!("{}/{STEP_COUNT} {step}", step.index()));
            let outcome = self.execute(step)?;
            match &outcome {
                StepOutcome::Completed(detail) => log.success(detail),
                StepOutcome::Warned(reason) if step.is_advisory() => {
                    log.warn(format!("{reason} (advisory step, continuing)"))
                }
                StepOutcome::Skipped(reason) | StepOutcome::Warned(reason) => log.warn(reason),
            }
            reports.push(StepReport { step, outcome });
        }
        Ok(reports)
    }

    fn execute(&self, step: StepKind) -> Result<StepOutcome> {
        match step {
            StepKind::Rescan => Ok(self.rescan()),
            StepKind::GrowPartition => self.grow_partition(),
            StepKind::ResizePhysicalVolume => {
                let pv = &self.topology.selected_pv;
                VolumeManager::new(self.host)
                    .resize_pv(pv)
                    .map_err(|source| failure(step, pv, source))?;
                Ok(StepOutcome::Completed(format!("physical volume {pv} resized")))
            }
            StepKind::ExtendLogicalVolume => {
                let lv = &self.topology.lv_path;
                VolumeManager::new(self.host)
                    .extend_lv(lv)
                    .map_err(|source| failure(step, lv, source))?;
                Ok(StepOutcome::Completed(format!(
                    "logical volume {lv} extended over all free space in {}",
                    self.topology.vg_name
                )))
            }
            StepKind::GrowFilesystem => self.grow_filesystem(),
        }
    }

    fn rescan(&self) -> StepOutcome {
        match BlockDevices::new(self.host).rescan(self.disk) {
            Ok(()) => StepOutcome::Completed(format!("kernel rescanned {}", self.disk.disk)),
            Err(err) => {
                warn!(disk = %self.disk.disk, error = %err, "rescan failed");
                StepOutcome::Warned(format!(
                    "rescan of {} failed ({err}); continuing with the size the kernel already reports",
                    self.disk.disk
                ))
            }
        }
    }

    fn grow_partition(&self) -> Result<StepOutcome> {
        let Some(number) = self.disk.partition else {
            return Ok(StepOutcome::Skipped(format!(
                "{} is a whole-disk physical volume; no partition to grow",
                self.topology.selected_pv
            )));
        };

        let growth = PartitionTool::new(self.host)
            .grow_to_end(&self.disk.disk, number)
            .map_err(|source| {
                failure(
                    StepKind::GrowPartition,
                    &format!("{} partition {number}", self.disk.disk),
                    source,
                )
            })?;
        Ok(match growth {
            PartitionGrowth::Grown { tool } => StepOutcome::Completed(format!(
                "partition {number} of {} grown with {tool}",
                self.disk.disk
            )),
            PartitionGrowth::AlreadyFull => StepOutcome::Warned(format!(
                "partition {number} of {} already fills the disk",
                self.disk.disk
            )),
        })
    }

    fn grow_filesystem(&self) -> Result<StepOutcome> {
        let lv = &self.topology.lv_path;
        let Some(kind) = FilesystemKind::from_fstype(&self.mount.fstype) else {
            return Err(ResizeError::UnsupportedFilesystem {
                fstype: self.mount.fstype.clone(),
                device: lv.clone(),
            });
        };

        FilesystemTool::new(self.host)
            .grow(kind, lv, &self.mount.target)
            .map_err(|source| failure(StepKind::GrowFilesystem, lv, source))?;
        Ok(StepOutcome::Completed(format!(
            "{} filesystem on {lv} grown",
            self.mount.fstype
        )))
    }
}

fn failure(step: StepKind, target: &str, source: ToolError) -> ResizeError {
    ResizeError::StepFailure {
        step,
        target: target.to_string(),
        source,
    }
}
