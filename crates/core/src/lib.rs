pub mod config;
pub mod confirm;
pub mod device;
pub mod error;
pub mod host;
pub mod model;
pub mod orchestrator;
pub mod pipeline;
pub mod plan;
pub mod preflight;
pub mod runlog;
pub mod snapshot;
pub mod tools;
pub mod topology;

pub use config::{log_candidates, open_log, RunConfig, SYSTEM_LOG_PATH};
pub use confirm::{read_confirmation, CONFIRMATION_TOKEN};
pub use device::{match_device_path, resolve_physical_disk, DiskResolution};
pub use error::{ResizeError, Result, ToolError};
pub use host::{CommandOutput, HostSystem, LocalHost};
pub use model::{
    FilesystemKind, MountInfo, PhysicalDisk, SizeSnapshot, StepKind, VolumeTopology, STEP_COUNT,
};
pub use orchestrator::{run, RunOutcome};
pub use pipeline::{Pipeline, StepOutcome, StepReport};
pub use plan::{build_plan, render, write_plan_json, PlannedAction, ResizePlan};
pub use runlog::RunLog;
pub use topology::ResolvedTopology;
