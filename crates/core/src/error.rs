use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::{StepKind, STEP_COUNT};

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{program} is not installed or not on PATH")]
    Missing { program: String },

    #[error("`{command}` exited unsuccessfully: {detail}")]
    Failed { command: String, detail: String },

    #[error("unexpected output from `{command}`: {detail}")]
    Unparsable { command: String, detail: String },
}

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("environment check failed: {0}")]
    Environment(String),

    #[error("topology detection failed: {0}")]
    Topology(String),

    #[error("aborted at confirmation prompt; no changes were made")]
    UserAbort,

    #[error(
        "step {}/{total} ({step}) failed on {target}: {source}; {}",
        step_position(.step),
        applied_note(.step),
        total = STEP_COUNT
    )]
    StepFailure {
        step: StepKind,
        target: String,
        #[source]
        source: ToolError,
    },

    #[error(
        "unsupported filesystem type '{fstype}' on {device}; the partition and volume \
         growth already took effect, grow the filesystem manually"
    )]
    UnsupportedFilesystem { fstype: String, device: String },
}

impl ResizeError {
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            Self::StepFailure { .. } | Self::UnsupportedFilesystem { .. }
        )
    }
}

fn step_position(step: &StepKind) -> usize {
    step.index()
}

fn applied_note(step: &StepKind) -> String {
    match step.index() {
        1 => "no earlier step took effect".to_string(),
        2 => "step 1 already took effect and was not rolled back".to_string(),
        n => format!("steps 1-{} already took effect and were not rolled back", n - 1),
    }
}

pub type Result<T> = std::result::Result<T, ResizeError>;

#[cfg(test)]
mod tests {
    use super::{ResizeError, ToolError};
    use crate::model::StepKind;

    #[test]
    fn step_failure_names_target_and_prior_steps() {
        let err = ResizeError::StepFailure {
            step: StepKind::ResizePhysicalVolume,
            target: "/dev/sda1".to_string(),
            source: ToolError::Failed {
                command: "pvresize /dev/sda1".to_string(),
                detail: "device busy".to_string(),
            },
        };
        let message = err.to_string();
        assert!(message.contains("step 3/5"));
        assert!(message.contains("/dev/sda1"));
        assert!(message.contains("steps 1-2 already took effect"));
        assert!(err.is_partial());
    }

    #[test]
    fn user_abort_is_not_partial() {
        assert!(!ResizeError::UserAbort.is_partial());
        assert!(!ResizeError::Environment("x".into()).is_partial());
    }
}
