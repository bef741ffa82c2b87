use std::fmt;

use serde::{Deserialize, Serialize};

pub const STEP_COUNT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MountInfo {
    pub target: String,
    pub source: String,
    pub fstype: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VolumeTopology {
    pub vg_name: String,
    pub lv_name: String,
    pub lv_path: String,
    pub physical_volumes: Vec<String>,
    pub selected_pv: String,
    /// False when the selected PV was the first-listed default rather than a
    /// match against the root device's parent disk.
    pub selection_certain: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhysicalDisk {
    pub disk: String,
    pub partition: Option<u32>,
}

impl PhysicalDisk {
    pub fn whole(disk: impl Into<String>) -> Self {
        Self {
            disk: disk.into(),
            partition: None,
        }
    }

    pub fn partitioned(disk: impl Into<String>, partition: u32) -> Self {
        Self {
            disk: disk.into(),
            partition: Some(partition),
        }
    }

    pub fn kernel_name(&self) -> &str {
        self.disk.rsplit('/').next().unwrap_or(&self.disk)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SizeSnapshot {
    pub disk_size_bytes: Option<u64>,
    pub pv_size_bytes: Option<u64>,
    pub vg_free_bytes: Option<u64>,
    pub mount_usage: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilesystemKind {
    Ext,
    Xfs,
    Btrfs,
}

impl FilesystemKind {
    pub fn from_fstype(fstype: &str) -> Option<Self> {
        match fstype.trim().to_ascii_lowercase().as_str() {
            "ext2" | "ext3" | "ext4" => Some(Self::Ext),
            "xfs" => Some(Self::Xfs),
            "btrfs" => Some(Self::Btrfs),
            _ => None,
        }
    }

    pub fn grow_tool(self) -> &'static str {
        match self {
            Self::Ext => "resize2fs",
            Self::Xfs => "xfs_growfs",
            Self::Btrfs => "btrfs",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Rescan,
    GrowPartition,
    ResizePhysicalVolume,
    ExtendLogicalVolume,
    GrowFilesystem,
}

impl StepKind {
    pub const ALL: [StepKind; STEP_COUNT] = [
        StepKind::Rescan,
        StepKind::GrowPartition,
        StepKind::ResizePhysicalVolume,
        StepKind::ExtendLogicalVolume,
        StepKind::GrowFilesystem,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Rescan => 1,
            Self::GrowPartition => 2,
            Self::ResizePhysicalVolume => 3,
            Self::ExtendLogicalVolume => 4,
            Self::GrowFilesystem => 5,
        }
    }

    pub fn is_advisory(self) -> bool {
        matches!(self, Self::Rescan)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Rescan => "rescan disk",
            Self::GrowPartition => "grow partition",
            Self::ResizePhysicalVolume => "resize physical volume",
            Self::ExtendLogicalVolume => "extend logical volume",
            Self::GrowFilesystem => "grow filesystem",
        };
        f.write_str(label)
    }
}
