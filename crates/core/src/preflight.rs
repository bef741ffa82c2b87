use crate::error::{ResizeError, Result};
use crate::host::HostSystem;
use crate::model::MountInfo;
use crate::tools::{BlockDevices, PartitionTool};

pub const ROOT_MOUNT: &str = "/";

pub const REQUIRED_TOOLS: &[&str] = &[
    "lsblk", "findmnt", "lvs", "pvs", "vgs", "pvresize", "lvextend", "df",
];

pub fn check_environment(host: &dyn HostSystem) -> Result<()> {
    if !host.is_privileged() {
        return Err(ResizeError::Environment(
            "root privileges are required (re-run with sudo)".to_string(),
        ));
    }

    let missing = REQUIRED_TOOLS
        .iter()
        .copied()
        .filter(|tool| !host.tool_available(tool))
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(ResizeError::Environment(format!(
            "required tool(s) not found on PATH: {}",
            missing.join(", ")
        )));
    }

    if !PartitionTool::new(host).is_available() {
        return Err(ResizeError::Environment(
            "neither growpart nor parted is available; install cloud-guest-utils or parted"
                .to_string(),
        ));
    }

    Ok(())
}

pub fn detect_root_mount(host: &dyn HostSystem) -> Result<MountInfo> {
    let block = BlockDevices::new(host);
    let mount = block.mount_info(ROOT_MOUNT).map_err(|err| {
        ResizeError::Topology(format!("could not read the root mount: {err}"))
    })?;

    let device_type = block.device_type(&mount.source).map_err(|err| {
        ResizeError::Topology(format!("could not inspect {}: {err}", mount.source))
    })?;
    if device_type != "lvm" {
        return Err(ResizeError::Topology(format!(
            "root filesystem on {} is a '{}' device, not an LVM logical volume",
            mount.source,
            if device_type.is_empty() {
                "unknown"
            } else {
                device_type.as_str()
            }
        )));
    }

    Ok(mount)
}
