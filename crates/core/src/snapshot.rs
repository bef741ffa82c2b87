use std::fmt::Display;

use tracing::debug;

use crate::error::ToolError;
use crate::host::HostSystem;
use crate::model::{PhysicalDisk, SizeSnapshot, VolumeTopology};
use crate::tools::{BlockDevices, VolumeManager};

pub fn capture(
    host: &dyn HostSystem,
    mount_target: &str,
    topology: &VolumeTopology,
    disk: &PhysicalDisk,
) -> SizeSnapshot {
    let block = BlockDevices::new(host);
    let lvm = VolumeManager::new(host);

    SizeSnapshot {
        disk_size_bytes: field("disk size", block.size_bytes(&disk.disk)),
        pv_size_bytes: field("pv size", lvm.pv_size(&topology.selected_pv)),
        vg_free_bytes: field("vg free", lvm.vg_free(&topology.vg_name)),
        mount_usage: field("mount usage", block.usage_line(mount_target)),
    }
}

fn field<T>(name: &str, value: Result<T, ToolError>) -> Option<T> {
    value
        .map_err(|err| debug!(field = name, error = %err, "size query failed"))
        .ok()
}

pub fn describe(snapshot: &SizeSnapshot) -> Vec<String> {
    vec![
        format!("Disk size:       {}", bytes_or_unknown(snapshot.disk_size_bytes)),
        format!("PV size:         {}", bytes_or_unknown(snapshot.pv_size_bytes)),
        format!("VG free space:   {}", bytes_or_unknown(snapshot.vg_free_bytes)),
        format!("Root usage:      {}", or_unknown(snapshot.mount_usage.as_ref())),
    ]
}

pub fn compare(before: &SizeSnapshot, after: &SizeSnapshot) -> Vec<String> {
    vec![
        row("Disk size", before.disk_size_bytes, after.disk_size_bytes),
        row("PV size", before.pv_size_bytes, after.pv_size_bytes),
        row("VG free space", before.vg_free_bytes, after.vg_free_bytes),
        format!(
            "{:<15} {} -> {}",
            "Root usage:",
            or_unknown(before.mount_usage.as_ref()),
            or_unknown(after.mount_usage.as_ref())
        ),
    ]
}

fn row(label: &str, before: Option<u64>, after: Option<u64>) -> String {
    format!(
        "{:<15} {} -> {}",
        format!("{label}:"),
        bytes_or_unknown(before),
        bytes_or_unknown(after)
    )
}

fn bytes_or_unknown(value: Option<u64>) -> String {
    value.map(human_bytes).unwrap_or_else(|| "unknown".to_string())
}

fn or_unknown(value: Option<&impl Display>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn human_bytes(value: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if value == 0 {
        return "0 B".to_string();
    }
    let mut size = value as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}
