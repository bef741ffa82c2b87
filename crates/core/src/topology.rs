use tracing::debug;

use crate::device::{resolve_physical_disk, DiskResolution};
use crate::error::{ResizeError, Result};
use crate::host::HostSystem;
use crate::model::{MountInfo, PhysicalDisk, VolumeTopology};
use crate::tools::{BlockDevices, VolumeManager};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTopology {
    pub topology: VolumeTopology,
    pub disk: PhysicalDisk,
}

pub fn resolve(host: &dyn HostSystem, mount: &MountInfo) -> Result<ResolvedTopology> {
    let block = BlockDevices::new(host);
    let lvm = VolumeManager::new(host);

    let lv = lvm.logical_volume(&mount.source).map_err(|err| {
        ResizeError::Topology(format!(
            "no volume group owns {}: {err}",
            mount.source
        ))
    })?;

    let physical_volumes = lvm.physical_volumes(&lv.vg_name).map_err(|err| {
        ResizeError::Topology(format!(
            "could not list physical volumes of {}: {err}",
            lv.vg_name
        ))
    })?;
    if physical_volumes.is_empty() {
        return Err(ResizeError::Topology(format!(
            "volume group {} reports no physical volumes",
            lv.vg_name
        )));
    }

    let (selected_pv, selection_certain) =
        select_physical_volume(&block, &mount.source, &physical_volumes);
    let disk = disk_of(&block, &selected_pv)?;

    Ok(ResolvedTopology {
        topology: VolumeTopology {
            vg_name: lv.vg_name,
            lv_name: lv.lv_name,
            lv_path: lv.lv_path.unwrap_or_else(|| mount.source.clone()),
            physical_volumes,
            selected_pv,
            selection_certain,
        },
        disk,
    })
}

pub fn disk_of(block: &BlockDevices<'_>, device: &str) -> Result<PhysicalDisk> {
    let resolution = resolve_physical_disk(block, device).map_err(|err| {
        ResizeError::Topology(format!("could not resolve the disk behind {device}: {err}"))
    })?;
    match resolution {
        DiskResolution::Resolved(disk) => Ok(disk),
        DiskResolution::Ambiguous(parents) => Err(ResizeError::Topology(format!(
            "{device} sits on several devices ({}); expected exactly one disk",
            parents.join(", ")
        ))),
        DiskResolution::Unknown => Err(ResizeError::Topology(format!(
            "{device} does not match a known disk naming scheme and has no parent device"
        ))),
    }
}

/// Prefers the PV on the same disk as the root device. Returns the choice and
/// whether it was a match rather than the first-listed default.
fn select_physical_volume(
    block: &BlockDevices<'_>,
    root_source: &str,
    physical_volumes: &[String],
) -> (String, bool) {
    let first = physical_volumes[0].clone();
    if physical_volumes.len() == 1 {
        return (first, true);
    }

    let parents = match block.parents(root_source) {
        Ok(parents) => parents,
        Err(err) => {
            debug!(error = %err, "parent lookup for root device failed");
            return (first, false);
        }
    };
    let root_disks = parents
        .iter()
        .filter_map(|parent| disk_of(block, &format!("/dev/{parent}")).ok())
        .map(|disk| disk.disk)
        .collect::<Vec<_>>();

    physical_volumes
        .iter()
        .find(|pv| {
            disk_of(block, pv)
                .map(|disk| root_disks.contains(&disk.disk))
                .unwrap_or(false)
        })
        .map(|pv| (pv.clone(), true))
        .unwrap_or((first, false))
}
