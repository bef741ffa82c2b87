use std::path::PathBuf;

use tracing::debug;

use crate::error::ToolError;
use crate::host::{CommandOutput, HostSystem};
use crate::model::{FilesystemKind, MountInfo, PhysicalDisk};

fn command_line(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

fn invoke_raw(
    host: &dyn HostSystem,
    program: &str,
    args: &[&str],
) -> Result<CommandOutput, ToolError> {
    debug!(command = %command_line(program, args), "invoking tool");
    host.run(program, args).map_err(|source| ToolError::Spawn {
        program: program.to_string(),
        source,
    })
}

fn invoke(host: &dyn HostSystem, program: &str, args: &[&str]) -> Result<String, ToolError> {
    let output = invoke_raw(host, program, args)?;
    if !output.success {
        return Err(ToolError::Failed {
            command: command_line(program, args),
            detail: output.failure_detail(),
        });
    }
    Ok(output.stdout)
}

fn non_empty_lines(output: &str) -> impl Iterator<Item = &str> {
    output.lines().map(str::trim).filter(|line| !line.is_empty())
}

fn parse_single_u64(command: &str, output: &str) -> Result<u64, ToolError> {
    let value = non_empty_lines(output).next().unwrap_or_default();
    value.parse().map_err(|_| ToolError::Unparsable {
        command: command.to_string(),
        detail: format!("expected a byte count, got '{value}'"),
    })
}

pub struct BlockDevices<'a> {
    host: &'a dyn HostSystem,
}

impl<'a> BlockDevices<'a> {
    pub fn new(host: &'a dyn HostSystem) -> Self {
        Self { host }
    }

    pub fn mount_info(&self, target: &str) -> Result<MountInfo, ToolError> {
        let args = ["-n", "-o", "SOURCE,FSTYPE", target];
        let output = invoke(self.host, "findmnt", &args)?;
        parse_findmnt(target, &output).ok_or_else(|| ToolError::Unparsable {
            command: command_line("findmnt", &args),
            detail: format!("no SOURCE/FSTYPE pair in '{}'", output.trim()),
        })
    }

    pub fn device_type(&self, device: &str) -> Result<String, ToolError> {
        let output = invoke(self.host, "lsblk", &["-dno", "TYPE", device])?;
        let kind = non_empty_lines(&output)
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(kind)
    }

    pub fn parents(&self, device: &str) -> Result<Vec<String>, ToolError> {
        let output = invoke(self.host, "lsblk", &["-dno", "PKNAME", device])?;
        Ok(non_empty_lines(&output).map(str::to_string).collect())
    }

    pub fn size_bytes(&self, device: &str) -> Result<u64, ToolError> {
        let args = ["-bdno", "SIZE", device];
        let output = invoke(self.host, "lsblk", &args)?;
        parse_single_u64(&command_line("lsblk", &args), &output)
    }

    pub fn usage_line(&self, target: &str) -> Result<String, ToolError> {
        let output = invoke(self.host, "df", &["-h", target])?;
        non_empty_lines(&output)
            .last()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .ok_or_else(|| ToolError::Unparsable {
                command: format!("df -h {target}"),
                detail: "empty output".to_string(),
            })
    }

    pub fn rescan(&self, disk: &PhysicalDisk) -> Result<(), ToolError> {
        let path = rescan_path(disk);
        self.host
            .write_file(&path, "1")
            .map_err(|source| ToolError::Write { path, source })
    }
}

pub fn rescan_path(disk: &PhysicalDisk) -> PathBuf {
    PathBuf::from("/sys/class/block")
        .join(disk.kernel_name())
        .join("device/rescan")
}

fn parse_findmnt(target: &str, output: &str) -> Option<MountInfo> {
    let line = non_empty_lines(output).next()?;
    let mut fields = line.split_whitespace();
    let source = fields.next()?;
    let fstype = fields.next()?;
    // btrfs subvolume mounts are reported as `/dev/x[/@]`.
    let source = source.split('[').next().unwrap_or(source);
    Some(MountInfo {
        target: target.to_string(),
        source: source.to_string(),
        fstype: fstype.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalVolumeInfo {
    pub vg_name: String,
    pub lv_name: String,
    pub lv_path: Option<String>,
}

pub struct VolumeManager<'a> {
    host: &'a dyn HostSystem,
}

impl<'a> VolumeManager<'a> {
    pub fn new(host: &'a dyn HostSystem) -> Self {
        Self { host }
    }

    pub fn logical_volume(&self, device: &str) -> Result<LogicalVolumeInfo, ToolError> {
        let args = [
            "--noheadings",
            "--separator",
            "\t",
            "-o",
            "vg_name,lv_name,lv_path",
            device,
        ];
        let output = invoke(self.host, "lvs", &args)?;
        parse_lvs(&output).ok_or_else(|| ToolError::Unparsable {
            command: command_line("lvs", &args),
            detail: format!("no volume group/logical volume reported for {device}"),
        })
    }

    pub fn physical_volumes(&self, vg_name: &str) -> Result<Vec<String>, ToolError> {
        let output = invoke(
            self.host,
            "pvs",
            &["--noheadings", "--separator", "\t", "-o", "pv_name,vg_name"],
        )?;
        Ok(parse_pvs(&output, vg_name))
    }

    pub fn pv_size(&self, pv: &str) -> Result<u64, ToolError> {
        let args = ["--noheadings", "--units", "b", "--nosuffix", "-o", "pv_size", pv];
        let output = invoke(self.host, "pvs", &args)?;
        parse_single_u64(&command_line("pvs", &args), &output)
    }

    pub fn vg_free(&self, vg_name: &str) -> Result<u64, ToolError> {
        let args = [
            "--noheadings",
            "--units",
            "b",
            "--nosuffix",
            "-o",
            "vg_free",
            vg_name,
        ];
        let output = invoke(self.host, "vgs", &args)?;
        parse_single_u64(&command_line("vgs", &args), &output)
    }

    pub fn resize_pv(&self, pv: &str) -> Result<(), ToolError> {
        invoke(self.host, "pvresize", &[pv]).map(|_| ())
    }

    pub fn extend_lv(&self, lv_path: &str) -> Result<(), ToolError> {
        invoke(self.host, "lvextend", &["-l", "+100%FREE", lv_path]).map(|_| ())
    }
}

fn parse_lvs(output: &str) -> Option<LogicalVolumeInfo> {
    let line = non_empty_lines(output).next()?;
    let cols = line.split('\t').map(str::trim).collect::<Vec<_>>();
    let vg_name = cols.first().filter(|value| !value.is_empty())?;
    let lv_name = cols.get(1).filter(|value| !value.is_empty())?;
    let lv_path = cols
        .get(2)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string());
    Some(LogicalVolumeInfo {
        vg_name: vg_name.to_string(),
        lv_name: lv_name.to_string(),
        lv_path,
    })
}

fn parse_pvs(output: &str, vg_name: &str) -> Vec<String> {
    non_empty_lines(output)
        .filter_map(|line| {
            let mut cols = line.split('\t').map(str::trim);
            let pv = cols.next().filter(|value| !value.is_empty())?;
            let vg = cols.next().unwrap_or_default();
            (vg == vg_name).then(|| pv.to_string())
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionGrowth {
    Grown { tool: &'static str },
    AlreadyFull,
}

pub struct PartitionTool<'a> {
    host: &'a dyn HostSystem,
}

impl<'a> PartitionTool<'a> {
    pub fn new(host: &'a dyn HostSystem) -> Self {
        Self { host }
    }

    pub fn is_available(&self) -> bool {
        self.host.tool_available("growpart") || self.host.tool_available("parted")
    }

    pub fn grow_to_end(&self, disk: &str, partition: u32) -> Result<PartitionGrowth, ToolError> {
        let number = partition.to_string();
        if self.host.tool_available("growpart") {
            let args = [disk, number.as_str()];
            let output = invoke_raw(self.host, "growpart", &args)?;
            if output.success {
                return Ok(PartitionGrowth::Grown { tool: "growpart" });
            }
            if output.stdout.contains("NOCHANGE") || output.stderr.contains("NOCHANGE") {
                return Ok(PartitionGrowth::AlreadyFull);
            }
            return Err(ToolError::Failed {
                command: command_line("growpart", &args),
                detail: output.failure_detail(),
            });
        }

        if self.host.tool_available("parted") {
            invoke(
                self.host,
                "parted",
                &["-s", disk, "resizepart", number.as_str(), "100%"],
            )?;
            return Ok(PartitionGrowth::Grown { tool: "parted" });
        }

        Err(ToolError::Missing {
            program: "growpart/parted".to_string(),
        })
    }
}

pub struct FilesystemTool<'a> {
    host: &'a dyn HostSystem,
}

impl<'a> FilesystemTool<'a> {
    pub fn new(host: &'a dyn HostSystem) -> Self {
        Self { host }
    }

    pub fn grow(&self, kind: FilesystemKind, device: &str, mount: &str) -> Result<(), ToolError> {
        let (program, args) = grow_command(kind, device, mount);
        if !self.host.tool_available(program) {
            return Err(ToolError::Missing {
                program: program.to_string(),
            });
        }
        invoke(self.host, program, &args).map(|_| ())
    }
}

pub fn grow_command<'a>(
    kind: FilesystemKind,
    device: &'a str,
    mount: &'a str,
) -> (&'static str, Vec<&'a str>) {
    let args = match kind {
        FilesystemKind::Ext => vec![device],
        FilesystemKind::Xfs => vec![mount],
        FilesystemKind::Btrfs => vec!["filesystem", "resize", "max", mount],
    };
    (kind.grow_tool(), args)
}
