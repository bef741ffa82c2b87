#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use root_resizer_core::{CommandOutput, HostSystem, RunLog};

/// Programs and pseudo-commands that change host state.
pub const MUTATING: &[&str] = &[
    "write", "growpart", "parted", "pvresize", "lvextend", "resize2fs", "xfs_growfs", "btrfs",
];

const ALL_TOOLS: &[&str] = &[
    "lsblk", "findmnt", "lvs", "pvs", "vgs", "pvresize", "lvextend", "df", "growpart", "parted",
    "resize2fs", "xfs_growfs", "btrfs",
];

pub const GIB: u64 = 1024 * 1024 * 1024;

/// Scripted host: commands are answered from a table keyed by the full
/// command line and every call is recorded. Unscripted commands succeed with
/// empty output.
pub struct FakeHost {
    privileged: bool,
    tools: HashSet<String>,
    responses: HashMap<String, CommandOutput>,
    failing_writes: bool,
    calls: RefCell<Vec<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            privileged: true,
            tools: ALL_TOOLS.iter().map(|tool| tool.to_string()).collect(),
            responses: HashMap::new(),
            failing_writes: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Root `/dev/mapper/vg0-root` (ext4) on vg0, single PV `/dev/sda1`.
    pub fn standard_vm() -> Self {
        Self::new()
            .root("/dev/mapper/vg0-root", "ext4")
            .respond(
                "lvs --noheadings --separator \t -o vg_name,lv_name,lv_path /dev/mapper/vg0-root",
                "  vg0\troot\t/dev/vg0/root\n",
            )
            .respond(
                "pvs --noheadings --separator \t -o pv_name,vg_name",
                "  /dev/sda1\tvg0\n",
            )
            .sizes("/dev/sda", "/dev/sda1", "vg0", 20 * GIB, 10 * GIB, 0)
    }

    pub fn root(self, source: &str, fstype: &str) -> Self {
        self.respond("findmnt -n -o SOURCE,FSTYPE /", &format!("{source} {fstype}\n"))
            .respond(&format!("lsblk -dno TYPE {source}"), "lvm\n")
    }

    pub fn sizes(self, disk: &str, pv: &str, vg: &str, disk_bytes: u64, pv_bytes: u64, free: u64) -> Self {
        self.respond(&format!("lsblk -bdno SIZE {disk}"), &format!("{disk_bytes}\n"))
            .respond(
                &format!("pvs --noheadings --units b --nosuffix -o pv_size {pv}"),
                &format!("  {pv_bytes}\n"),
            )
            .respond(
                &format!("vgs --noheadings --units b --nosuffix -o vg_free {vg}"),
                &format!("  {free}\n"),
            )
            .respond(
                "df -h /",
                "Filesystem            Size  Used Avail Use% Mounted on\n\
                 /dev/mapper/vg0-root  9.8G  5.0G  4.3G  54% /\n",
            )
    }

    pub fn respond(mut self, command: &str, stdout: &str) -> Self {
        self.responses.insert(
            command.to_string(),
            CommandOutput {
                success: true,
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
        self
    }

    pub fn fail(mut self, command: &str, code: i32, stdout: &str, stderr: &str) -> Self {
        self.responses.insert(
            command.to_string(),
            CommandOutput {
                success: false,
                code: Some(code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        );
        self
    }

    pub fn unprivileged(mut self) -> Self {
        self.privileged = false;
        self
    }

    pub fn without_tool(mut self, tool: &str) -> Self {
        self.tools.remove(tool);
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.failing_writes = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Recorded calls that would have changed the host.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| {
                let program = call.split_whitespace().next().unwrap_or_default();
                MUTATING.contains(&program)
            })
            .collect()
    }
}

impl HostSystem for FakeHost {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.borrow_mut().push(line.clone());
        Ok(self.responses.get(&line).cloned().unwrap_or(CommandOutput {
            success: true,
            code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        }))
    }

    fn tool_available(&self, tool: &str) -> bool {
        self.tools.contains(tool)
    }

    fn is_privileged(&self) -> bool {
        self.privileged
    }

    fn write_file(&self, path: &Path, _contents: &str) -> io::Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("write {}", path.display()));
        if self.failing_writes {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only sysfs"))
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Default)]
pub struct Buffer(Rc<RefCell<Vec<u8>>>);

impl Buffer {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).to_string()
    }
}

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A run log writing to in-memory console buffers and a log file in `dir`.
pub struct Captured {
    pub log: RunLog,
    pub out: Buffer,
    pub err: Buffer,
    pub path: PathBuf,
}

impl Captured {
    pub fn new(dir: &Path) -> Self {
        let out = Buffer::default();
        let err = Buffer::default();
        let path = dir.join("root-resizer.log");
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .expect("open log file");
        let log = RunLog::new(Box::new(out.clone()), Box::new(err.clone()), false)
            .with_file(path.clone(), file);
        Self {
            log,
            out,
            err,
            path,
        }
    }

    pub fn log_lines(&self) -> Vec<String> {
        fs::read_to_string(&self.path)
            .expect("read log file")
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Log-file entries for pipeline steps, without timestamps.
    pub fn step_entries(&self) -> Vec<String> {
        self.log_lines()
            .into_iter()
            .filter_map(|line| {
                line.split_once(" | ")
                    .map(|(_, message)| message.to_string())
            })
            .filter(|message| message.starts_with("[STEP]"))
            .collect()
    }
}
