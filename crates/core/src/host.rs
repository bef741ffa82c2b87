use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn failure_detail(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        match self.code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

pub trait HostSystem {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;

    fn tool_available(&self, tool: &str) -> bool;

    fn is_privileged(&self) -> bool;

    fn write_file(&self, path: &Path, contents: &str) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalHost;

impl HostSystem for LocalHost {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        debug!(program, ?args, "running command");
        let output = Command::new(program).args(args).output()?;
        let result = CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        debug!(program, code = ?result.code, "command finished");
        Ok(result)
    }

    fn tool_available(&self, tool: &str) -> bool {
        which::which(tool).is_ok()
    }

    fn is_privileged(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }

    fn write_file(&self, path: &Path, contents: &str) -> io::Result<()> {
        debug!(path = %path.display(), "writing attribute");
        fs::write(path, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::CommandOutput;

    #[test]
    fn failure_detail_prefers_stderr() {
        let output = CommandOutput {
            success: false,
            code: Some(5),
            stdout: "some stdout".to_string(),
            stderr: "  Device /dev/sda1 not found.\n".to_string(),
        };
        assert_eq!(output.failure_detail(), "Device /dev/sda1 not found.");
    }

    #[test]
    fn failure_detail_falls_back_to_exit_code() {
        let output = CommandOutput {
            success: false,
            code: Some(3),
            ..CommandOutput::default()
        };
        assert_eq!(output.failure_detail(), "exit status 3");
    }
}
