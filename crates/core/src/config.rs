use std::env;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

pub const SYSTEM_LOG_PATH: &str = "/var/log/root-resizer.log";
const USER_LOG_NAME: &str = ".root-resizer.log";
const TMP_LOG_NAME: &str = "root-resizer.log";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    pub dry_run: bool,
    pub assume_yes: bool,
    pub log_path: Option<PathBuf>,
    pub plan_json: Option<PathBuf>,
}

pub fn log_candidates() -> Vec<PathBuf> {
    let user_log = match env::var_os("HOME").filter(|home| !home.is_empty()) {
        Some(home) => PathBuf::from(home).join(USER_LOG_NAME),
        None => env::temp_dir().join(TMP_LOG_NAME),
    };
    vec![PathBuf::from(SYSTEM_LOG_PATH), user_log]
}

pub fn open_log(candidates: &[PathBuf]) -> Option<(PathBuf, File)> {
    candidates.iter().find_map(|path| match open_append(path) {
        Ok(file) => Some((path.clone(), file)),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "log location not writable");
            None
        }
    })
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
