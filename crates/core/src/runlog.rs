use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tracing::warn;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Step,
    Success,
    Warn,
    Error,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Self::Info => "[INFO]",
            Self::Step => "[STEP]",
            Self::Success => "[ OK ]",
            Self::Warn => "[WARN]",
            Self::Error => "[FAIL]",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Info => CYAN,
            Self::Step => BOLD,
            Self::Success => GREEN,
            Self::Warn => YELLOW,
            Self::Error => RED,
        }
    }
}

pub struct RunLog {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    out_colors: bool,
    err_colors: bool,
    file: Option<File>,
    path: Option<PathBuf>,
}

impl RunLog {
    pub fn new(out: Box<dyn Write>, err: Box<dyn Write>, use_colors: bool) -> Self {
        Self {
            out,
            err,
            out_colors: use_colors,
            err_colors: use_colors,
            file: None,
            path: None,
        }
    }

    pub fn stdio() -> Self {
        use std::io::IsTerminal;
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()), false)
            .colors(io::stdout().is_terminal(), io::stderr().is_terminal())
    }

    pub fn colors(mut self, out: bool, err: bool) -> Self {
        self.out_colors = out;
        self.err_colors = err;
        self
    }

    pub fn with_file(mut self, path: PathBuf, file: File) -> Self {
        self.path = Some(path);
        self.file = Some(file);
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&mut self, message: impl AsRef<str>) {
        self.emit(Level::Info, message.as_ref());
    }

    pub fn step(&mut self, message: impl AsRef<str>) {
        self.emit(Level::Step, message.as_ref());
    }

    pub fn success(&mut self, message: impl AsRef<str>) {
        self.emit(Level::Success, message.as_ref());
    }

    pub fn warn(&mut self, message: impl AsRef<str>) {
        self.emit(Level::Warn, message.as_ref());
    }

    pub fn error(&mut self, message: impl AsRef<str>) {
        self.emit(Level::Error, message.as_ref());
    }

    pub fn plain(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        let _ = writeln!(self.out, "{message}");
        self.append(message);
    }

    pub fn prompt(&mut self, prompt: &str) {
        let _ = write!(self.out, "{prompt}");
        let _ = self.out.flush();
    }

    fn emit(&mut self, level: Level, message: &str) {
        let (console, use_colors) = match level {
            Level::Warn | Level::Error => (&mut self.err, self.err_colors),
            _ => (&mut self.out, self.out_colors),
        };
        let line = if use_colors {
            format!("{}{}{} {message}", level.color(), level.tag(), RESET)
        } else {
            format!("{} {message}", level.tag())
        };
        let _ = writeln!(console, "{line}");
        self.append(&format!("{} {message}", level.tag()));
    }

    fn append(&mut self, message: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        if let Err(err) = writeln!(file, "{}", format_entry(message)) {
            warn!(error = %err, "failed to append to run log");
            self.file = None;
        }
    }
}

pub fn format_entry(message: &str) -> String {
    format!(
        "{} | {message}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}
