use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use root_resizer_core::{
    log_candidates, open_log, run, LocalHost, ResizeError, RunConfig, RunLog, RunOutcome,
    StepOutcome,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "root-resizer",
    version,
    about = "Grow an LVM-backed root filesystem after its virtual disk was enlarged.",
    long_about = "Grow an LVM-backed root filesystem after its virtual disk was enlarged.\n\n\
        Steps: rescan disk, grow partition, pvresize, lvextend, grow filesystem.\n\
        Must run as root. Completed steps are never rolled back."
)]
struct Cli {
    /// Print the detected layout and planned actions, then exit without changes.
    #[arg(long)]
    dry_run: bool,

    /// Do not ask for confirmation before resizing.
    #[arg(long)]
    assume_yes: bool,

    /// Also write the computed plan as JSON to this file.
    #[arg(long, value_name = "FILE")]
    plan_json: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let informational = matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            );
            let _ = err.print();
            return if informational {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    let mut log = RunLog::stdio();
    let log_path = match open_log(&log_candidates()) {
        Some((path, file)) => {
            log = log.with_file(path.clone(), file);
            Some(path)
        }
        None => None,
    };

    let config = RunConfig {
        dry_run: cli.dry_run,
        assume_yes: cli.assume_yes,
        log_path,
        plan_json: cli.plan_json,
    };

    match run_resize(&config, &mut log) {
        Ok(outcome) => {
            summarize(&mut log, &outcome);
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_failure(&mut log, &err);
            ExitCode::FAILURE
        }
    }
}

fn run_resize(config: &RunConfig, log: &mut RunLog) -> Result<RunOutcome> {
    match &config.log_path {
        Some(path) => log.info(format!("Logging to {}", path.display())),
        None => log.warn("No writable log location; continuing with console output only"),
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let outcome = run(config, &LocalHost, &mut input, log)
        .context("root filesystem was not resized")?;
    Ok(outcome)
}

fn summarize(log: &mut RunLog, outcome: &RunOutcome) {
    if let RunOutcome::Completed { steps, .. } = outcome {
        let warned = steps
            .iter()
            .filter(|report| matches!(report.outcome, StepOutcome::Warned(_)))
            .count();
        if warned > 0 {
            log.warn(format!("{warned} step(s) finished with warnings"));
        }
    }
}

fn report_failure(log: &mut RunLog, err: &anyhow::Error) {
    match err.downcast_ref::<ResizeError>() {
        Some(ResizeError::UserAbort) => log.warn(format!("{err:#}")),
        Some(resize) if resize.is_partial() => {
            log.error(format!("{err:#}"));
            log.error("The system is partially grown; finish the remaining steps manually");
        }
        _ => log.error(format!("{err:#}")),
    }
    if let Some(path) = log.path().map(|path| path.display().to_string()) {
        log.info(format!("Details logged to {path}"));
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_default_to_interactive_run() {
        let cli = Cli::try_parse_from(["root-resizer"]).expect("parse");
        assert!(!cli.dry_run);
        assert!(!cli.assume_yes);
        assert!(cli.plan_json.is_none());
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "root-resizer",
            "--dry-run",
            "--assume-yes",
            "--plan-json",
            "/tmp/plan.json",
        ])
        .expect("parse");
        assert!(cli.dry_run);
        assert!(cli.assume_yes);
        assert_eq!(cli.plan_json, Some(PathBuf::from("/tmp/plan.json")));
    }

    #[test]
    fn unknown_argument_is_rejected() {
        let err = Cli::try_parse_from(["root-resizer", "--force"]).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn help_and_version_are_informational() {
        let help = Cli::try_parse_from(["root-resizer", "-h"]).expect_err("help exits");
        assert_eq!(help.kind(), ErrorKind::DisplayHelp);
        let version = Cli::try_parse_from(["root-resizer", "-V"]).expect_err("version exits");
        assert_eq!(version.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
