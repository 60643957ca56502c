#![forbid(unsafe_code)]

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use dealflow_core::{BoardConfig, DealId, StageCollection};
use dealflow_runtime::LogFormat;
use dealflow_runtime::logging;

use crate::error::{Error, Result};
use crate::replay::{ReplayOptions, Script, read_json, replay};

#[derive(Debug, Parser)]
#[command(
    name = "dealflow-replay",
    about = "Replay a drag gesture script against an in-memory pipeline and print the outcome as JSON",
    version
)]
pub struct Cli {
    /// Pipeline fixture (JSON array of stages).
    pub pipeline: PathBuf,

    /// Gesture script (JSON).
    pub script: PathBuf,

    /// Board config (TOML, or JSON by extension).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Reject stage updates for this deal id. Repeatable.
    #[arg(long = "reject", value_name = "DEAL_ID")]
    pub reject: Vec<String>,

    /// Make every fetch after the initial load fail.
    #[arg(long)]
    pub fail_fetches: bool,

    /// Park background tasks until the script settles them.
    #[arg(long)]
    pub deferred: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long)]
    pub log_json: bool,

    /// Print compact JSON instead of pretty JSON.
    #[arg(long)]
    pub compact: bool,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    logging::init(format);
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}

pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let pipeline: StageCollection = read_json(&cli.pipeline)?;
    let script: Script = read_json(&cli.script)?;
    let config = match &cli.config {
        Some(path) => BoardConfig::load(path)?,
        None => BoardConfig::default(),
    };
    let options = ReplayOptions {
        reject: cli.reject.into_iter().map(DealId::from).collect(),
        fail_fetches: cli.fail_fetches,
        deferred: cli.deferred,
    };

    tracing::info!(
        target: "dealflow.replay",
        stages = pipeline.len(),
        deals = pipeline.deal_count(),
        steps = script.steps.len(),
        "replay starting"
    );
    let report = replay(pipeline, config, script, &options)?;

    if cli.compact {
        serde_json::to_writer(&mut *out, &report)?;
    } else {
        serde_json::to_writer_pretty(&mut *out, &report)?;
    }
    writeln!(out).map_err(|source| Error::Io {
        path: PathBuf::from("<stdout>"),
        source,
    })
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_repeated_reject_flags() {
        let cli = Cli::try_parse_from([
            "dealflow-replay",
            "pipeline.json",
            "script.json",
            "--reject",
            "D1",
            "--reject",
            "D2",
            "--deferred",
        ])
        .unwrap();
        assert_eq!(cli.reject, ["D1", "D2"]);
        assert!(cli.deferred);
        assert!(cli.config.is_none());
    }
}
