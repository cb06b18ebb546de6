//! Library half of `stgi`: load a program, configure a machine, run it.

use std::path::{Path, PathBuf};

use stg_core::syntax::{Program, ProgramError};
use stg_rt::{ConfigError, Machine, MachineConfig, StgError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Program { path: PathBuf, source: ProgramError },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("runtime error: {0}")]
    Runtime(#[from] StgError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Explicit configuration file; otherwise `stg.toml` is searched for
    /// from the program's directory upwards.
    pub config: Option<PathBuf>,
    pub max_steps: Option<u64>,
    pub format: OutputFormat,
}

pub fn load_program(path: &Path) -> Result<Program, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Program::from_json(&text).map_err(|source| CliError::Program {
        path: path.to_path_buf(),
        source,
    })
}

pub fn resolve_config(
    program_path: &Path,
    options: &RunOptions,
) -> Result<MachineConfig, CliError> {
    let mut config = match &options.config {
        Some(path) => MachineConfig::load(path)?,
        None => {
            let dir = program_path.parent().unwrap_or_else(|| Path::new("."));
            MachineConfig::discover(dir)?
        }
    };
    if options.max_steps.is_some() {
        config.max_steps = options.max_steps;
    }
    debug!(?config, "configuration resolved");
    Ok(config)
}

/// Run the program at `path` and render its result atoms.
pub fn run_file(path: &Path, options: &RunOptions) -> Result<String, CliError> {
    let program = load_program(path)?;
    let config = resolve_config(path, options)?;
    let mut machine = Machine::new(config);
    let atoms = machine.run_program(&program)?;
    info!(steps = machine.steps(), stats = ?machine.state().stats(), "run finished");

    let rendered: Vec<String> = atoms.iter().map(|a| machine.render(a)).collect();
    Ok(match options.format {
        OutputFormat::Text => rendered.join("\n"),
        OutputFormat::Json => serde_json::json!({
            "entry": program.entry.to_string(),
            "result": rendered,
            "steps": machine.steps(),
        })
        .to_string(),
    })
}
