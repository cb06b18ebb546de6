//! `stgi`: run STG programs from the command line.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use stg_cli::{run_file, OutputFormat, RunOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stgi", version, about = "Interpreter for STG programs")]
struct Cli {
    /// Log filter (e.g. `debug`, `stg_rt=trace`); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program serialized as JSON
    Run {
        /// Path to the program
        #[arg()]
        file: PathBuf,

        /// Configuration file (default: nearest stg.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Transition budget, overriding the configuration
        #[arg(long)]
        max_steps: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command {
        Commands::Run {
            file,
            config,
            max_steps,
            format,
        } => {
            let options = RunOptions {
                config,
                max_steps,
                format: match format {
                    Format::Text => OutputFormat::Text,
                    Format::Json => OutputFormat::Json,
                },
            };
            match run_file(&file, &options) {
                Ok(output) => {
                    println!("{}", output);
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("error: {}", err);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
