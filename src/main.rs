mod config;
mod driver;
mod error;

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use hapbench_logs::LogFormat;

use crate::config::{RunConfig, RunOptions};
use crate::driver::Driver;

/// hapbench - Convert HAProxy access logs into a timestamped request CSV
#[derive(Parser, Debug)]
#[command(name = "hapbench")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log file to read (standard input if omitted)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Only output lines with the specified HTTP method (GET, POST, etc)
    #[arg(short, long)]
    method: Option<String>,

    /// Only output lines at or after this time (RFC 3339)
    #[arg(short, long)]
    start: Option<String>,

    /// Stop at the first line after this time (RFC 3339)
    #[arg(short, long)]
    end: Option<String>,

    /// Use normalized timestamps (all requests evenly spaced one second apart)
    #[arg(short, long)]
    normalized: bool,

    /// Template for the extras column, e.g. "{{.UserAgent}}"
    #[arg(short = 'f', long = "extras", value_name = "TEMPLATE")]
    extras: Option<String>,

    /// Log line format: standard or extended
    #[arg(long, value_name = "FORMAT")]
    format: Option<LogFormat>,

    /// TOML file with default options
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase diagnostic output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn options(&self) -> RunOptions {
        RunOptions {
            method: self.method.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
            normalized: self.normalized.then_some(true),
            extras: self.extras.clone(),
            format: self.format,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };

    // Diagnostics go to stderr; stdout carries only CSV
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let file_options = match &args.config {
        Some(path) => RunOptions::from_file(path)?,
        None => RunOptions::default(),
    };
    let options = args.options().over(file_options);
    let config = RunConfig::from_options(options, args.input.clone())?;

    info!(
        format = %config.format,
        offsets = ?config.offset_mode,
        extras = config.extras.is_some(),
        "Starting run"
    );

    let mut driver = Driver::new(&config);
    let stdout = io::stdout();
    let writer = BufWriter::new(stdout.lock());

    let stats = match &config.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("error opening input file {}", path.display()))?;
            driver.run(BufReader::new(file), writer)?
        }
        None => driver.run(io::stdin().lock(), writer)?,
    };

    info!(
        lines = stats.lines,
        emitted = stats.emitted,
        skipped = stats.skipped,
        parse_failures = stats.parse_failures,
        end_reached = stats.end_reached,
        "Run complete"
    );

    Ok(())
}
