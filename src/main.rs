use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
#[cfg(feature = "generate-docs")]
use clap::CommandFactory;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;
use tracing_subscriber::EnvFilter;

use redump::capture::{FileInput, IterationBudget, run_capture};
use redump::config::{HarnessConfig, HarnessPaths};
use redump::decode::DecoderKind;
use redump::dump::DumpDir;
use redump::error::HarnessError;
use redump::replay::run_replay;

mod cli;

#[derive(Debug, Parser)]
#[command(
    name = "redump",
    about = "redump: record every decoder input, replay the exact sequence after a crash",
    version = env!("CARGO_PKG_VERSION"),
    propagate_version = true
)]
struct Cli {
    /// Directory holding dump records.
    /// Falls back to REDUMP_DUMP_DIR, then ./dump.
    #[arg(long = "dump-dir", global = true, value_name = "DIR")]
    dump_dir: Option<PathBuf>,

    /// Harness config file (defaults to ./redump.toml when present).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug-level logging when RUST_LOG is unset.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Record and decode the input file, once or in a persistent loop.
    Capture {
        #[arg(long, value_enum)]
        decoder: DecoderKind,
        /// Re-read INPUT for up to N iterations (config or 1000 when N is omitted).
        #[arg(
            long,
            value_name = "N",
            num_args = 0..=1,
            conflicts_with = "unbounded",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        persistent: Option<Option<u64>>,
        /// Re-read INPUT until the process is killed.
        #[arg(long)]
        unbounded: bool,
        /// Printed as JSON instead of a summary.
        #[arg(long)]
        json: bool,
        /// Input file rewritten by the fuzzer between iterations.
        input: PathBuf,
    },
    /// Replay the records of a namespace in order against a fresh decoder.
    Replay {
        #[arg(long, value_enum)]
        decoder: DecoderKind,
        /// Stop after at most N records.
        #[arg(long, value_name = "N")]
        limit: Option<u64>,
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
        /// Namespace of the records, e.g. `1700000000-123456`.
        prefix: String,
    },
    /// List record namespaces in the dump directory.
    List {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Delete the records of a namespace.
    Purge {
        prefix: String,
        /// Only delete sequences [0, N).
        #[arg(long, value_name = "N")]
        count: Option<u64>,
    },
    /// Generate shell completions and man pages (internal, for packaging).
    #[cfg(feature = "generate-docs")]
    #[command(hide = true)]
    GenDocs {
        /// Output directory (creates completions/ and man/ inside it).
        #[arg(long, value_name = "DIR")]
        out_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let Cli {
        dump_dir,
        config,
        verbose: _,
        command,
    } = cli;
    let paths = HarnessPaths::discover_with_override(dump_dir.as_deref());
    let dump = DumpDir::new(paths.dump_dir);

    match command {
        Commands::Capture {
            decoder,
            persistent,
            unbounded,
            json,
            input,
        } => {
            let config = HarnessConfig::load_with_override(config.as_deref())?;
            let budget = select_budget(&config, persistent, unbounded);
            let mut source = FileInput::new(input);
            let summary = run_capture(&dump, &mut source, &decoder, budget, &config)
                .unwrap_or_else(|err| fatal(&err));
            print_summary(&summary, json, cli::format::render_capture_human)?;
        }
        Commands::Replay {
            decoder,
            limit,
            json,
            prefix,
        } => {
            let config = HarnessConfig::load_with_override(config.as_deref())?;
            let summary = run_replay(&dump, &prefix, &decoder, &config, limit)
                .unwrap_or_else(|err| fatal(&err));
            print_summary(&summary, json, cli::format::render_replay_human)?;
        }
        Commands::List { json } => {
            let runs = dump.scan()?;
            let response = cli::format::runs_json(&runs);
            if json {
                println!("{}", cli::render_json(&response)?);
            } else if let Some(rendered) = cli::format::render_runs_human(&response) {
                println!("{rendered}");
            }
        }
        Commands::Purge { prefix, count } => {
            let removed = dump.purge_namespace(&prefix, count)?;
            println!("{}", cli::render_json(&json!({ "prefix": prefix, "removed": removed }))?);
        }
        #[cfg(feature = "generate-docs")]
        Commands::GenDocs { out_dir } => {
            let written = cli::docs::write_docs(Cli::command(), &out_dir)?;
            eprintln!("Wrote {} files under {}", written.len(), out_dir.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// `--unbounded` wins, then `--persistent [N]`, otherwise a single input.
fn select_budget(
    config: &HarnessConfig,
    persistent: Option<Option<u64>>,
    unbounded: bool,
) -> IterationBudget {
    if unbounded {
        return IterationBudget::Unbounded;
    }
    match persistent {
        Some(iterations) => {
            IterationBudget::Persistent(config.effective_persistent_iterations(iterations))
        }
        None => IterationBudget::Once,
    }
}

fn print_summary<T: Serialize>(
    summary: &T,
    json: bool,
    render: fn(&Value) -> Option<String>,
) -> Result<()> {
    let value = serde_json::to_value(summary)?;
    match render(&value) {
        Some(rendered) if !json => println!("{rendered}"),
        _ => println!("{}", cli::render_json(&value)?),
    }
    Ok(())
}

/// The dump can no longer be trusted to mirror what the decoder saw; stop
/// the way a crash would, leaving every record in place.
fn fatal(err: &HarnessError) -> ! {
    error!(error = %err, path = %err.path().display(), "harness contract violated");
    eprintln!("Error: {err}");
    std::process::abort()
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
