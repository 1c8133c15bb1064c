mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_filter, cmd_info, cmd_join, cmd_plan};
use output::{OutputFormat, print_error};

/// lockplan - compile locked dependency graphs into build plans
#[derive(Parser)]
#[command(name = "lockplan")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Plan one build unit per package in a lock file
  Plan {
    /// Path to the lock file
    #[arg(default_value = "lockplan.lock")]
    lock: PathBuf,

    /// Configuration file (default: lockplan.toml next to the lock file)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Write the plan as JSON to this file
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Create the joined native dependency trees in the store
    #[arg(long)]
    materialize: bool,
  },

  /// List the files a set of patterns selects from a directory
  Filter {
    /// Source directory
    dir: PathBuf,

    /// Anchored regular expressions over paths relative to DIR (none selects everything)
    patterns: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Present several directories as one, last directory winning
  Join {
    /// Name of the joined path
    name: String,

    /// Input directories, lowest precedence first
    #[arg(required = true)]
    dirs: Vec<PathBuf>,

    /// Materialize the joined tree into this store
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Show version, store and configuration locations
  Info,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}

fn run(cli: Cli) -> Result<()> {
  match cli.command {
    Commands::Plan {
      lock,
      config,
      format,
      out,
      materialize,
    } => cmd_plan(&lock, config.as_deref(), format, out.as_deref(), materialize, cli.verbose),
    Commands::Filter { dir, patterns, format } => cmd_filter(&dir, &patterns, format),
    Commands::Join {
      name,
      dirs,
      store,
      format,
    } => cmd_join(&name, dirs, store.as_deref(), format),
    Commands::Info => {
      cmd_info();
      Ok(())
    }
  }
}
