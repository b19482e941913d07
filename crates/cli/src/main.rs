use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use output::OutputFormat;

/// jbbpipe - compile bundle sources into JavaScript Binary Bundles
#[derive(Parser)]
#[command(name = "jbbpipe")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(long, global = true, value_enum, default_value_t)]
  format: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile inputs and write the bundles to a destination directory
  Build(BuildArgs),

  /// Show which descriptor each input uses and what it would produce
  Plan(PlanArgs),
}

/// Options forwarded to the compiler.
#[derive(Args, Debug, Clone)]
pub struct OptionArgs {
  /// JSON file with compiler options
  #[arg(long, value_name = "FILE")]
  pub options: Option<PathBuf>,

  /// Compiler profile
  #[arg(long)]
  pub profile: Option<String>,

  /// Produce a sparse bundle (four files)
  #[arg(long)]
  pub sparse: bool,

  /// Asset base directory (defaults to the descriptor's directory)
  #[arg(long, value_name = "DIR")]
  pub path: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
  /// Bundle sources (files or .jbbsrc directories)
  #[arg(required = true)]
  pub inputs: Vec<PathBuf>,

  /// Destination directory
  #[arg(short = 'o', long, default_value = "build")]
  pub dest: PathBuf,

  #[command(flatten)]
  pub options: OptionArgs,

  /// Compiler program (default: $JBBPIPE_COMPILER, then `jbb`)
  #[arg(long)]
  pub compiler: Option<String>,

  /// Extra argument passed to the compiler (repeatable)
  #[arg(long = "compiler-arg", value_name = "ARG", allow_hyphen_values = true)]
  pub compiler_args: Vec<String>,

  /// Maximum number of inputs compiled at once
  #[arg(short, long)]
  pub jobs: Option<usize>,

  /// Directory for scratch files (default: system temp dir)
  #[arg(long, value_name = "DIR")]
  pub scratch_dir: Option<PathBuf>,

  /// Stream inputs instead of reading them into memory
  #[arg(long)]
  pub stream: bool,
}

#[derive(Args, Debug)]
pub struct PlanArgs {
  /// Bundle sources (files or .jbbsrc directories)
  #[arg(required = true)]
  pub inputs: Vec<PathBuf>,

  #[command(flatten)]
  pub options: OptionArgs,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build(args) => cmd::cmd_build(args, cli.format),
    Commands::Plan(args) => cmd::cmd_plan(args, cli.format),
  }
}
