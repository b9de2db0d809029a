mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kiln_lib::consts::{APP_NAME, DEFAULT_TARGET};

use cmd::{BuildCommand, cmd_build};
use output::{OutputFormat, print_error};

/// kiln - Incremental build runner for C toolchains
#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// YAML project file (defaults to the one named in .build)
  #[arg(short, long, value_name = "FILE")]
  build: Option<PathBuf>,

  /// Build argument required by the project, may be repeated
  #[arg(long = "build-arg", value_name = "KEY=VALUE")]
  build_args: Vec<String>,

  /// Target to execute
  #[arg(short, long, default_value = DEFAULT_TARGET)]
  target: String,

  /// Output format
  #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
  format: OutputFormat,

  /// Enable verbose output
  #[arg(short, long)]
  verbose: bool,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "info" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let command = BuildCommand {
    build_file: cli.build,
    build_args: cli.build_args,
    target: cli.target,
    format: cli.format,
  };

  match cmd_build(&command) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
