//! Implementation of the `kiln` build command.
//!
//! Resolves options from the command line and the `.build` dotfile, loads the
//! project and executes the requested target in the current directory.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use kiln_lib::context::BuildContext;
use kiln_lib::execute::{BuildEvent, ExecuteConfig, Executor};
use kiln_lib::options::BuildOptions;
use kiln_lib::project::Project;

use crate::output::{self, OutputFormat, format_elapsed, print_json_line, print_success};

/// Everything the build command needs from the command line.
#[derive(Debug, Clone)]
pub struct BuildCommand {
  pub build_file: Option<PathBuf>,
  pub build_args: Vec<String>,
  pub target: String,
  pub format: OutputFormat,
}

/// Execute the build command.
///
/// Prints one line per progress event and a completion line with the elapsed
/// time. In JSON mode every line is a JSON object instead.
pub fn cmd_build(command: &BuildCommand) -> Result<()> {
  let start = Instant::now();
  let work_dir = std::env::current_dir().context("Failed to determine working directory")?;

  let mut options = BuildOptions::from_args(command.build_file.clone(), command.build_args.as_slice())
    .context("Invalid command line arguments")?;
  options.merge_dot_build_in(&work_dir).context("Failed to read .build")?;
  let build_file = options.build_file_in(&work_dir)?;

  info!(path = %build_file.display(), "parsing project file");
  let project =
    Project::load(&build_file).with_context(|| format!("Failed to load project '{}'", build_file.display()))?;

  if project.target(&command.target).is_none() {
    bail!("project has no target: '{}'", command.target);
  }

  let ctx = BuildContext::new(&project, &options.build_args)?;

  let format = command.format;
  let report = Executor::new(&ctx, ExecuteConfig { work_dir })
    .observe(move |event: &BuildEvent| {
      if let Err(err) = output::print_event(event, format) {
        warn!(error = %err, "failed to print build event");
      }
    })
    .execute_target(&command.target)
    .with_context(|| format!("Target '{}' failed", command.target))?;

  let elapsed = format_elapsed(start.elapsed());

  if format.is_json() {
    print_json_line(&serde_json::json!({
      "event": "completed",
      "target": report.target,
      "invocations": report.invocations(),
      "steps": report.steps,
      "elapsed": elapsed,
    }))?;
  } else {
    print_success(&format!("Completed in {}", elapsed));
  }

  Ok(())
}
