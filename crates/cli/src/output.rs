//! CLI output formatting utilities.
//!
//! Renders build progress either as colored status lines or as JSON lines,
//! one object per event.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use kiln_lib::execute::BuildEvent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const PLUS: &str = "+";
  pub const SKIP: &str = "=";
}

/// Elapsed time rounded to milliseconds, e.g. `1s 250ms`.
pub fn format_elapsed(elapsed: Duration) -> String {
  let millis = Duration::from_millis(elapsed.as_millis() as u64);
  if millis.is_zero() {
    return "0ms".to_string();
  }
  humantime::format_duration(millis).to_string()
}

/// Symbol and plain-text line for an event, `None` for events with no line
/// of their own.
pub fn format_event(event: &BuildEvent) -> Option<(&'static str, String)> {
  match event {
    BuildEvent::TargetStarted { target, steps } => {
      Some((symbols::INFO, format!("Executing target '{}' ({} steps)", target, steps)))
    }
    BuildEvent::StepStarted { index, step, tool } => Some((symbols::ARROW, format!("[{}] {} ({})", index + 1, step, tool))),
    BuildEvent::FileSkipped { path, .. } => Some((symbols::SKIP, format!("  {} (up to date)", path.display()))),
    BuildEvent::FileRebuilding { path, .. } => Some((symbols::PLUS, format!("  {}", path.display()))),
    BuildEvent::CommandStarted { command, .. } => Some(("", format!("    {}", command))),
    BuildEvent::StepNoWork { .. } => Some((symbols::INFO, "  no work".to_string())),
    BuildEvent::StepCompleted { .. } | BuildEvent::TargetCompleted { .. } => None,
  }
}

pub fn print_event(event: &BuildEvent, format: OutputFormat) -> anyhow::Result<()> {
  if format.is_json() {
    return print_json_line(event);
  }

  let Some((symbol, line)) = format_event(event) else {
    return Ok(());
  };

  match event {
    BuildEvent::StepStarted { .. } => println!(
      "{} {}",
      symbol.if_supports_color(Stream::Stdout, |s| s.cyan()),
      line.if_supports_color(Stream::Stdout, |s| s.bold())
    ),
    BuildEvent::FileRebuilding { .. } => println!(
      "{} {}",
      symbol.if_supports_color(Stream::Stdout, |s| s.green()),
      line
    ),
    BuildEvent::FileSkipped { .. } | BuildEvent::CommandStarted { .. } => println!(
      "{} {}",
      symbol,
      line.if_supports_color(Stream::Stdout, |s| s.dimmed())
    ),
    _ => println!(
      "{} {}",
      symbol.if_supports_color(Stream::Stdout, |s| s.blue()),
      line
    ),
  }

  Ok(())
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_json_line<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
