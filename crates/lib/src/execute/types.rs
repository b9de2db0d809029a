//! Types for target execution.
//!
//! This module defines the error type, the progress events emitted while a
//! target runs, and the report returned once it completes.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::placeholder::PlaceholderError;
use crate::scan::ScanError;

/// Errors that can occur while executing a target.
///
/// The first error aborts the whole run; steps after the failing one are
/// never started.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The requested target is not declared by the project.
  #[error("target not found: '{0}'")]
  TargetNotFound(String),

  /// A step references a tool the project does not declare.
  #[error("step '{step}': tool not found: '{tool}'")]
  ToolNotFound { step: String, tool: String },

  /// A placeholder in a step could not be resolved.
  #[error("step '{step}': {source}")]
  Placeholder {
    step: String,
    #[source]
    source: PlaceholderError,
  },

  /// Dependency scanning failed.
  #[error("step '{step}': {source}")]
  Scan {
    step: String,
    #[source]
    source: ScanError,
  },

  /// An input listed by a step does not exist.
  #[error("step '{step}': input file not found: '{path}'")]
  MissingInput { step: String, path: String },

  /// I/O error while preparing a step.
  #[error("step '{step}': {path}: {source}")]
  Io {
    step: String,
    path: String,
    #[source]
    source: std::io::Error,
  },

  /// The tool process could not be started.
  #[error("failed to start '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The tool exited unsuccessfully.
  #[error("step '{step}': command failed with exit code {code:?}: {command}")]
  ToolFailed {
    step: String,
    command: String,
    code: Option<i32>,
  },
}

/// Progress of a running target, in the order things happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BuildEvent {
  TargetStarted { target: String, steps: usize },
  StepStarted { index: usize, step: String, tool: String },
  /// The input's output is up to date.
  FileSkipped { step: String, path: PathBuf },
  /// The input will be passed to the tool.
  FileRebuilding { step: String, path: PathBuf },
  CommandStarted { step: String, command: String },
  /// Every input of the step was up to date.
  StepNoWork { step: String },
  StepCompleted { step: String, invocations: usize },
  TargetCompleted { target: String, invocations: usize },
}

/// Receives [`BuildEvent`]s as a target runs.
pub trait BuildObserver {
  fn on_event(&mut self, event: &BuildEvent);
}

impl<F> BuildObserver for F
where
  F: FnMut(&BuildEvent),
{
  fn on_event(&mut self, event: &BuildEvent) {
    self(event)
  }
}

impl BuildObserver for std::sync::mpsc::Sender<BuildEvent> {
  fn on_event(&mut self, event: &BuildEvent) {
    // A dropped receiver only means nobody is listening anymore.
    let _ = self.send(event.clone());
  }
}

/// How a step finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
  /// The tool ran at least once.
  Done,
  /// All inputs were up to date, the tool was not invoked.
  NoWork,
}

/// Result of a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
  pub name: String,
  pub outcome: StepOutcome,
  /// Number of tool invocations.
  pub invocations: usize,
  /// Inputs skipped because their output was up to date.
  pub up_to_date: usize,
}

/// Result of a completed target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetReport {
  pub target: String,
  pub steps: Vec<StepReport>,
}

impl TargetReport {
  /// Total tool invocations across all steps.
  pub fn invocations(&self) -> usize {
    self.steps.iter().map(|s| s.invocations).sum()
  }
}

/// Configuration for an [`Executor`](super::Executor).
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
  /// Directory relative paths are resolved against and tools run in.
  pub work_dir: PathBuf,
}
