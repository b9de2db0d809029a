use std::collections::BTreeMap;

use thiserror::Error;

use crate::placeholder::VariableTable;

/// How a step decides which of its inputs are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
  /// Follow `#include "..."` / `#include <...>` directives one level deep.
  CInclude,
}

impl ScanMode {
  pub fn parse(mode: &str) -> Option<Self> {
    match mode {
      "c-include" => Some(ScanMode::CInclude),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      ScanMode::CInclude => "c-include",
    }
  }
}

/// Scan directive of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
  pub mode: ScanMode,
  /// Directory templates searched, in order, to resolve an include target.
  pub resolve: Vec<String>,
}

/// A named external executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
  /// Binary path template; may contain `$(VAR)` references.
  pub bin: String,
  /// Default arguments passed before the step's own arguments.
  pub args: Vec<String>,
}

/// One build action within a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
  pub name: Option<String>,
  pub tool: String,
  /// Argument template; references `${IN}` / `${OUT}` when inputs / output are declared.
  pub args: String,
  pub out: Option<String>,
  /// Input templates. `None` makes this a command-style step that runs once.
  pub inputs: Option<Vec<String>>,
  pub scan: Option<Scan>,
}

impl Step {
  /// Name used in logs and error messages.
  pub fn display_name(&self) -> &str {
    self.name.as_deref().unwrap_or("N/A")
  }
}

/// A named, ordered sequence of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
  pub steps: Vec<Step>,
}

/// The validated project description.
///
/// Every invariant is checked when the project is constructed, so execution
/// code can rely on tool references existing and templates being well formed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
  /// Build arguments the caller must supply.
  pub args: Vec<String>,
  pub variables: VariableTable,
  pub tools: BTreeMap<String, Tool>,
  pub targets: BTreeMap<String, Target>,
}

impl Project {
  pub fn target(&self, name: &str) -> Option<&Target> {
    self.targets.get(name)
  }

  pub fn tool(&self, name: &str) -> Option<&Tool> {
    self.tools.get(name)
  }

  pub fn target_names(&self) -> impl Iterator<Item = &str> {
    self.targets.keys().map(|s| s.as_str())
  }
}

/// Errors raised while turning a configuration tree into a [`Project`].
#[derive(Debug, Error)]
pub enum ProjectError {
  #[error("build project not found: {0}")]
  NotFound(String),

  #[error("failed to read build project '{path}': {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse build project: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("'version' field missing")]
  MissingVersion,

  #[error("invalid 'version' '{found}', '{expected}' expected")]
  InvalidVersion { found: String, expected: String },

  #[error("'build' section missing")]
  MissingBuild,

  #[error("{context}: expected {expected}")]
  UnexpectedType { context: String, expected: &'static str },

  #[error("{context}: expected a mapping with exactly one entry, found {found}")]
  NotSingleEntry { context: String, found: usize },

  #[error("unexpected variable '{0}', expected 'name=value'")]
  InvalidVariable(String),

  #[error("variable '{0}' is defined multiple times")]
  DuplicateVariable(String),

  #[error("tool '{0}' is defined multiple times")]
  DuplicateTool(String),

  #[error("tool '{0}' has no binary defined")]
  MissingToolBinary(String),

  #[error("multiple targets defined with the same key: '{0}'")]
  DuplicateTarget(String),

  #[error("step '{step}' has no {field} defined")]
  MissingStepField { step: String, field: &'static str },

  #[error("step '{step}' uses unknown tool '{tool}'")]
  UnknownTool { step: String, tool: String },

  #[error("step '{step}': tool args do not use the {param} parameter but the step has {what} defined")]
  MissingParameter {
    step: String,
    param: &'static str,
    what: &'static str,
  },

  #[error("step '{step}': unknown scan mode '{mode}'")]
  UnknownScanMode { step: String, mode: String },
}
