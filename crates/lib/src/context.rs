//! Build context.
//!
//! The context owns the single variable table used for `$(NAME)` interpolation
//! during a run. It is built once from the project's declared variables plus
//! the caller-supplied build arguments and never changes afterwards.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::placeholder::{self, PlaceholderError, VARIABLE, VariableTable};
use crate::project::Project;

/// Errors raised while merging build arguments into the variable table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
  #[error("build argument '{0}' not defined, please add '--build-arg {0}=<value>' to the command line arguments")]
  MissingArgument(String),

  #[error("unable to set build argument variable, already exists: '{0}'")]
  ArgumentCollision(String),
}

/// Project plus the merged variable table of one run.
#[derive(Debug)]
pub struct BuildContext<'a> {
  project: &'a Project,
  variables: VariableTable,
}

impl<'a> BuildContext<'a> {
  /// Merge `build_args` into the project's variables.
  ///
  /// Every argument the project requires must be supplied, and no build
  /// argument may share a name with a declared variable.
  pub fn new(project: &'a Project, build_args: &BTreeMap<String, String>) -> Result<Self, ContextError> {
    if let Some(missing) = project.args.iter().find(|name| !build_args.contains_key(*name)) {
      return Err(ContextError::MissingArgument(missing.clone()));
    }

    let mut variables = project.variables.clone();
    for (name, value) in build_args {
      if variables.contains_key(name) {
        return Err(ContextError::ArgumentCollision(name.clone()));
      }
      variables.insert(name.clone(), vec![value.clone()]);
    }

    debug!(variables = variables.len(), "build context ready");

    Ok(Self { project, variables })
  }

  pub fn project(&self) -> &'a Project {
    self.project
  }

  pub fn variables(&self) -> &VariableTable {
    &self.variables
  }

  /// Resolve every `$(NAME)` in `template`.
  pub fn interpolate(&self, template: &str) -> Result<String, PlaceholderError> {
    placeholder::interpolate_table(template, &self.variables, VARIABLE)
  }
}
