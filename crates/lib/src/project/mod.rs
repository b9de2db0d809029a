//! Project model.
//!
//! A project file declares required build arguments, variables, tools and
//! targets:
//!
//! ```yaml
//! version: "1"
//! build:
//!   args: [ROOT]
//!   variables:
//!     - OBJ=$(ROOT)/obj
//!     - CFLAGS: [-O2, -Wall]
//!   tools:
//!     - cc: gcc
//!   targets:
//!     build:
//!       steps:
//!         - name: compile
//!           tool: cc
//!           args: $(CFLAGS) -c ${IN} -o ${OUT}
//!           in: [src/*.c]
//!           out: $(OBJ)
//! ```
//!
//! The document is parsed into a generic [`serde_yaml::Value`] tree first and
//! then converted eagerly into the typed entities of this module. All
//! structural validation happens during that conversion.

mod parse;
mod types;

use std::path::Path;

use serde_yaml::Value;
use tracing::debug;

use crate::consts::PROJECT_VERSION;

pub use types::*;

impl Project {
  /// Build a project from a whole document (`{version, build}`).
  pub fn from_document(document: &Value) -> Result<Self, ProjectError> {
    let version = document.get("version").ok_or(ProjectError::MissingVersion)?;
    let version = match version {
      Value::String(s) => s.clone(),
      Value::Number(n) => n.to_string(),
      other => format!("{other:?}"),
    };

    if version != PROJECT_VERSION {
      return Err(ProjectError::InvalidVersion {
        found: version,
        expected: PROJECT_VERSION.to_string(),
      });
    }

    let build = document.get("build").ok_or(ProjectError::MissingBuild)?;
    Self::from_build(build)
  }

  /// Build a project from the `build` section of a document.
  pub fn from_build(build: &Value) -> Result<Self, ProjectError> {
    parse::parse_build(build)
  }

  /// Parse a YAML project document.
  pub fn from_yaml_str(content: &str) -> Result<Self, ProjectError> {
    let document: Value = serde_yaml::from_str(content)?;
    Self::from_document(&document)
  }

  /// Read and parse a YAML project file.
  pub fn load(path: &Path) -> Result<Self, ProjectError> {
    if !path.is_file() {
      return Err(ProjectError::NotFound(path.display().to_string()));
    }

    debug!(path = %path.display(), "parsing project file");

    let content = std::fs::read_to_string(path).map_err(|source| ProjectError::Read {
      path: path.display().to_string(),
      source,
    })?;

    Self::from_yaml_str(&content)
  }
}
