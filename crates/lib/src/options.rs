//! Build options.
//!
//! Options come from the command line and, optionally, from a `.build`
//! dotfile in the working directory:
//!
//! ```yaml
//! kiln:
//!   build: firmware.yaml
//!   buildArgs:
//!     - BOARD=nucleo
//! ```
//!
//! Command-line values always win over dotfile values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::consts::DOT_BUILD_FILE;

/// Errors raised while assembling build options.
#[derive(Debug, Error)]
pub enum OptionsError {
  #[error("argument '{0}' is not a valid key-value")]
  InvalidBuildArg(String),

  #[error("build argument '{0}' given more than once")]
  DuplicateBuildArg(String),

  #[error("build project missing, use '--build' to define a YAML project")]
  MissingBuildFile,

  #[error("failed to read '{path}': {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid dotfile '{path}': {source}")]
  Parse {
    path: String,
    #[source]
    source: serde_yaml::Error,
  },
}

/// Contents of a `.build` dotfile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DotBuild {
  #[serde(default)]
  pub kiln: DotBuildOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DotBuildOptions {
  pub build: Option<PathBuf>,
  #[serde(default)]
  pub build_args: Vec<String>,
}

impl DotBuild {
  /// Read `path`, returning `None` when the file does not exist.
  pub fn load(path: &Path) -> Result<Option<Self>, OptionsError> {
    if !path.is_file() {
      return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Read {
      path: path.display().to_string(),
      source,
    })?;

    // An empty dotfile deserializes to null.
    if content.trim().is_empty() {
      return Ok(Some(Self::default()));
    }

    let dot_build = serde_yaml::from_str(&content).map_err(|source| OptionsError::Parse {
      path: path.display().to_string(),
      source,
    })?;

    debug!(path = %path.display(), "parsed dotfile");
    Ok(Some(dot_build))
  }
}

/// Build file and build arguments for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
  pub build_file: Option<PathBuf>,
  pub build_args: BTreeMap<String, String>,
}

impl BuildOptions {
  /// Options from command-line values. Each build argument must be `KEY=VALUE`.
  pub fn from_args<S: AsRef<str>>(build_file: Option<PathBuf>, build_args: &[S]) -> Result<Self, OptionsError> {
    let mut options = Self {
      build_file,
      build_args: BTreeMap::new(),
    };

    for arg in build_args {
      let (key, value) = parse_build_arg(arg.as_ref())?;
      if options.build_args.contains_key(&key) {
        return Err(OptionsError::DuplicateBuildArg(key));
      }
      options.build_args.insert(key, value);
    }

    Ok(options)
  }

  /// Fill in values the command line left unset from a dotfile.
  pub fn merge_dot_build(&mut self, dot_build: DotBuildOptions) -> Result<(), OptionsError> {
    if let Some(build) = dot_build.build {
      if self.build_file.is_none() {
        self.build_file = Some(build);
      } else {
        warn!("both command line and dotfile define the build project, using command line");
      }
    }

    for arg in &dot_build.build_args {
      let (key, value) = parse_build_arg(arg)?;
      if self.build_args.contains_key(&key) {
        warn!(arg = %key, "both command line and dotfile define build argument, using command line");
        continue;
      }
      self.build_args.insert(key, value);
    }

    Ok(())
  }

  /// Merge the `.build` dotfile of `dir`, if there is one.
  pub fn merge_dot_build_in(&mut self, dir: &Path) -> Result<(), OptionsError> {
    match DotBuild::load(&dir.join(DOT_BUILD_FILE))? {
      Some(dot_build) => self.merge_dot_build(dot_build.kiln),
      None => Ok(()),
    }
  }

  /// The build file, relative paths taken relative to `work_dir`.
  pub fn build_file_in(&self, work_dir: &Path) -> Result<PathBuf, OptionsError> {
    let file = self.build_file.as_ref().ok_or(OptionsError::MissingBuildFile)?;
    Ok(work_dir.join(file))
  }
}

/// Split `KEY=VALUE`. Exactly one `=` and a non-empty key are required.
pub fn parse_build_arg(arg: &str) -> Result<(String, String), OptionsError> {
  match arg.split_once('=') {
    Some((key, value)) if !key.is_empty() && !value.contains('=') => Ok((key.to_string(), value.to_string())),
    _ => Err(OptionsError::InvalidBuildArg(arg.to_string())),
  }
}
