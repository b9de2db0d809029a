//! Input staleness scanners.
//!
//! A multi-file step with an output directory only reprocesses inputs whose
//! expected output is missing or out of date. How "out of date" is decided
//! depends on the step's scan directive:
//!
//! - no directive: [`TimestampScanner`] compares the input with its output
//! - `c-include`: [`IncludeScanner`] also compares every header the input
//!   includes with the output
//!
//! Dependencies are recomputed from file contents on every run; nothing is
//! persisted between runs.

mod include;
mod timestamp;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tracing::debug;

use crate::consts::OBJECT_EXTENSION;
use crate::context::BuildContext;
use crate::placeholder::PlaceholderError;
use crate::project::{Scan, ScanMode};

pub use include::IncludeScanner;
pub use timestamp::TimestampScanner;

/// Errors that can occur while scanning inputs.
#[derive(Debug, Error)]
pub enum ScanError {
  #[error("scan resolve path: {0}")]
  Placeholder(#[from] PlaceholderError),

  #[error("included file '{include}' in '{file}' resolved to multiple files: {}", .candidates.join(", "))]
  AmbiguousInclude {
    include: String,
    file: String,
    candidates: Vec<String>,
  },

  #[error("failed to scan '{path}': {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

impl ScanError {
  fn io(path: &Path, source: std::io::Error) -> Self {
    ScanError::Io {
      path: path.display().to_string(),
      source,
    }
  }
}

/// Decides which inputs of a step need to be rebuilt.
pub trait FileScanner {
  /// Return the inputs that need rebuilding, in input order.
  fn filter(&self, inputs: &[PathBuf], out_dir: &Path) -> Result<Vec<PathBuf>, ScanError>;
}

/// Pick the scanner for a step that has an output directory.
pub fn select(scan: Option<&Scan>, ctx: &BuildContext<'_>, work_dir: &Path) -> Result<Box<dyn FileScanner>, ScanError> {
  let Some(scan) = scan else {
    debug!("scan mode: timestamp");
    return Ok(Box::new(TimestampScanner));
  };

  debug!(mode = scan.mode.as_str(), "scan mode");
  match scan.mode {
    ScanMode::CInclude => Ok(Box::new(IncludeScanner::from_templates(&scan.resolve, ctx, work_dir)?)),
  }
}

/// Output file a multi-file step produces for `input`: same file stem, fixed
/// extension, placed in `out_dir`.
pub fn expected_output(input: &Path, out_dir: &Path) -> PathBuf {
  let stem = input.file_stem().unwrap_or(input.as_os_str()).to_string_lossy();
  out_dir.join(format!("{stem}.{OBJECT_EXTENSION}"))
}

fn modified(path: &Path) -> Result<SystemTime, ScanError> {
  std::fs::metadata(path)
    .and_then(|m| m.modified())
    .map_err(|e| ScanError::io(path, e))
}
