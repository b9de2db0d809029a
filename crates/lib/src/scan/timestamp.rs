use std::path::{Path, PathBuf};

use tracing::debug;

use super::{FileScanner, ScanError, expected_output, modified};

/// Rebuilds an input when its output is missing or older than the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampScanner;

impl FileScanner for TimestampScanner {
  fn filter(&self, inputs: &[PathBuf], out_dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut stale = Vec::new();

    for input in inputs {
      let output = expected_output(input, out_dir);

      if !output.exists() {
        debug!(input = %input.display(), "output missing");
        stale.push(input.clone());
        continue;
      }

      if modified(input)? > modified(&output)? {
        debug!(input = %input.display(), "input newer than output");
        stale.push(input.clone());
      }
    }

    Ok(stale)
  }
}
