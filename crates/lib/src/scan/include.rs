use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::context::BuildContext;
use crate::placeholder::fix_path;

use super::{FileScanner, ScanError, expected_output, modified};

static INCLUDE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"^\s*#include\s+["<]([^">]+)[">]"#).expect("include pattern is valid"));

/// Rebuilds an input when its output is missing or older than the input or
/// than any header the input includes.
///
/// Includes are followed one level deep: the headers of an input are found by
/// reading the input, headers included by those headers are not considered.
#[derive(Debug, Clone, Default)]
pub struct IncludeScanner {
  resolve_dirs: Vec<PathBuf>,
}

impl IncludeScanner {
  /// Create a scanner searching `resolve_dirs` in order.
  pub fn new(resolve_dirs: Vec<PathBuf>) -> Self {
    Self { resolve_dirs }
  }

  /// Create a scanner from the step's resolve templates.
  ///
  /// Each template is interpolated, split on whitespace and stripped of a
  /// leading `-I`, so a compiler include-flag variable can be reused as is.
  /// Relative directories are looked up under `work_dir`.
  pub fn from_templates(templates: &[String], ctx: &BuildContext<'_>, work_dir: &Path) -> Result<Self, ScanError> {
    let mut resolve_dirs = Vec::new();

    for template in templates {
      let resolved = ctx.interpolate(template)?;
      for entry in resolved.split_whitespace() {
        let dir = entry.strip_prefix("-I").unwrap_or(entry);
        if dir.is_empty() {
          continue;
        }
        resolve_dirs.push(work_dir.join(fix_path(dir)));
      }
    }

    debug!(dirs = ?resolve_dirs, "include resolve paths");

    Ok(Self::new(resolve_dirs))
  }

  /// Resolved, de-duplicated headers included by `file`.
  ///
  /// A header found in none of the resolve directories is logged and
  /// ignored. A header found in more than one is an error.
  pub fn dependencies(&self, file: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut seen = HashSet::new();
    let mut dependencies = Vec::new();

    for include in read_includes(file)? {
      let mut candidates: Vec<PathBuf> = Vec::new();
      for dir in &self.resolve_dirs {
        let candidate = dir.join(fix_path(&include));
        if !candidate.is_file() {
          continue;
        }
        let candidate = dunce::canonicalize(&candidate).map_err(|e| ScanError::io(&candidate, e))?;
        if !candidates.contains(&candidate) {
          candidates.push(candidate);
        }
      }

      match candidates.len() {
        0 => {
          warn!(
            include = %include,
            file = %file.display(),
            "included file not found in paths defined by scan resolve"
          );
        }
        1 => {
          let resolved = candidates.remove(0);
          if seen.insert(resolved.clone()) {
            dependencies.push(resolved);
          }
        }
        _ => {
          return Err(ScanError::AmbiguousInclude {
            include,
            file: file.display().to_string(),
            candidates: candidates.iter().map(|c| c.display().to_string()).collect(),
          });
        }
      }
    }

    Ok(dependencies)
  }
}

impl FileScanner for IncludeScanner {
  fn filter(&self, inputs: &[PathBuf], out_dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut stale = Vec::new();

    for input in inputs {
      // Resolved for every input so ambiguous includes fail the run even
      // when the output turns out to be missing anyway.
      let dependencies = self.dependencies(input)?;
      let output = expected_output(input, out_dir);

      if !output.exists() {
        debug!(input = %input.display(), "output missing");
        stale.push(input.clone());
        continue;
      }

      let output_time = modified(&output)?;
      if modified(input)? > output_time {
        debug!(input = %input.display(), "input newer than output");
        stale.push(input.clone());
        continue;
      }

      for dependency in &dependencies {
        if modified(dependency)? > output_time {
          debug!(
            input = %input.display(),
            dependency = %dependency.display(),
            "dependency newer than output"
          );
          stale.push(input.clone());
          break;
        }
      }
    }

    Ok(stale)
  }
}

/// Distinct include targets of `file`, in order of first appearance.
fn read_includes(file: &Path) -> Result<Vec<String>, ScanError> {
  let reader = BufReader::new(File::open(file).map_err(|e| ScanError::io(file, e))?);

  let mut seen = HashSet::new();
  let mut includes = Vec::new();

  for line in reader.split(b'\n') {
    let line = line.map_err(|e| ScanError::io(file, e))?;
    let line = String::from_utf8_lossy(&line);

    if let Some(captures) = INCLUDE_RE.captures(&line) {
      let target = captures[1].to_string();
      if seen.insert(target.clone()) {
        includes.push(target);
      }
    }
  }

  Ok(includes)
}
