//! Placeholder interpolation for project templates.
//!
//! Templates in a project file reference values that are only known at
//! different points of a run. Three independent namespaces exist, each with
//! its own delimiter pair so they can never be confused with each other:
//!
//! - `$(NAME)` - project variables and build arguments, resolved once per step
//! - `${NAME}` - per-invocation tool parameters (`IN`, `OUT`), resolved per file
//! - `$[PATTERN]` - filesystem globs, resolved last, right before a tool is spawned
//!
//! All three go through the same [`interpolate`] routine with a different
//! resolver.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use kiln_lib::placeholder::{VARIABLE, interpolate_table};
//!
//! let mut vars = HashMap::new();
//! vars.insert("CFLAGS".to_string(), vec!["-O2".to_string(), "-Wall".to_string()]);
//!
//! let result = interpolate_table("gcc $(CFLAGS) -c", &vars, VARIABLE).unwrap();
//! assert_eq!(result, "gcc -O2 -Wall -c");
//! ```

use std::collections::HashMap;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use thiserror::Error;

/// Name -> ordered values. Multi-value entries are joined with a single space.
pub type VariableTable = HashMap<String, Vec<String>>;

/// Upper bound on substitutions performed by a single [`interpolate`] call.
///
/// Substituted text is scanned again, so a variable that references itself
/// would otherwise expand forever.
pub const MAX_SUBSTITUTIONS: usize = 4096;

/// A begin/end delimiter pair identifying one placeholder namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
  pub begin: &'static str,
  pub end: &'static str,
}

/// `$(NAME)` - project variables and build arguments.
pub const VARIABLE: Delimiters = Delimiters { begin: "$(", end: ")" };

/// `${NAME}` - per-invocation tool parameters.
pub const PARAMETER: Delimiters = Delimiters { begin: "${", end: "}" };

/// `$[PATTERN]` - filesystem glob expansion.
pub const GLOB: Delimiters = Delimiters { begin: "$[", end: "]" };

/// Errors that can occur during placeholder interpolation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
  #[error("unclosed placeholder in '{template}' at position {position}")]
  Unclosed { template: String, position: usize },

  #[error("variable not found '{0}'")]
  Unresolved(String),

  #[error("too many substitutions in '{0}', is a variable referencing itself?")]
  TooManySubstitutions(String),

  #[error("invalid glob pattern '{pattern}': {message}")]
  InvalidGlob { pattern: String, message: String },

  #[error("failed to read glob match for '{pattern}': {message}")]
  GlobRead { pattern: String, message: String },
}

/// Replace every `begin NAME end` occurrence in `value` with `resolve(NAME)`.
///
/// The string is scanned from the start for the next `begin`; the first `end`
/// after it closes the placeholder (delimiters do not nest). The replacement
/// is spliced in and the scan starts over until no `begin` remains.
///
/// # Errors
///
/// Returns [`PlaceholderError::Unclosed`] when a `begin` has no matching `end`,
/// and whatever error `resolve` reports for an unknown name. No partial result
/// is returned on failure.
pub fn interpolate<F>(value: &str, delimiters: Delimiters, mut resolve: F) -> Result<String, PlaceholderError>
where
  F: FnMut(&str) -> Result<String, PlaceholderError>,
{
  let mut replaced = value.to_string();
  let mut substitutions = 0;

  while let Some(start) = replaced.find(delimiters.begin) {
    let name_start = start + delimiters.begin.len();
    let Some(len) = replaced[name_start..].find(delimiters.end) else {
      return Err(PlaceholderError::Unclosed {
        template: value.to_string(),
        position: start,
      });
    };

    substitutions += 1;
    if substitutions > MAX_SUBSTITUTIONS {
      return Err(PlaceholderError::TooManySubstitutions(value.to_string()));
    }

    let name_end = name_start + len;
    let resolved = resolve(&replaced[name_start..name_end])?;
    replaced.replace_range(start..name_end + delimiters.end.len(), &resolved);
  }

  Ok(replaced)
}

/// Interpolate `value` against a variable table.
///
/// Unknown names fail with [`PlaceholderError::Unresolved`].
pub fn interpolate_table(value: &str, table: &VariableTable, delimiters: Delimiters) -> Result<String, PlaceholderError> {
  interpolate(value, delimiters, |name| {
    table
      .get(name)
      .map(|values| values.join(" "))
      .ok_or_else(|| PlaceholderError::Unresolved(name.to_string()))
  })
}

/// Expand every `$[PATTERN]` in `value` into the space-joined list of files
/// matching the pattern. Relative patterns are evaluated against `base`.
pub fn interpolate_globs(value: &str, base: &Path) -> Result<String, PlaceholderError> {
  interpolate(value, GLOB, |pattern| {
    let matches = resolve_glob(&fix_path(pattern), base)?;
    Ok(matches.join(" "))
  })
}

/// Normalize both kinds of slashes to the host path separator.
pub fn fix_path(path: &str) -> String {
  path
    .chars()
    .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
    .collect()
}

/// Returns true if the path contains a glob wildcard.
pub fn has_wildcard(path: &str) -> bool {
  path.contains(['*', '?'])
}

/// Resolve a glob pattern to the sorted list of matching files.
///
/// The pattern is split at the first path segment containing a wildcard. The
/// part before it is the root the glob is evaluated in, and every match is
/// reported as that root joined with the matched remainder, so a relative
/// pattern yields relative paths. Relative roots are looked up under `base`.
/// Directories are never reported.
pub fn resolve_glob(pattern: &str, base: &Path) -> Result<Vec<String>, PlaceholderError> {
  let segments: Vec<&str> = pattern.split(MAIN_SEPARATOR).collect();
  let first_glob = segments.iter().position(|s| has_wildcard(s)).unwrap_or(segments.len());

  let mut root = segments[..first_glob].join(&MAIN_SEPARATOR.to_string());
  // `/*.c` splits into `["", "*.c"]`: the empty leading segment is the filesystem root.
  if root.is_empty() && first_glob > 0 && pattern.starts_with(MAIN_SEPARATOR) {
    root = MAIN_SEPARATOR.to_string();
  }
  let rest = segments[first_glob..].join(&MAIN_SEPARATOR.to_string());

  let search_root = if root.is_empty() {
    base.to_path_buf()
  } else if Path::new(&root).is_absolute() {
    PathBuf::from(&root)
  } else {
    base.join(&root)
  };

  let escaped_root = glob::Pattern::escape(&search_root.to_string_lossy());
  let full_pattern = if rest.is_empty() {
    escaped_root
  } else if escaped_root.ends_with(MAIN_SEPARATOR) {
    format!("{escaped_root}{rest}")
  } else {
    format!("{escaped_root}{MAIN_SEPARATOR}{rest}")
  };

  let entries = glob::glob(&full_pattern).map_err(|e| PlaceholderError::InvalidGlob {
    pattern: pattern.to_string(),
    message: e.to_string(),
  })?;

  let mut matches = Vec::new();
  for entry in entries {
    let path = entry.map_err(|e| PlaceholderError::GlobRead {
      pattern: pattern.to_string(),
      message: e.to_string(),
    })?;

    if !path.is_file() {
      continue;
    }

    let relative = path.strip_prefix(&search_root).unwrap_or(&path);
    let reported = if root.is_empty() {
      relative.to_path_buf()
    } else if relative.as_os_str().is_empty() {
      PathBuf::from(&root)
    } else {
      Path::new(&root).join(relative)
    };
    matches.push(reported.to_string_lossy().to_string());
  }

  matches.sort();
  Ok(matches)
}
