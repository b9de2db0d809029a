//! Test utilities for kiln-lib.
//!
//! Helpers for laying out scratch source trees with controlled modification
//! times, and cross-platform commands for tests that spawn real processes.

use std::path::{Path, PathBuf};

use filetime::FileTime;

/// Write `content` to `relative_path` under `dir`, creating parent directories.
pub fn write_file(dir: &Path, relative_path: &str, content: &str) -> PathBuf {
  let path = dir.join(relative_path);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(&path, content).unwrap();
  path
}

/// Set the modification time of `path` to `secs` seconds after the Unix epoch.
pub fn set_mtime(path: &Path, secs: i64) {
  filetime::set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

/// Returns a tool binary and argument template that copies `${IN}` to `${OUT}`.
#[cfg(unix)]
pub fn copy_tool() -> (&'static str, &'static str) {
  ("/bin/sh", r#"-c "cp ${IN} ${OUT}""#)
}

/// Returns a tool binary and argument template that exits with `code`.
#[cfg(unix)]
pub fn exit_tool(code: i32) -> (&'static str, String) {
  ("/bin/sh", format!(r#"-c "exit {code}""#))
}
