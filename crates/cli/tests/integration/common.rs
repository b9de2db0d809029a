//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use filetime::FileTime;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated test environment.
///
/// Each test gets its own temporary directory acting as the working
/// directory of the build, with the project file copied into it.
pub struct TestEnv {
  pub temp: TempDir,
  pub project_path: PathBuf,
}

impl TestEnv {
  /// Create from a fixture file.
  ///
  /// Copies the fixture content to `project.yaml` in a temporary directory.
  pub fn from_fixture(name: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let project_path = temp.path().join("project.yaml");
    std::fs::write(&project_path, fixture_content(name)).unwrap();
    Self { temp, project_path }
  }

  /// Firmware fixture with two sources sharing a header.
  pub fn firmware() -> Self {
    let env = Self::from_fixture("firmware.yaml");
    env.write_file("include/board.h", "#define LED 5\n");
    env.write_file("src/main.c", "#include \"board.h\"\nint main;\n");
    env.write_file("src/uart.c", "#include <stdint.h>\nint uart;\n");
    env
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Set the modification time of a file relative to the temp directory.
  pub fn set_mtime(&self, relative_path: &str, secs: i64) {
    filetime::set_file_mtime(self.temp.path().join(relative_path), FileTime::from_unix_time(secs, 0)).unwrap();
  }

  /// Get a Command for the kiln binary running in the temp directory.
  pub fn kiln_cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("kiln");
    cmd.current_dir(self.temp.path());
    cmd.env_remove("RUST_LOG");
    cmd
  }

  /// Command for a build of `project.yaml` with the fixture's required argument.
  pub fn build_cmd(&self) -> Command {
    let mut cmd = self.kiln_cmd();
    cmd.args(["--build", "project.yaml", "--build-arg", "OBJ_DIR=obj"]);
    cmd
  }
}
