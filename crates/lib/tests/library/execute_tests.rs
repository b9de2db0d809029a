//! End-to-end target execution tests.

use std::path::Path;

use kiln_lib::context::{BuildContext, ContextError};
use kiln_lib::execute::{BuildEvent, ExecuteConfig, ExecuteError, Executor, StepOutcome};
use kiln_lib::project::Project;
use kiln_lib::scan::ScanError;
use tempfile::TempDir;

use super::common::{FakeCompiler, args, set_mtime, write_file};

const FIRMWARE: &str = r#"
version: 1
build:
  args: [ROOT]
  variables:
    - INC=-I$(ROOT)/include -Idrivers
  tools:
    - cc:
        bin: $(ROOT)/bin/gcc
        args: [-c, -O2]
    - ld:
        bin: ld
  targets:
    build:
      steps:
        - name: compile
          tool: cc
          args: ${IN} -o ${OUT}
          out: obj
          in: [src/*.c, drivers/*.c]
          scan:
            mode: c-include
            resolve: $(INC)
        - name: link
          tool: ld
          args: $[obj/*.obj] -o ${OUT}
          out: firmware.elf
"#;

const SOURCES: [&str; 4] = ["src/main.c", "include/board.h", "drivers/uart.c", "drivers/uart.h"];

/// Lay out the firmware sources with old timestamps.
fn firmware_tree(dir: &Path) -> Project {
  write_file(dir, "src/main.c", "#include \"board.h\"\n#include <stdint.h>\nint main;\n");
  write_file(dir, "include/board.h", "#define LED 5\n");
  write_file(dir, "drivers/uart.c", "#include \"uart.h\"\nint uart;\n");
  write_file(dir, "drivers/uart.h", "void uart_init(void);\n");
  for file in SOURCES {
    set_mtime(dir, file, 1_000);
  }
  Project::from_yaml_str(FIRMWARE).unwrap()
}

fn root_arg(dir: &Path) -> std::collections::BTreeMap<String, String> {
  args(&[("ROOT", dir.to_str().unwrap())])
}

fn config(dir: &Path) -> ExecuteConfig {
  ExecuteConfig {
    work_dir: dir.to_path_buf(),
  }
}

mod incremental {
  use super::*;

  #[test]
  fn first_build_runs_every_input_then_links() {
    let temp = TempDir::new().unwrap();
    let project = firmware_tree(temp.path());
    let ctx = BuildContext::new(&project, &root_arg(temp.path())).unwrap();
    let compiler = FakeCompiler::default();

    let report = Executor::with_runner(&ctx, config(temp.path()), compiler.clone())
      .execute_target("build")
      .unwrap();

    assert_eq!(report.invocations(), 3);
    let invocations = compiler.take();
    assert_eq!(invocations[0].program, temp.path().join("bin").join("gcc").to_string_lossy());
    assert!(invocations[0].args[2].ends_with("main.c"));
    assert!(invocations[1].args[2].ends_with("uart.c"));
    assert_eq!(invocations[2].program, "ld");
    assert_eq!(invocations[2].args[..2], ["obj/main.obj".to_string(), "obj/uart.obj".to_string()]);
    assert!(temp.path().join("firmware.elf").exists());
  }

  #[test]
  fn rebuild_follows_changed_header() {
    let temp = TempDir::new().unwrap();
    let project = firmware_tree(temp.path());
    let ctx = BuildContext::new(&project, &root_arg(temp.path())).unwrap();
    let compiler = FakeCompiler::default();

    Executor::with_runner(&ctx, config(temp.path()), compiler.clone())
      .execute_target("build")
      .unwrap();
    compiler.take();

    // Nothing changed: compile has no work, link always runs.
    let report = Executor::with_runner(&ctx, config(temp.path()), compiler.clone())
      .execute_target("build")
      .unwrap();
    assert_eq!(report.steps[0].outcome, StepOutcome::NoWork);
    assert_eq!(report.steps[0].up_to_date, 2);
    assert_eq!(compiler.take().len(), 1);

    set_mtime(temp.path(), "drivers/uart.h", 4_000_000_000);

    let report = Executor::with_runner(&ctx, config(temp.path()), compiler.clone())
      .execute_target("build")
      .unwrap();
    assert_eq!(report.steps[0].invocations, 1);
    let invocations = compiler.take();
    assert!(invocations[0].args[2].ends_with("uart.c"));
  }

  #[test]
  fn deleted_output_is_rebuilt() {
    let temp = TempDir::new().unwrap();
    let project = firmware_tree(temp.path());
    let ctx = BuildContext::new(&project, &root_arg(temp.path())).unwrap();
    let compiler = FakeCompiler::default();

    Executor::with_runner(&ctx, config(temp.path()), compiler.clone())
      .execute_target("build")
      .unwrap();
    std::fs::remove_file(temp.path().join("obj/main.obj")).unwrap();

    let report = Executor::with_runner(&ctx, config(temp.path()), compiler.clone())
      .execute_target("build")
      .unwrap();
    assert_eq!(report.steps[0].invocations, 1);
    assert_eq!(report.steps[0].up_to_date, 1);
  }

  #[test]
  fn events_report_skipped_and_rebuilt_files() {
    let temp = TempDir::new().unwrap();
    let project = firmware_tree(temp.path());
    let ctx = BuildContext::new(&project, &root_arg(temp.path())).unwrap();
    let compiler = FakeCompiler::default();

    Executor::with_runner(&ctx, config(temp.path()), compiler.clone())
      .execute_target("build")
      .unwrap();
    set_mtime(temp.path(), "include/board.h", 4_000_000_000);

    let (tx, rx) = std::sync::mpsc::channel();
    Executor::with_runner(&ctx, config(temp.path()), compiler.clone())
      .observe(tx)
      .execute_target("build")
      .unwrap();

    let events: Vec<BuildEvent> = rx.try_iter().collect();
    let rebuilt: Vec<_> = events
      .iter()
      .filter_map(|e| match e {
        BuildEvent::FileRebuilding { path, .. } => Some(path.clone()),
        _ => None,
      })
      .collect();
    let skipped: Vec<_> = events
      .iter()
      .filter_map(|e| match e {
        BuildEvent::FileSkipped { path, .. } => Some(path.clone()),
        _ => None,
      })
      .collect();

    assert_eq!(rebuilt.len(), 1);
    assert!(rebuilt[0].ends_with("src/main.c"));
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].ends_with("drivers/uart.c"));
  }
}

mod failures {
  use super::*;

  #[test]
  fn error_ambiguous_include_stops_before_any_tool() {
    let temp = TempDir::new().unwrap();
    let project = firmware_tree(temp.path());
    write_file(temp.path(), "drivers/board.h", "");
    let ctx = BuildContext::new(&project, &root_arg(temp.path())).unwrap();
    let compiler = FakeCompiler::default();

    let result = Executor::with_runner(&ctx, config(temp.path()), compiler.clone()).execute_target("build");

    assert!(matches!(
      result,
      Err(ExecuteError::Scan {
        source: ScanError::AmbiguousInclude { .. },
        ..
      })
    ));
    assert_eq!(compiler.count(), 0);
  }

  #[test]
  fn error_missing_build_argument() {
    let project = Project::from_yaml_str(FIRMWARE).unwrap();
    let result = BuildContext::new(&project, &args(&[]));
    assert_eq!(result.unwrap_err(), ContextError::MissingArgument("ROOT".to_string()));
  }

  #[test]
  fn error_missing_tool_binary_fails_to_spawn() {
    let temp = TempDir::new().unwrap();
    let project = Project::from_yaml_str(
      "version: 1\nbuild:\n  tools:\n    - t: {bin: kiln-test-no-such-tool}\n  targets:\n    build:\n      steps:\n        - tool: t\n          args: --help\n",
    )
    .unwrap();
    let ctx = BuildContext::new(&project, &args(&[])).unwrap();

    let result = Executor::new(&ctx, config(temp.path())).execute_target("build");
    assert!(matches!(result, Err(ExecuteError::Spawn { ref program, .. }) if program == "kiln-test-no-such-tool"));
  }
}
