//! Project loading tests.

use kiln_lib::project::{Project, ProjectError, ScanMode};
use tempfile::TempDir;

use super::common::write_file;

const FIRMWARE: &str = r#"
version: 1
build:
  args: [ROOT]
  variables:
    - INC=-I$(ROOT)/include -Idrivers
    - CFLAGS:
        - -O2
        - -Wall
  tools:
    - cc:
        bin: $(ROOT)/bin/gcc
        args: [-c, $(CFLAGS)]
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
    clean:
"#;

mod load {
  use super::*;

  #[test]
  fn loads_full_project() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "firmware.yaml", FIRMWARE);

    let project = Project::load(&path).unwrap();

    assert_eq!(project.args, vec!["ROOT"]);
    assert_eq!(project.variables["CFLAGS"], vec!["-O2", "-Wall"]);
    assert_eq!(project.tool("cc").unwrap().args, vec!["-c", "$(CFLAGS)"]);
    assert_eq!(project.target_names().collect::<Vec<_>>(), vec!["build", "clean"]);

    let build = project.target("build").unwrap();
    assert_eq!(build.steps.len(), 2);

    let compile = &build.steps[0];
    assert_eq!(compile.inputs.as_deref(), Some(&["src/*.c".to_string(), "drivers/*.c".to_string()][..]));
    assert_eq!(compile.scan.as_ref().unwrap().mode, ScanMode::CInclude);
    assert_eq!(compile.scan.as_ref().unwrap().resolve, vec!["$(INC)"]);

    let link = &build.steps[1];
    assert!(link.inputs.is_none());
    assert_eq!(link.out.as_deref(), Some("firmware.elf"));

    assert!(project.target("clean").unwrap().steps.is_empty());
  }

  #[test]
  fn error_missing_file() {
    let temp = TempDir::new().unwrap();
    let result = Project::load(&temp.path().join("missing.yaml"));
    assert!(matches!(result, Err(ProjectError::NotFound(ref p)) if p.ends_with("missing.yaml")));
  }

  #[test]
  fn error_wrong_version() {
    let result = Project::from_yaml_str("version: 2\nbuild: {}\n");
    assert!(matches!(result, Err(ProjectError::InvalidVersion { ref found, .. }) if found == "2"));
  }

  #[test]
  fn error_invalid_yaml() {
    let result = Project::from_yaml_str("version: [1\n");
    assert!(matches!(result, Err(ProjectError::Yaml(_))));
  }
}

mod validation {
  use super::*;

  #[test]
  fn error_step_with_unknown_tool() {
    let yaml = FIRMWARE.replace("tool: ld", "tool: lld");
    let result = Project::from_yaml_str(&yaml);
    assert!(matches!(result, Err(ProjectError::UnknownTool { ref tool, .. }) if tool == "lld"));
  }

  #[test]
  fn error_output_without_out_parameter() {
    let yaml = FIRMWARE.replace("args: ${IN} -o ${OUT}", "args: ${IN}");
    let result = Project::from_yaml_str(&yaml);
    assert!(matches!(result, Err(ProjectError::MissingParameter { ref step, .. }) if step == "compile"));
  }

  #[test]
  fn error_unknown_scan_mode() {
    let yaml = FIRMWARE.replace("mode: c-include", "mode: rust-use");
    let result = Project::from_yaml_str(&yaml);
    assert!(matches!(result, Err(ProjectError::UnknownScanMode { ref mode, .. }) if mode == "rust-use"));
  }
}
