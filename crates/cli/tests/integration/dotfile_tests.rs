//! `.build` dotfile integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn dotfile_supplies_project_and_args() {
  let env = TestEnv::firmware();
  env.write_file(".build", "kiln:\n  build: project.yaml\n  buildArgs:\n    - OBJ_DIR=out\n");

  env
    .kiln_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("Completed"));

  assert!(env.path().join("out/main.obj").exists());
}

#[test]
fn command_line_overrides_dotfile() {
  let env = TestEnv::firmware();
  env.write_file(".build", "kiln:\n  build: other.yaml\n  buildArgs:\n    - OBJ_DIR=out\n");

  env
    .build_cmd()
    .assert()
    .success()
    .stderr(predicate::str::contains("using command line"));

  assert!(env.path().join("obj/main.obj").exists());
  assert!(!env.path().join("out").exists());
}

#[test]
fn invalid_dotfile_arg_fails() {
  let env = TestEnv::firmware();
  env.write_file(".build", "kiln:\n  buildArgs:\n    - OBJ_DIR\n");

  env
    .build_cmd()
    .assert()
    .code(1)
    .stderr(predicate::str::contains("not a valid key-value"));
}
