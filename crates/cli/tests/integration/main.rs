//! CLI integration tests.
//!
//! Projects use `/bin/sh` as their tool, so these only run on Unix.

#![cfg(unix)]

mod common;

mod dotfile_tests;
