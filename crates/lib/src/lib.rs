//! kiln-lib: Core types and logic for kiln
//!
//! This crate provides the building blocks of an incremental build run:
//! - `Project`: targets, steps and tools loaded from a YAML project file
//! - `BuildContext`: the variable table of one run
//! - `placeholder`: `$(VAR)`, `${PARAM}` and `$[GLOB]` interpolation
//! - `scan`: deciding which inputs need rebuilding
//! - `Executor`: running a target's steps in order

pub mod consts;
pub mod context;
pub mod execute;
pub mod options;
pub mod placeholder;
pub mod project;
pub mod scan;
pub mod util;
