mod build;

pub use build::{BuildCommand, cmd_build};
