//! kiln-lib integration tests.


mod execute_tests;
mod project_tests;
