pub const APP_NAME: &str = "kiln";

/// Project file format version understood by this build of kiln.
pub const PROJECT_VERSION: &str = "1";

/// Target executed when the caller does not name one.
pub const DEFAULT_TARGET: &str = "build";

/// Options file looked up in the working directory.
pub const DOT_BUILD_FILE: &str = ".build";

/// Extension of the per-input output file of multi-file steps.
pub const OBJECT_EXTENSION: &str = "obj";

/// Per-invocation parameter holding the current input file.
pub const PARAM_IN: &str = "IN";

/// Per-invocation parameter holding the expected output file.
pub const PARAM_OUT: &str = "OUT";
