//! Tool process invocation.
//!
//! Tools are spawned directly (no shell), one at a time, with the executor's
//! working directory as their current directory and the parent's stdio, so
//! compiler diagnostics show up as they are printed.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

/// A fully resolved tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: String,
  pub args: Vec<String>,
  pub work_dir: PathBuf,
}

impl Invocation {
  /// The invocation as a single line, for logs and error messages.
  pub fn command_line(&self) -> String {
    std::iter::once(self.program.as_str())
      .chain(self.args.iter().map(String::as_str))
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// How a tool process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStatus {
  /// Exit code, `None` if the process was terminated by a signal.
  pub code: Option<i32>,
}

impl ProcessStatus {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }
}

/// Spawns a tool and waits for it to exit.
pub trait ProcessRunner {
  fn run(&mut self, invocation: &Invocation) -> std::io::Result<ProcessStatus>;
}

/// Runs tools as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
  fn run(&mut self, invocation: &Invocation) -> std::io::Result<ProcessStatus> {
    debug!(
      program = %invocation.program,
      working_dir = ?invocation.work_dir,
      "spawning process"
    );

    let status = Command::new(&invocation.program)
      .args(&invocation.args)
      .current_dir(&invocation.work_dir)
      .status()?;

    Ok(ProcessStatus { code: status.code() })
  }
}

/// Split a resolved argument string into individual arguments.
///
/// Arguments are separated by whitespace. A double-quoted run is kept
/// together with the quotes removed. A backslash before a quote or a
/// whitespace character makes that character literal.
pub fn split_command_line(line: &str) -> Vec<String> {
  let mut args = Vec::new();
  let mut current = String::new();
  let mut in_arg = false;
  let mut quoted = false;
  let mut chars = line.chars().peekable();

  while let Some(c) = chars.next() {
    match c {
      '\\' if chars.peek().is_some_and(|&next| next == '"' || next.is_whitespace()) => {
        if let Some(next) = chars.next() {
          current.push(next);
        }
        in_arg = true;
      }
      '"' => {
        quoted = !quoted;
        in_arg = true;
      }
      c if c.is_whitespace() && !quoted => {
        if in_arg {
          args.push(std::mem::take(&mut current));
          in_arg = false;
        }
      }
      c => {
        current.push(c);
        in_arg = true;
      }
    }
  }

  if in_arg {
    args.push(current);
  }

  args
}

/// Escape `value` so [`split_command_line`] keeps it as one argument.
///
/// Quotes and whitespace are backslash-escaped rather than wrapped in
/// quotes, so the value also survives inside a double-quoted run such as
/// `-c "cp ${IN} ${OUT}"`. An empty value becomes `""`.
pub fn escape_arg(value: &str) -> String {
  if value.is_empty() {
    return "\"\"".to_string();
  }

  let mut escaped = String::with_capacity(value.len());
  for c in value.chars() {
    if c == '"' || c.is_whitespace() {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped
}
