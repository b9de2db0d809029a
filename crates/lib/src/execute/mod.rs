//! Target execution.
//!
//! A target's steps run strictly in declaration order, one tool process at a
//! time. A step either:
//! - runs once (no inputs), with `${OUT}` bound to its output path, or
//! - runs once per input that needs rebuilding, with `${IN}` bound to the
//!   input and `${OUT}` to the input's expected output file
//!
//! Every argument template goes through the same three stages: `$(VAR)`
//! variables, then `${IN}`/`${OUT}` parameters, then `$[GLOB]` expansion.
//! The first failure aborts the run.

pub mod process;
pub mod types;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, info_span};

use crate::consts::{PARAM_IN, PARAM_OUT};
use crate::context::BuildContext;
use crate::placeholder::{self, PARAMETER, PlaceholderError, VariableTable};
use crate::project::{Step, Tool};
use crate::scan::{self, ScanError};

pub use process::{Invocation, ProcessRunner, ProcessStatus, SystemRunner, escape_arg, split_command_line};
pub use types::{BuildEvent, BuildObserver, ExecuteConfig, ExecuteError, StepOutcome, StepReport, TargetReport};

/// Runs targets of a project within a fixed build context.
pub struct Executor<'a> {
  ctx: &'a BuildContext<'a>,
  config: ExecuteConfig,
  runner: Box<dyn ProcessRunner + 'a>,
  observer: Option<Box<dyn BuildObserver + 'a>>,
}

impl<'a> Executor<'a> {
  /// Create an executor that spawns real processes.
  pub fn new(ctx: &'a BuildContext<'a>, config: ExecuteConfig) -> Self {
    Self::with_runner(ctx, config, SystemRunner)
  }

  /// Create an executor that hands invocations to `runner`.
  pub fn with_runner(ctx: &'a BuildContext<'a>, config: ExecuteConfig, runner: impl ProcessRunner + 'a) -> Self {
    Self {
      ctx,
      config,
      runner: Box::new(runner),
      observer: None,
    }
  }

  /// Report progress to `observer`.
  pub fn observe(mut self, observer: impl BuildObserver + 'a) -> Self {
    self.observer = Some(Box::new(observer));
    self
  }

  /// Execute every step of the target named `name`.
  ///
  /// # Errors
  ///
  /// Returns the first error encountered. Tools already run by earlier steps
  /// are not undone.
  pub fn execute_target(&mut self, name: &str) -> Result<TargetReport, ExecuteError> {
    let project = self.ctx.project();
    let target = project
      .target(name)
      .ok_or_else(|| ExecuteError::TargetNotFound(name.to_string()))?;

    info!(name = %name, steps = target.steps.len(), "executing target");
    self.emit(BuildEvent::TargetStarted {
      target: name.to_string(),
      steps: target.steps.len(),
    });

    let mut report = TargetReport {
      target: name.to_string(),
      steps: Vec::with_capacity(target.steps.len()),
    };

    for (index, step) in target.steps.iter().enumerate() {
      let span = info_span!("step", name = %step.display_name());
      let _enter = span.enter();
      report.steps.push(self.execute_step(index, step)?);
    }

    let invocations = report.invocations();
    info!(name = %name, invocations, "target completed");
    self.emit(BuildEvent::TargetCompleted {
      target: name.to_string(),
      invocations,
    });

    Ok(report)
  }

  fn execute_step(&mut self, index: usize, step: &Step) -> Result<StepReport, ExecuteError> {
    let label = step.display_name().to_string();
    self.emit(BuildEvent::StepStarted {
      index,
      step: label.clone(),
      tool: step.tool.clone(),
    });

    let tool = self
      .ctx
      .project()
      .tool(&step.tool)
      .ok_or_else(|| ExecuteError::ToolNotFound {
        step: label.clone(),
        tool: step.tool.clone(),
      })?;

    let report = match &step.inputs {
      None => self.execute_command(&label, step, tool)?,
      Some(inputs) => self.execute_files(&label, step, tool, inputs)?,
    };

    match report.outcome {
      StepOutcome::NoWork => {
        info!("no work");
        self.emit(BuildEvent::StepNoWork { step: label });
      }
      StepOutcome::Done => {
        info!(invocations = report.invocations, "step completed");
        self.emit(BuildEvent::StepCompleted {
          step: label,
          invocations: report.invocations,
        });
      }
    }

    Ok(report)
  }

  /// Command-style step: one invocation, `${OUT}` only.
  fn execute_command(&mut self, label: &str, step: &Step, tool: &Tool) -> Result<StepReport, ExecuteError> {
    let mut params = VariableTable::new();

    if let Some(out) = &step.out {
      let output = self.resolve_path(label, out)?;
      if let Some(parent) = output.parent() {
        create_dir(label, parent)?;
      }
      params.insert(PARAM_OUT.to_string(), vec![escape_arg(&output.to_string_lossy())]);
    }

    self.invoke(label, step, tool, &params)?;

    Ok(StepReport {
      name: label.to_string(),
      outcome: StepOutcome::Done,
      invocations: 1,
      up_to_date: 0,
    })
  }

  /// Multi-file step: one invocation per input needing a rebuild.
  fn execute_files(
    &mut self,
    label: &str,
    step: &Step,
    tool: &Tool,
    templates: &[String],
  ) -> Result<StepReport, ExecuteError> {
    let out_dir = match &step.out {
      Some(out) => {
        let dir = self.resolve_path(label, out)?;
        create_dir(label, &dir)?;
        Some(dir)
      }
      None => None,
    };

    let inputs = self.resolve_inputs(label, templates)?;
    debug!(inputs = inputs.len(), "resolved inputs");

    let stale = match &out_dir {
      Some(dir) => {
        let scanner =
          scan::select(step.scan.as_ref(), self.ctx, &self.config.work_dir).map_err(scan_error(label))?;
        scanner.filter(&inputs, dir).map_err(scan_error(label))?
      }
      None => inputs.clone(),
    };

    let rebuild: HashSet<&PathBuf> = stale.iter().collect();
    for input in inputs.iter().filter(|i| !rebuild.contains(i)) {
      debug!(input = %input.display(), "up to date");
      self.emit(BuildEvent::FileSkipped {
        step: label.to_string(),
        path: input.clone(),
      });
    }
    let up_to_date = inputs.len() - stale.len();

    if stale.is_empty() {
      return Ok(StepReport {
        name: label.to_string(),
        outcome: StepOutcome::NoWork,
        invocations: 0,
        up_to_date,
      });
    }

    for input in &stale {
      self.emit(BuildEvent::FileRebuilding {
        step: label.to_string(),
        path: input.clone(),
      });

      let mut params = VariableTable::new();
      params.insert(PARAM_IN.to_string(), vec![escape_arg(&input.to_string_lossy())]);
      if let Some(dir) = &out_dir {
        let output = scan::expected_output(input, dir);
        params.insert(PARAM_OUT.to_string(), vec![escape_arg(&output.to_string_lossy())]);
      }

      self.invoke(label, step, tool, &params)?;
    }

    Ok(StepReport {
      name: label.to_string(),
      outcome: StepOutcome::Done,
      invocations: stale.len(),
      up_to_date,
    })
  }

  /// Resolve input templates to existing, absolute files in declaration order.
  fn resolve_inputs(&self, label: &str, templates: &[String]) -> Result<Vec<PathBuf>, ExecuteError> {
    let work_dir = &self.config.work_dir;
    let mut inputs = Vec::new();

    for template in templates {
      let resolved = self.ctx.interpolate(template).map_err(placeholder_error(label))?;
      let resolved = placeholder::fix_path(&resolved);

      let paths = if placeholder::has_wildcard(&resolved) {
        let matches = placeholder::resolve_glob(&resolved, work_dir).map_err(placeholder_error(label))?;
        debug!(pattern = %resolved, matches = matches.len(), "expanded input glob");
        matches
      } else {
        vec![resolved]
      };

      for path in paths {
        let full = work_dir.join(&path);
        if !full.is_file() {
          return Err(ExecuteError::MissingInput {
            step: label.to_string(),
            path,
          });
        }
        let canonical = dunce::canonicalize(&full).map_err(|source| ExecuteError::Io {
          step: label.to_string(),
          path: full.display().to_string(),
          source,
        })?;
        inputs.push(canonical);
      }
    }

    Ok(inputs)
  }

  /// Interpolate a path template and anchor it to the work directory.
  fn resolve_path(&self, label: &str, template: &str) -> Result<PathBuf, ExecuteError> {
    let resolved = self.ctx.interpolate(template).map_err(placeholder_error(label))?;
    Ok(self.config.work_dir.join(placeholder::fix_path(&resolved)))
  }

  /// Run the three interpolation stages over an argument template.
  fn resolve_args(&self, label: &str, template: &str, params: &VariableTable) -> Result<String, ExecuteError> {
    let resolved = self.ctx.interpolate(template).map_err(placeholder_error(label))?;
    let resolved = placeholder::interpolate_table(&resolved, params, PARAMETER).map_err(placeholder_error(label))?;
    placeholder::interpolate_globs(&resolved, &self.config.work_dir).map_err(placeholder_error(label))
  }

  fn invoke(&mut self, label: &str, step: &Step, tool: &Tool, params: &VariableTable) -> Result<(), ExecuteError> {
    let bin = self.ctx.interpolate(&tool.bin).map_err(placeholder_error(label))?;
    let program = resolve_program(&bin, &self.config.work_dir);

    let mut args = Vec::new();
    for template in tool.args.iter().chain(std::iter::once(&step.args)) {
      args.extend(split_command_line(&self.resolve_args(label, template, params)?));
    }

    let invocation = Invocation {
      program,
      args,
      work_dir: self.config.work_dir.clone(),
    };
    let command = invocation.command_line();

    info!(cmd = %command, "executing command");
    self.emit(BuildEvent::CommandStarted {
      step: label.to_string(),
      command: command.clone(),
    });

    let status = self.runner.run(&invocation).map_err(|source| ExecuteError::Spawn {
      program: invocation.program.clone(),
      source,
    })?;

    if !status.success() {
      return Err(ExecuteError::ToolFailed {
        step: label.to_string(),
        command,
        code: status.code,
      });
    }

    Ok(())
  }

  fn emit(&mut self, event: BuildEvent) {
    if let Some(observer) = self.observer.as_mut() {
      observer.on_event(&event);
    }
  }
}

/// A bare program name is left for the OS to look up on `PATH`; a relative
/// path is taken relative to the work directory.
fn resolve_program(bin: &str, work_dir: &Path) -> String {
  let fixed = placeholder::fix_path(bin);
  let path = Path::new(&fixed);
  if path.is_absolute() || path.components().count() <= 1 {
    return fixed;
  }
  work_dir.join(path).to_string_lossy().into_owned()
}

fn create_dir(label: &str, dir: &Path) -> Result<(), ExecuteError> {
  std::fs::create_dir_all(dir).map_err(|source| ExecuteError::Io {
    step: label.to_string(),
    path: dir.display().to_string(),
    source,
  })
}

fn placeholder_error(label: &str) -> impl FnOnce(PlaceholderError) -> ExecuteError + '_ {
  move |source| ExecuteError::Placeholder {
    step: label.to_string(),
    source,
  }
}

fn scan_error(label: &str) -> impl FnOnce(ScanError) -> ExecuteError + '_ {
  move |source| ExecuteError::Scan {
    step: label.to_string(),
    source,
  }
}
