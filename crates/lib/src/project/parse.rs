//! Conversion of the generic configuration tree into typed project entities.

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use crate::placeholder::VariableTable;

use super::types::{Project, ProjectError, Scan, ScanMode, Step, Target, Tool};

/// Parse the `build` section of a project document.
pub(super) fn parse_build(build: &Value) -> Result<Project, ProjectError> {
  let build = as_mapping(build, "build")?;

  let args = match build.get("args") {
    Some(value) => scalar_list(value, "build.args")?,
    None => Vec::new(),
  };

  let variables = match build.get("variables") {
    Some(value) => parse_variables(value)?,
    None => VariableTable::new(),
  };

  let tools = match build.get("tools") {
    Some(value) => parse_tools(value)?,
    None => BTreeMap::new(),
  };

  let targets = match build.get("targets") {
    Some(value) => parse_targets(value, &tools)?,
    None => BTreeMap::new(),
  };

  Ok(Project {
    args,
    variables,
    tools,
    targets,
  })
}

fn parse_variables(value: &Value) -> Result<VariableTable, ProjectError> {
  let mut variables = VariableTable::new();

  for entry in as_sequence(value, "build.variables")? {
    let (name, values) = match entry {
      Value::Mapping(map) => {
        let (name, values) = single_entry(map, "variable")?;
        let values = scalar_list(values, &format!("variable '{name}'"))?;
        (name, values)
      }
      other => {
        let text = scalar(other, "variable")?;
        parse_string_variable(&text)?
      }
    };

    if variables.contains_key(&name) {
      return Err(ProjectError::DuplicateVariable(name));
    }
    variables.insert(name, values);
  }

  Ok(variables)
}

/// Parse `name=value`, stripping one layer of surrounding double quotes.
fn parse_string_variable(text: &str) -> Result<(String, Vec<String>), ProjectError> {
  let (name, value) = text
    .split_once('=')
    .ok_or_else(|| ProjectError::InvalidVariable(text.to_string()))?;

  let value = value.strip_prefix('"').unwrap_or(value);
  let value = value.strip_suffix('"').unwrap_or(value);

  Ok((name.to_string(), vec![value.to_string()]))
}

fn parse_tools(value: &Value) -> Result<BTreeMap<String, Tool>, ProjectError> {
  let mut tools = BTreeMap::new();

  for entry in as_sequence(value, "build.tools")? {
    let map = as_mapping(entry, "tool")?;
    let (name, definition) = single_entry(map, "tool")?;

    if tools.contains_key(&name) {
      return Err(ProjectError::DuplicateTool(name));
    }

    let tool = match definition {
      Value::Mapping(def) => {
        let bin = def
          .get("bin")
          .ok_or_else(|| ProjectError::MissingToolBinary(name.clone()))?;
        let bin = scalar(bin, &format!("tool '{name}' bin"))?;

        let args: Vec<String> = match def.get("args") {
          None => Vec::new(),
          Some(Value::Sequence(items)) => items
            .iter()
            .map(|item| scalar(item, &format!("tool '{name}' args")))
            .collect::<Result<_, _>>()?,
          Some(other) => scalar(other, &format!("tool '{name}' args"))?
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        };

        Tool { bin, args }
      }
      other => Tool {
        bin: scalar(other, &format!("tool '{name}'"))?,
        args: Vec::new(),
      },
    };

    tools.insert(name, tool);
  }

  Ok(tools)
}

fn parse_targets(value: &Value, tools: &BTreeMap<String, Tool>) -> Result<BTreeMap<String, Target>, ProjectError> {
  let mut targets = BTreeMap::new();

  for (key, data) in as_mapping(value, "build.targets")? {
    let name = scalar(key, "target name")?;
    if targets.contains_key(&name) {
      return Err(ProjectError::DuplicateTarget(name));
    }

    let mut target = Target::default();
    let context = format!("target '{name}'");

    // An empty target (`build:` with nothing after it) is allowed.
    if !data.is_null() {
      let data = as_mapping(data, &context)?;
      if let Some(steps) = data.get("steps") {
        for (index, step) in as_sequence(steps, &format!("{context} steps"))?.iter().enumerate() {
          target.steps.push(parse_step(step, index, tools)?);
        }
      }
    }

    targets.insert(name, target);
  }

  Ok(targets)
}

fn parse_step(value: &Value, index: usize, tools: &BTreeMap<String, Tool>) -> Result<Step, ProjectError> {
  let data = as_mapping(value, &format!("step #{index}"))?;

  let name = data.get("name").map(|v| scalar(v, "step name")).transpose()?;
  let label = name.clone().unwrap_or_else(|| format!("#{index}"));

  let tool = data
    .get("tool")
    .ok_or_else(|| ProjectError::MissingStepField {
      step: label.clone(),
      field: "tool",
    })
    .and_then(|v| scalar(v, &format!("step '{label}' tool")))?;

  if !tools.contains_key(&tool) {
    return Err(ProjectError::UnknownTool { step: label, tool });
  }

  let args = data
    .get("args")
    .ok_or_else(|| ProjectError::MissingStepField {
      step: label.clone(),
      field: "tool args",
    })
    .and_then(|v| scalar(v, &format!("step '{label}' args")))?;

  let out = data
    .get("out")
    .map(|v| scalar(v, &format!("step '{label}' out")))
    .transpose()?;

  if out.is_some() && !args.contains("${OUT}") {
    return Err(ProjectError::MissingParameter {
      step: label,
      param: "${OUT}",
      what: "an output",
    });
  }

  let scan = data.get("scan").map(|v| parse_scan(v, &label)).transpose()?;

  let inputs = data
    .get("in")
    .map(|v| scalar_list(v, &format!("step '{label}' in")))
    .transpose()?;

  if inputs.is_some() && !args.contains("${IN}") {
    return Err(ProjectError::MissingParameter {
      step: label,
      param: "${IN}",
      what: "inputs",
    });
  }

  Ok(Step {
    name,
    tool,
    args,
    out,
    inputs,
    scan,
  })
}

fn parse_scan(value: &Value, step: &str) -> Result<Scan, ProjectError> {
  let context = format!("step '{step}' scan");
  let data = as_mapping(value, &context)?;

  let mode = data
    .get("mode")
    .ok_or_else(|| ProjectError::MissingStepField {
      step: step.to_string(),
      field: "scan mode",
    })
    .and_then(|v| scalar(v, &context))?;

  let mode = ScanMode::parse(&mode).ok_or_else(|| ProjectError::UnknownScanMode {
    step: step.to_string(),
    mode,
  })?;

  let resolve = match data.get("resolve") {
    Some(value) => scalar_list(value, &format!("{context} resolve"))?,
    None => Vec::new(),
  };

  Ok(Scan { mode, resolve })
}

// =============================================================================
// Tree helpers
// =============================================================================

fn as_mapping<'a>(value: &'a Value, context: &str) -> Result<&'a Mapping, ProjectError> {
  value.as_mapping().ok_or_else(|| ProjectError::UnexpectedType {
    context: context.to_string(),
    expected: "a mapping",
  })
}

fn as_sequence<'a>(value: &'a Value, context: &str) -> Result<&'a Vec<Value>, ProjectError> {
  value.as_sequence().ok_or_else(|| ProjectError::UnexpectedType {
    context: context.to_string(),
    expected: "a list",
  })
}

/// Text form of a scalar value (string, number or boolean).
fn scalar(value: &Value, context: &str) -> Result<String, ProjectError> {
  match value {
    Value::String(s) => Ok(s.clone()),
    Value::Number(n) => Ok(n.to_string()),
    Value::Bool(b) => Ok(b.to_string()),
    _ => Err(ProjectError::UnexpectedType {
      context: context.to_string(),
      expected: "a string",
    }),
  }
}

/// A single scalar or a list of scalars.
fn scalar_list(value: &Value, context: &str) -> Result<Vec<String>, ProjectError> {
  match value {
    Value::Sequence(items) => items.iter().map(|item| scalar(item, context)).collect(),
    other => Ok(vec![scalar(other, context)?]),
  }
}

fn single_entry<'a>(map: &'a Mapping, context: &str) -> Result<(String, &'a Value), ProjectError> {
  if map.len() != 1 {
    return Err(ProjectError::NotSingleEntry {
      context: context.to_string(),
      found: map.len(),
    });
  }

  let (key, value) = map.iter().next().ok_or_else(|| ProjectError::NotSingleEntry {
    context: context.to_string(),
    found: 0,
  })?;

  Ok((scalar(key, context)?, value))
}
