use std::fmt;
use std::path::Path;

/// A single process launch: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: String,
  pub args: Vec<String>,
}

impl Invocation {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
    self.args.push(arg.into());
    self
  }

  pub fn path(&mut self, path: &Path) -> &mut Self {
    self.arg(path.display().to_string())
  }

  pub fn has_arg(&self, arg: &str) -> bool {
    self.args.iter().any(|a| a == arg)
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", quote(&self.program))?;
    for arg in &self.args {
      write!(f, " {}", quote(arg))?;
    }
    Ok(())
  }
}

fn quote(arg: &str) -> String {
  if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"') {
    format!("\"{}\"", arg.replace('"', "\\\""))
  } else {
    arg.to_string()
  }
}

/// The ordered invocations one driver state renders to.
///
/// Clang precompiles an interface unit and then compiles the result, so a
/// single driver state can need more than one process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedCommand {
  pub steps: Vec<Invocation>,
}

impl RenderedCommand {
  pub fn single(invocation: Invocation) -> Self {
    Self {
      steps: vec![invocation],
    }
  }
}

impl fmt::Display for RenderedCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, step) in self.steps.iter().enumerate() {
      if i > 0 {
        write!(f, " && ")?;
      }
      write!(f, "{step}")?;
    }
    Ok(())
  }
}
