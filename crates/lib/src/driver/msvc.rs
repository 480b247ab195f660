//! MSVC renderer.
//!
//! `cl.exe` compiles an interface unit and writes its `.ifc` in a single
//! invocation. Static libraries go through `lib.exe`.

use super::{
  CommandDriver, DriverError, Executor, Invocation, OptimizationLevel, Render, RenderedCommand, Standard, with_extension,
};

pub const CL: &str = "cl.exe";
pub const PRECOMPILED_EXTENSION: &str = "ifc";

pub struct MsvcRenderer;

impl Render for MsvcRenderer {
  fn render(&self, driver: &CommandDriver) -> Result<RenderedCommand, DriverError> {
    match driver.executor {
      Executor::Compiler => compiler_command(driver),
      Executor::Linker => library_command(driver),
      Executor::Resource => resource_command(driver),
    }
  }
}

fn compiler_command(driver: &CommandDriver) -> Result<RenderedCommand, DriverError> {
  let mut inv = Invocation::new(CL);
  inv.arg("/nologo").arg("/W3").arg("/WX-").arg("/EHsc");
  inv.arg(match driver.standard {
    Standard::Cxx20 => "/std:c++20",
    Standard::Cxx23 => "/std:c++latest",
  });

  if driver.compile {
    let source = driver.require_source()?;
    if driver.interface {
      let ifc = with_extension(driver.require_precompiled_output()?, PRECOMPILED_EXTENSION);
      inv.arg("/TP").arg("/interface").arg("/ifcOutput").arg(ifc);
    }
    inv.arg("/c").path(source);
  } else if let Some(source) = &driver.source {
    inv.path(source);
  }

  for reference in &driver.precompiled {
    inv
      .arg("/reference")
      .arg(with_extension(reference, PRECOMPILED_EXTENSION));
  }
  for define in &driver.defines {
    inv.arg("/D").arg(define.clone());
  }
  if driver.debug_symbols {
    inv.arg("/Zi");
  }
  inv.arg(match driver.optimization {
    OptimizationLevel::Debug => "/Od",
    OptimizationLevel::Performance => "/O2",
    OptimizationLevel::Space => "/O1",
  });
  for dir in &driver.precompiled_search_dirs {
    inv.arg("/ifcSearchDir").path(dir);
  }
  for include in &driver.includes {
    inv.arg("/I").path(include);
  }

  let output = driver.require_object_output()?;
  if driver.compile {
    inv.arg(format!("/Fo{}", output.display()));
  } else {
    inv.arg(format!("/Fe{}", output.display()));
  }
  if let Some(pdb) = &driver.debug_output {
    inv.arg(format!("/Fd{}", pdb.display()));
  }

  if !driver.compile {
    for object in &driver.objects {
      inv.path(object);
    }
    for option in &driver.link_options {
      inv.arg(library_name(option));
    }
    if driver.debug_symbols {
      inv.arg("/link").arg("/DEBUG:FULL");
    }
  }

  Ok(RenderedCommand::single(inv))
}

/// `user32` becomes `user32.lib`; switches and explicit names pass through.
fn library_name(option: &str) -> String {
  if option.starts_with('/') || option.ends_with(".lib") {
    option.to_string()
  } else {
    format!("{option}.lib")
  }
}

fn library_command(driver: &CommandDriver) -> Result<RenderedCommand, DriverError> {
  let output = driver.require_object_output()?;

  let mut inv = Invocation::new("lib.exe");
  inv
    .arg("/nologo")
    .arg(format!("/machine:{}", driver.target.arch.msvc_machine()))
    .arg(format!("/out:{}", output.display()));
  for object in &driver.objects {
    inv.path(object);
  }
  Ok(RenderedCommand::single(inv))
}

fn resource_command(driver: &CommandDriver) -> Result<RenderedCommand, DriverError> {
  let source = driver.require_source()?;
  let output = driver.require_object_output()?;

  let mut inv = Invocation::new("rc.exe");
  inv.arg("/nologo");
  for define in &driver.defines {
    inv.arg("/d").arg(define.clone());
  }
  inv.arg("/fo").path(output).path(source);
  Ok(RenderedCommand::single(inv))
}
