//! Clang/LLVM renderer.
//!
//! Interface units take two processes: `--precompile` emits the `.pcm`,
//! then the `.pcm` is compiled to an object. Static libraries use the LLVM
//! linker that matches the target platform.

use super::{
  CommandDriver, DriverError, Executor, Invocation, OptimizationLevel, Render, RenderedCommand, Standard, with_extension,
};
use crate::platform::Platform;

pub const CLANG: &str = "clang++";
pub const PRECOMPILED_EXTENSION: &str = "pcm";

pub struct ClangRenderer;

impl Render for ClangRenderer {
  fn render(&self, driver: &CommandDriver) -> Result<RenderedCommand, DriverError> {
    match driver.executor {
      Executor::Compiler => compiler_command(CLANG, driver, true),
      Executor::Linker => library_command(driver),
      Executor::Resource => resource_command(driver),
    }
  }
}

/// Compiler steps shared with the Emscripten renderer, which drives the
/// same frontend through `em++` and brings its own target and linker.
pub(crate) fn compiler_command(program: &str, driver: &CommandDriver, native: bool) -> Result<RenderedCommand, DriverError> {
  let base = || {
    let mut inv = Invocation::new(program);
    common_flags(&mut inv, driver, native);
    inv
  };

  if !driver.compile {
    let mut link = base();
    if native {
      link.arg("-fuse-ld=lld");
    }
    if let Some(source) = &driver.source {
      link.path(source);
    }
    for object in &driver.objects {
      link.path(object);
    }
    for option in &driver.link_options {
      link.arg(link_flag(option));
    }
    link.arg("-o").path(driver.require_object_output()?);
    return Ok(RenderedCommand::single(link));
  }

  let source = driver.require_source()?;
  let object = driver.require_object_output()?;

  if driver.interface {
    let pcm = with_extension(driver.require_precompiled_output()?, PRECOMPILED_EXTENSION);

    let mut precompile = base();
    preprocessor_flags(&mut precompile, driver);
    precompile.arg("--precompile").path(source).arg("-o").arg(pcm.clone());

    let mut compile = base();
    compile.arg("-c").arg(pcm).arg("-o").path(object);

    return Ok(RenderedCommand {
      steps: vec![precompile, compile],
    });
  }

  let mut compile = base();
  preprocessor_flags(&mut compile, driver);
  compile.arg("-c").path(source).arg("-o").path(object);
  Ok(RenderedCommand::single(compile))
}

fn common_flags(inv: &mut Invocation, driver: &CommandDriver, native: bool) {
  inv.arg(match driver.standard {
    Standard::Cxx20 => "-std=c++20",
    Standard::Cxx23 => "-std=c++23",
  });
  inv.arg("-Wall");
  if native {
    inv.arg(format!("--target={}", driver.target.triple()));
  }
  if driver.debug_symbols {
    inv.arg("-g");
  }
  inv.arg(match driver.optimization {
    OptimizationLevel::Debug => "-O0",
    OptimizationLevel::Performance => "-O3",
    OptimizationLevel::Space => "-Os",
  });
  for dir in &driver.precompiled_search_dirs {
    inv.arg(format!("-fprebuilt-module-path={}", dir.display()));
  }
  for reference in &driver.precompiled {
    inv.arg(format!(
      "-fmodule-file={}",
      with_extension(reference, PRECOMPILED_EXTENSION)
    ));
  }
}

/// Defines and include paths only matter while preprocessing the source.
fn preprocessor_flags(inv: &mut Invocation, driver: &CommandDriver) {
  for define in &driver.defines {
    inv.arg(format!("-D{define}"));
  }
  for include in &driver.includes {
    inv.arg(format!("-I{}", include.display()));
  }
}

fn link_flag(option: &str) -> String {
  if option.starts_with('-') {
    option.to_string()
  } else {
    format!("-l{option}")
  }
}

fn library_command(driver: &CommandDriver) -> Result<RenderedCommand, DriverError> {
  let output = driver.require_object_output()?;

  let mut inv = match driver.target.platform {
    Platform::Win32 => {
      let mut inv = Invocation::new("lld-link");
      inv.arg("/lib").arg("/nologo").arg(format!("/out:{}", output.display()));
      inv
    }
    platform => {
      let linker = match platform {
        Platform::Mach => "ld64.lld",
        Platform::WebAsm => "wasm-ld",
        _ => "ld.lld",
      };
      let mut inv = Invocation::new(linker);
      inv.arg("-r").arg("-o").path(output);
      inv
    }
  };

  for object in &driver.objects {
    inv.path(object);
  }
  Ok(RenderedCommand::single(inv))
}

fn resource_command(driver: &CommandDriver) -> Result<RenderedCommand, DriverError> {
  let source = driver.require_source()?;
  let output = driver.require_object_output()?;

  let mut inv = Invocation::new("llvm-rc");
  inv.arg("/nologo");
  for define in &driver.defines {
    inv.arg("/D").arg(define.clone());
  }
  inv.arg("/fo").path(output).path(source);
  Ok(RenderedCommand::single(inv))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::{Arch, TargetPlatform};

  fn unix() -> CommandDriver {
    CommandDriver::new(TargetPlatform::new(Platform::Unix, Arch::X86_64))
  }

  fn render(driver: &CommandDriver) -> RenderedCommand {
    ClangRenderer.render(driver).unwrap()
  }

  #[test]
  fn plain_unit_compiles_in_one_step() {
    let mut d = unix();
    d.add_define("PLATFORM_LINUX")
      .add_include("/src/Core")
      .set_source("/src/Core/util.cpp")
      .set_object_output("/tmp/util.obj");

    let cmd = render(&d);

    assert_eq!(
      cmd.to_string(),
      "clang++ -std=c++20 -Wall --target=x86_64-unknown-linux-gnu -O3 -DPLATFORM_LINUX -I/src/Core \
       -c /src/Core/util.cpp -o /tmp/util.obj"
    );
  }

  #[test]
  fn interface_unit_precompiles_then_compiles() {
    let mut d = unix();
    d.set_interface(true)
      .add_precompiled("/m/Core_temp/math")
      .add_precompiled_search_dir("/m")
      .set_source("/src/Core/Core.cppm")
      .set_precompiled_output("/m/Core")
      .set_object_output("/m/Core_temp/Core_interface.obj");

    let cmd = render(&d);

    assert_eq!(cmd.steps.len(), 2);
    let precompile = &cmd.steps[0];
    assert!(precompile.has_arg("--precompile"));
    assert!(precompile.has_arg("-fmodule-file=/m/Core_temp/math.pcm"));
    assert!(precompile.has_arg("-fprebuilt-module-path=/m"));
    assert_eq!(precompile.args[precompile.args.len() - 1], "/m/Core.pcm");

    let compile = &cmd.steps[1];
    assert!(compile.has_arg("-c"));
    assert!(compile.has_arg("/m/Core.pcm"));
    assert_eq!(compile.args[compile.args.len() - 1], "/m/Core_temp/Core_interface.obj");
  }

  #[test]
  fn interface_unit_needs_precompiled_output() {
    let mut d = unix();
    d.set_interface(true).set_source("Core.cppm").set_object_output("Core.obj");
    assert_eq!(
      ClangRenderer.render(&d).unwrap_err(),
      DriverError::MissingOutput("precompiled interface")
    );
  }

  #[test]
  fn compile_without_source_is_rejected() {
    let mut d = unix();
    d.set_object_output("x.obj");
    assert_eq!(
      ClangRenderer.render(&d).unwrap_err(),
      DriverError::MissingSource {
        executor: Executor::Compiler
      }
    );
  }

  #[test]
  fn linker_follows_platform() {
    let cases = [
      (Platform::Unix, "ld.lld"),
      (Platform::Mach, "ld64.lld"),
      (Platform::WebAsm, "wasm-ld"),
      (Platform::Win32, "lld-link"),
    ];
    for (platform, linker) in cases {
      let mut d = CommandDriver::new(TargetPlatform::new(platform, Arch::X86_64));
      d.set_executor(Executor::Linker)
        .add_object("a.obj")
        .set_object_output("Core.lib");
      let cmd = render(&d);
      assert_eq!(cmd.steps[0].program, linker);
      assert!(cmd.steps[0].has_arg("a.obj"));
    }
  }

  #[test]
  fn executable_link_uses_objects_and_libraries() {
    let mut d = unix();
    d.set_compile(false)
      .add_object("/m/Game.a")
      .add_link_option("pthread")
      .add_link_option("-Wl,--as-needed")
      .set_object_output("/out/GameDevelopment_Unix_x86_64");

    let cmd = render(&d);

    let link = &cmd.steps[0];
    assert!(link.has_arg("-fuse-ld=lld"));
    assert!(link.has_arg("/m/Game.a"));
    assert!(link.has_arg("-lpthread"));
    assert!(link.has_arg("-Wl,--as-needed"));
    assert!(!link.has_arg("-c"));
  }

  #[test]
  fn debug_flags() {
    let mut d = unix();
    d.emit_debug_symbols(true)
      .set_optimization(OptimizationLevel::Debug)
      .set_source("a.cpp")
      .set_object_output("a.obj");
    let cmd = render(&d);
    assert!(cmd.steps[0].has_arg("-g"));
    assert!(cmd.steps[0].has_arg("-O0"));
  }

  #[test]
  fn debug_output_is_not_rendered() {
    let mut d = unix();
    d.emit_debug_symbols(true)
      .set_debug_output("temp/a.pdb")
      .set_source("a.cpp")
      .set_object_output("a.obj");
    let cmd = render(&d);
    assert!(!cmd.to_string().contains("a.pdb"));
  }
}
