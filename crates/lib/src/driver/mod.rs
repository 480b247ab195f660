//! Toolchain-neutral compiler and linker command construction.
//!
//! A `CommandDriver` accumulates what a build step needs (sources, outputs,
//! defines, include paths, precompiled interface references, objects) without
//! committing to any toolchain's flag syntax. `Toolchain::render` turns that
//! state into concrete invocations for Clang, MSVC or Emscripten.
//!
//! Drivers are cheap to clone and workers branch a shared base per step:
//!
//! ```ignore
//! let mut unit = base.clone();
//! unit.set_interface(true).set_source("Core.cppm").set_precompiled_output("Core");
//! let command = Toolchain::Clang.render(&unit)?;
//! ```

pub mod clang;
pub mod emscripten;
mod invocation;
pub mod msvc;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::platform::{Platform, TargetPlatform, Toolchain};

pub use invocation::{Invocation, RenderedCommand};

/// Which tool a driver state is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Executor {
  #[default]
  Compiler,
  /// Static library creation.
  Linker,
  /// Resource script compilation.
  Resource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationLevel {
  Debug,
  #[default]
  Performance,
  Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Standard {
  #[default]
  Cxx20,
  Cxx23,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
  #[error("{toolchain} cannot target {platform}")]
  UnsupportedPlatform { toolchain: Toolchain, platform: Platform },

  #[error("{toolchain} has no {executor:?} executor")]
  UnsupportedExecutor { toolchain: Toolchain, executor: Executor },

  #[error("{executor:?} invocation has no source file")]
  MissingSource { executor: Executor },

  #[error("{0} output is not set")]
  MissingOutput(&'static str),
}

/// Renders driver state into concrete invocations.
pub trait Render {
  fn render(&self, driver: &CommandDriver) -> Result<RenderedCommand, DriverError>;
}

impl Render for Toolchain {
  fn render(&self, driver: &CommandDriver) -> Result<RenderedCommand, DriverError> {
    match self {
      Toolchain::Clang => clang::ClangRenderer.render(driver),
      Toolchain::Msvc => msvc::MsvcRenderer.render(driver),
      Toolchain::Emscripten => emscripten::EmscriptenRenderer.render(driver),
    }
  }
}

/// Accumulated state of one compiler, linker or resource step.
///
/// List-valued state keeps insertion order and ignores values already
/// present, so repeating an `add_*` call never changes the rendered command.
/// Object outputs are used verbatim; precompiled outputs and references are
/// extension-less bases the renderer completes (`.pcm` or `.ifc`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDriver {
  executor: Executor,
  standard: Standard,
  optimization: OptimizationLevel,
  debug_symbols: bool,
  interface: bool,
  compile: bool,
  source: Option<PathBuf>,
  precompiled: Vec<PathBuf>,
  objects: Vec<PathBuf>,
  defines: Vec<String>,
  includes: Vec<PathBuf>,
  precompiled_search_dirs: Vec<PathBuf>,
  link_options: Vec<String>,
  object_output: Option<PathBuf>,
  precompiled_output: Option<PathBuf>,
  /// Program database path. Only MSVC renders it (`/Fd`); Clang and
  /// Emscripten keep debug info inside the object.
  debug_output: Option<PathBuf>,
  target: TargetPlatform,
}

impl CommandDriver {
  /// A compiler driver producing objects for `target`.
  pub fn new(target: TargetPlatform) -> Self {
    Self {
      executor: Executor::Compiler,
      standard: Standard::default(),
      optimization: OptimizationLevel::default(),
      debug_symbols: false,
      interface: false,
      compile: true,
      source: None,
      precompiled: Vec::new(),
      objects: Vec::new(),
      defines: Vec::new(),
      includes: Vec::new(),
      precompiled_search_dirs: Vec::new(),
      link_options: Vec::new(),
      object_output: None,
      precompiled_output: None,
      debug_output: None,
      target,
    }
  }

  pub fn set_executor(&mut self, executor: Executor) -> &mut Self {
    self.executor = executor;
    self
  }

  pub fn set_standard(&mut self, standard: Standard) -> &mut Self {
    self.standard = standard;
    self
  }

  pub fn set_optimization(&mut self, level: OptimizationLevel) -> &mut Self {
    self.optimization = level;
    self
  }

  pub fn set_target(&mut self, target: TargetPlatform) -> &mut Self {
    self.target = target;
    self
  }

  pub fn emit_debug_symbols(&mut self, enabled: bool) -> &mut Self {
    self.debug_symbols = enabled;
    self
  }

  /// Marks the source as a module interface unit.
  pub fn set_interface(&mut self, interface: bool) -> &mut Self {
    self.interface = interface;
    self
  }

  /// `true` produces an object; `false` links an executable from the objects.
  pub fn set_compile(&mut self, compile: bool) -> &mut Self {
    self.compile = compile;
    self
  }

  pub fn set_source(&mut self, source: impl Into<PathBuf>) -> &mut Self {
    self.source = Some(source.into());
    self
  }

  pub fn set_object_output(&mut self, path: impl Into<PathBuf>) -> &mut Self {
    self.object_output = Some(path.into());
    self
  }

  pub fn set_precompiled_output(&mut self, base: impl Into<PathBuf>) -> &mut Self {
    self.precompiled_output = Some(base.into());
    self
  }

  /// Sets the `.pdb` written by MSVC; ignored by the other renderers.
  pub fn set_debug_output(&mut self, path: impl Into<PathBuf>) -> &mut Self {
    self.debug_output = Some(path.into());
    self
  }

  pub fn add_precompiled(&mut self, base: impl Into<PathBuf>) -> &mut Self {
    push_unique(&mut self.precompiled, base.into());
    self
  }

  pub fn add_object(&mut self, path: impl Into<PathBuf>) -> &mut Self {
    push_unique(&mut self.objects, path.into());
    self
  }

  pub fn add_define(&mut self, define: impl Into<String>) -> &mut Self {
    push_unique(&mut self.defines, define.into());
    self
  }

  pub fn add_include(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
    push_unique(&mut self.includes, dir.into());
    self
  }

  pub fn add_precompiled_search_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
    push_unique(&mut self.precompiled_search_dirs, dir.into());
    self
  }

  /// Library or linker option passed when linking an executable.
  pub fn add_link_option(&mut self, option: impl Into<String>) -> &mut Self {
    push_unique(&mut self.link_options, option.into());
    self
  }

  pub fn wipe_precompiled(&mut self) -> &mut Self {
    self.precompiled.clear();
    self
  }

  pub fn wipe_objects(&mut self) -> &mut Self {
    self.objects.clear();
    self
  }

  pub fn wipe_defines(&mut self) -> &mut Self {
    self.defines.clear();
    self
  }

  pub fn wipe_includes(&mut self) -> &mut Self {
    self.includes.clear();
    self
  }

  pub fn wipe_precompiled_search_dirs(&mut self) -> &mut Self {
    self.precompiled_search_dirs.clear();
    self
  }

  pub fn wipe_link_options(&mut self) -> &mut Self {
    self.link_options.clear();
    self
  }

  pub fn executor(&self) -> Executor {
    self.executor
  }

  pub fn debug_symbols(&self) -> bool {
    self.debug_symbols
  }

  pub fn target(&self) -> TargetPlatform {
    self.target
  }

  pub fn source(&self) -> Option<&Path> {
    self.source.as_deref()
  }

  pub fn precompiled(&self) -> &[PathBuf] {
    &self.precompiled
  }

  pub fn objects(&self) -> &[PathBuf] {
    &self.objects
  }

  pub fn defines(&self) -> &[String] {
    &self.defines
  }

  pub fn includes(&self) -> &[PathBuf] {
    &self.includes
  }

  pub fn object_output(&self) -> Option<&Path> {
    self.object_output.as_deref()
  }

  pub fn render(&self, toolchain: Toolchain) -> Result<RenderedCommand, DriverError> {
    toolchain.render(self)
  }

  fn require_source(&self) -> Result<&Path, DriverError> {
    self.source.as_deref().ok_or(DriverError::MissingSource {
      executor: self.executor,
    })
  }

  fn require_object_output(&self) -> Result<&Path, DriverError> {
    self.object_output.as_deref().ok_or(DriverError::MissingOutput("object"))
  }

  fn require_precompiled_output(&self) -> Result<&Path, DriverError> {
    self
      .precompiled_output
      .as_deref()
      .ok_or(DriverError::MissingOutput("precompiled interface"))
  }
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, value: T) {
  if !list.contains(&value) {
    list.push(value);
  }
}

/// `base` with `ext` appended, keeping any dots already in the file name.
fn with_extension(base: &Path, ext: &str) -> String {
  format!("{}.{ext}", base.display())
}
