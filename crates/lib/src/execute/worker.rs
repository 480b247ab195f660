//! Per-module compilation planning.
//!
//! A `CompileWorker` turns one staged node into the ordered steps that build
//! its static library:
//!
//! ```text
//! C++20 module:  partitions (stage by stage) -> interface unit
//!                -> [implementation unit] -> module library
//! legacy module: one object per translation unit -> module library
//! ```
//!
//! Planning is free of side effects; `run_plan` in the parent module spawns
//! the steps and persists the hash.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use super::types::ExecuteError;
use crate::driver::{CommandDriver, Executor, RenderedCommand};
use crate::platform::Toolchain;
use crate::record::{Domain, ModuleRecord};
use crate::solve::{NodeRecord, StagedModuleInfo};
use crate::store::Layout;

const OBJECT_EXTENSION: &str = "obj";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepKind {
  PrecompilePartition,
  CompilePartitionImplementation,
  CompileInterfaceUnit,
  CompileImplementationUnit,
  CompileTranslationUnit,
  LinkModuleLibrary,
}

impl StepKind {
  pub fn is_link(self) -> bool {
    self == StepKind::LinkModuleLibrary
  }
}

impl fmt::Display for StepKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      StepKind::PrecompilePartition => "precompile partition",
      StepKind::CompilePartitionImplementation => "compile partition implementation",
      StepKind::CompileInterfaceUnit => "compile interface unit",
      StepKind::CompileImplementationUnit => "compile implementation unit",
      StepKind::CompileTranslationUnit => "compile",
      StepKind::LinkModuleLibrary => "link",
    };
    write!(f, "{s}")
  }
}

/// One rendered step of a module build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
  pub kind: StepKind,
  /// What the step works on, e.g. `Render:mesh` or `a.cpp`.
  pub label: String,
  pub command: RenderedCommand,
}

/// Everything needed to build one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePlan {
  pub module: String,
  pub domain: Domain,
  pub temp_dir: PathBuf,
  pub library: PathBuf,
  /// Content hash to persist once every step succeeded.
  pub hash: Option<String>,
  pub steps: Vec<PlannedStep>,
}

/// Plans the build of one staged node from a shared base driver.
pub struct CompileWorker<'a> {
  node: &'a StagedModuleInfo,
  base: CommandDriver,
  toolchain: Toolchain,
  layout: &'a Layout,
  dependencies: Vec<&'a StagedModuleInfo>,
}

impl<'a> CompileWorker<'a> {
  pub fn new(node: &'a StagedModuleInfo, base: &CommandDriver, toolchain: Toolchain, layout: &'a Layout) -> Self {
    let mut base = base.clone();
    let includes = match &node.record {
      NodeRecord::Module(m) => m.include_dirs(),
      NodeRecord::Deploy(d) => d.include_dirs(),
    };
    for dir in includes {
      base.add_include(dir);
    }
    if base.debug_symbols() && toolchain == Toolchain::Msvc {
      base.set_debug_output(layout.temp_dir(node.domain, &node.name).join(format!("{}.pdb", node.name)));
    }

    Self {
      node,
      base,
      toolchain,
      layout,
      dependencies: Vec::new(),
    }
  }

  /// Makes `dependency`'s headers and precompiled interface visible to every
  /// step of this module.
  pub fn add_dependency(&mut self, dependency: &'a StagedModuleInfo) {
    if self.dependencies.iter().any(|d| d.name == dependency.name) {
      warn!(module = %self.node.name, dependency = %dependency.name, "dependency added twice");
      return;
    }

    match &dependency.record {
      NodeRecord::Module(m) => {
        for dir in m.include_dirs() {
          self.base.add_include(dir);
        }
        if m.is_cxx_module {
          self.base.add_precompiled(self.layout.precompiled_base(dependency.domain, &m.name));
        }
      }
      NodeRecord::Deploy(d) => {
        for dir in d.include_dirs() {
          self.base.add_include(dir);
        }
      }
    }
    self.dependencies.push(dependency);
  }

  pub fn dependencies(&self) -> impl Iterator<Item = &str> {
    self.dependencies.iter().map(|d| d.name.as_str())
  }

  pub fn library(&self) -> PathBuf {
    self
      .layout
      .library_path(self.node.domain, &self.node.name, self.base.target().platform)
  }

  /// Renders every step without touching the filesystem.
  pub fn plan(&self) -> Result<ModulePlan, ExecuteError> {
    let temp_dir = self.layout.temp_dir(self.node.domain, &self.node.name);
    let mut steps = Vec::new();
    let mut objects = Vec::new();

    match &self.node.record {
      NodeRecord::Module(m) if m.is_cxx_module => self.plan_module_units(m, &temp_dir, &mut steps, &mut objects)?,
      NodeRecord::Module(m) => self.plan_translation_units(&m.sources, &temp_dir, &mut steps, &mut objects)?,
      NodeRecord::Deploy(d) => self.plan_translation_units(&d.sources, &temp_dir, &mut steps, &mut objects)?,
    }

    let library = self.library();
    let mut link = self.base.clone();
    link.set_executor(Executor::Linker).wipe_objects().set_object_output(&library);
    for object in objects {
      link.add_object(object);
    }
    steps.push(self.step(StepKind::LinkModuleLibrary, &self.node.name, &link)?);

    Ok(ModulePlan {
      module: self.node.name.clone(),
      domain: self.node.domain,
      temp_dir,
      library,
      hash: self.node.actual_hash.clone(),
      steps,
    })
  }

  fn plan_module_units(
    &self,
    module: &ModuleRecord,
    temp_dir: &Path,
    steps: &mut Vec<PlannedStep>,
    objects: &mut Vec<PathBuf>,
  ) -> Result<(), ExecuteError> {
    let mut unit = self.base.clone();

    for stage in &self.node.partition_order {
      for partition in &stage.partitions {
        let label = format!("{}:{}", module.name, partition.name);
        let pcm = temp_dir.join(&partition.name);

        if let Some(interface) = &partition.interface {
          let object = temp_dir.join(format!("{}_interface.{OBJECT_EXTENSION}", partition.name));
          let mut step = unit.clone();
          step
            .set_interface(true)
            .set_source(interface)
            .set_precompiled_output(&pcm)
            .set_object_output(&object);
          steps.push(self.step(StepKind::PrecompilePartition, &label, &step)?);
          objects.push(object);
        }

        if let Some(implementation) = &partition.implementation {
          let object = temp_dir.join(format!("{}_implementation.{OBJECT_EXTENSION}", partition.name));
          let mut step = unit.clone();
          step
            .set_source(implementation)
            .add_precompiled(&pcm)
            .set_object_output(&object);
          steps.push(self.step(StepKind::CompilePartitionImplementation, &label, &step)?);
          objects.push(object);
        }
      }

      // Later stages may import anything staged so far.
      for partition in &stage.partitions {
        unit.add_precompiled(temp_dir.join(&partition.name));
      }
    }

    let interface = module
      .interface_unit
      .as_ref()
      .ok_or_else(|| ExecuteError::MissingInterfaceUnit {
        module: module.name.clone(),
      })?;
    let pcm = self.layout.precompiled_base(self.node.domain, &module.name);

    let object = temp_dir.join(format!("{}_interface.{OBJECT_EXTENSION}", module.name));
    let mut step = unit.clone();
    step
      .set_interface(true)
      .set_source(interface)
      .set_precompiled_output(&pcm)
      .set_object_output(&object);
    steps.push(self.step(StepKind::CompileInterfaceUnit, &module.name, &step)?);
    objects.push(object);

    if let Some(implementation) = &module.implementation_unit {
      let object = temp_dir.join(format!("{}_implementation.{OBJECT_EXTENSION}", module.name));
      let mut step = unit;
      step
        .set_source(implementation)
        .add_precompiled(&pcm)
        .set_object_output(&object);
      steps.push(self.step(StepKind::CompileImplementationUnit, &module.name, &step)?);
      objects.push(object);
    }

    Ok(())
  }

  fn plan_translation_units(
    &self,
    sources: &[PathBuf],
    temp_dir: &Path,
    steps: &mut Vec<PlannedStep>,
    objects: &mut Vec<PathBuf>,
  ) -> Result<(), ExecuteError> {
    for source in sources {
      let stem = source.file_stem().and_then(|s| s.to_str()).unwrap_or(&self.node.name);
      let object = unique_object(temp_dir, stem, objects);

      let mut step = self.base.clone();
      step.set_source(source).set_object_output(&object);

      let label = source
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());
      steps.push(self.step(StepKind::CompileTranslationUnit, &label, &step)?);
      objects.push(object);
    }
    Ok(())
  }

  fn step(&self, kind: StepKind, label: &str, driver: &CommandDriver) -> Result<PlannedStep, ExecuteError> {
    Ok(PlannedStep {
      kind,
      label: label.to_string(),
      command: driver.render(self.toolchain)?,
    })
  }
}

/// `<stem>.obj`, suffixed with a counter when another source shares the stem.
fn unique_object(temp_dir: &Path, stem: &str, taken: &[PathBuf]) -> PathBuf {
  let mut candidate = temp_dir.join(format!("{stem}.{OBJECT_EXTENSION}"));
  let mut n = 1;
  while taken.contains(&candidate) {
    candidate = temp_dir.join(format!("{stem}_{n}.{OBJECT_EXTENSION}"));
    n += 1;
  }
  candidate
}
