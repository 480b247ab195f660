//! Emscripten renderer. Only the WebASM platform is accepted.

use super::clang::compiler_command;
use super::{CommandDriver, DriverError, Executor, Invocation, Render, RenderedCommand};
use crate::platform::{Platform, Toolchain};

pub const EMXX: &str = "em++";

pub struct EmscriptenRenderer;

impl Render for EmscriptenRenderer {
  fn render(&self, driver: &CommandDriver) -> Result<RenderedCommand, DriverError> {
    if driver.target.platform != Platform::WebAsm {
      return Err(DriverError::UnsupportedPlatform {
        toolchain: Toolchain::Emscripten,
        platform: driver.target.platform,
      });
    }

    match driver.executor {
      Executor::Compiler => compiler_command(EMXX, driver, false),
      Executor::Linker => {
        let mut inv = Invocation::new("emar");
        inv.arg("rcs").path(driver.require_object_output()?);
        for object in &driver.objects {
          inv.path(object);
        }
        Ok(RenderedCommand::single(inv))
      }
      Executor::Resource => Err(DriverError::UnsupportedExecutor {
        toolchain: Toolchain::Emscripten,
        executor: Executor::Resource,
      }),
    }
  }
}
