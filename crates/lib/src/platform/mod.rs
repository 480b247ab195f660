pub mod arch;
pub mod os;
pub mod toolchain;

use std::fmt;

use thiserror::Error;

pub use arch::Arch;
pub use os::Platform;
pub use toolchain::{Toolchain, ToolchainError, check_git, check_toolchain};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
  #[error("unknown platform '{0}' (expected Win32, Mach, Unix or WebASM)")]
  UnknownPlatform(String),

  #[error("unknown architecture '{0}' (expected x86_32, x86_64, ARM_32 or ARM_64)")]
  UnknownArch(String),

  #[error("unknown toolchain '{0}' (expected clang, msvc or emscripten)")]
  UnknownToolchain(String),

  #[error("the host platform is not supported; pass --platform and --arch")]
  UnsupportedHost,
}

/// Platform and architecture pair a build is produced for (e.g. "Unix_x86_64")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetPlatform {
  pub platform: Platform,
  pub arch: Arch,
}

impl TargetPlatform {
  pub fn new(platform: Platform, arch: Arch) -> Self {
    Self { platform, arch }
  }

  /// Detect the host target
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn current() -> Option<Self> {
    Some(Self {
      platform: Platform::current()?,
      arch: Arch::current()?,
    })
  }

  /// LLVM target triple passed to clang via `--target=`
  pub fn triple(&self) -> String {
    let arch = self.arch.triple_prefix();
    match self.platform {
      Platform::Win32 => format!("{arch}-pc-windows-msvc"),
      Platform::Mach => format!("{arch}-apple-darwin"),
      Platform::Unix if self.arch == Arch::Arm32 => format!("{arch}-unknown-linux-gnueabihf"),
      Platform::Unix => format!("{arch}-unknown-linux-gnu"),
      Platform::WebAsm => "wasm32-unknown-emscripten".to_string(),
    }
  }
}

impl fmt::Display for TargetPlatform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}_{}", self.platform, self.arch)
  }
}
