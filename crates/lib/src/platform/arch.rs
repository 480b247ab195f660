use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PlatformError;

/// CPU architectures a build can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
  #[serde(rename = "x86_32")]
  X86_32,
  #[serde(rename = "x86_64")]
  X86_64,
  #[serde(rename = "ARM_32")]
  Arm32,
  #[serde(rename = "ARM_64")]
  Arm64,
}

impl Arch {
  /// Detect the host CPU architecture at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::ARCH {
      "x86" => Some(Self::X86_32),
      "x86_64" => Some(Self::X86_64),
      "arm" => Some(Self::Arm32),
      "aarch64" => Some(Self::Arm64),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86_32 => "x86_32",
      Self::X86_64 => "x86_64",
      Self::Arm32 => "ARM_32",
      Self::Arm64 => "ARM_64",
    }
  }

  /// Architecture component of an LLVM target triple
  pub fn triple_prefix(&self) -> &'static str {
    match self {
      Self::X86_32 => "i686",
      Self::X86_64 => "x86_64",
      Self::Arm32 => "armv7",
      Self::Arm64 => "aarch64",
    }
  }

  /// Value for the MSVC librarian's `/machine:` switch
  pub fn msvc_machine(&self) -> &'static str {
    match self {
      Self::X86_32 => "X86",
      Self::X86_64 => "X64",
      Self::Arm32 => "ARM",
      Self::Arm64 => "ARM64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Arch {
  type Err = PlatformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "x86_32" | "x86" | "i686" | "ia32" => Ok(Self::X86_32),
      "x86_64" | "x64" | "amd64" => Ok(Self::X86_64),
      "arm_32" | "arm" | "armv7" => Ok(Self::Arm32),
      "arm_64" | "arm64" | "aarch64" => Ok(Self::Arm64),
      _ => Err(PlatformError::UnknownArch(s.to_string())),
    }
  }
}
