use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PlatformError;

/// Target platform families a build can be produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
  Win32,
  Mach,
  Unix,
  #[serde(rename = "WebASM")]
  WebAsm,
}

impl Platform {
  /// Detect the host platform at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "windows" => Some(Self::Win32),
      "macos" => Some(Self::Mach),
      "linux" | "freebsd" | "netbsd" | "openbsd" => Some(Self::Unix),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Win32 => "Win32",
      Self::Mach => "Mach",
      Self::Unix => "Unix",
      Self::WebAsm => "WebASM",
    }
  }

  /// Preprocessor define identifying the platform to compiled code.
  pub fn define(&self) -> &'static str {
    match self {
      Self::Win32 => "PLATFORM_WINDOWS",
      Self::Mach => "PLATFORM_MAC",
      Self::Unix => "PLATFORM_LINUX",
      Self::WebAsm => "PLATFORM_WEB",
    }
  }

  /// Extension of the per-module static library.
  pub fn static_lib_extension(&self) -> &'static str {
    match self {
      Self::Win32 => "lib",
      _ => "a",
    }
  }

  /// Extension of the final linked executable, if the platform uses one.
  pub fn executable_extension(&self) -> Option<&'static str> {
    match self {
      Self::Win32 => Some("exe"),
      Self::WebAsm => Some("js"),
      Self::Mach | Self::Unix => None,
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Platform {
  type Err = PlatformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "win32" | "windows" => Ok(Self::Win32),
      "mach" | "macos" | "darwin" => Ok(Self::Mach),
      "unix" | "linux" => Ok(Self::Unix),
      "webasm" | "wasm" | "web" => Ok(Self::WebAsm),
      _ => Err(PlatformError::UnknownPlatform(s.to_string())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn current_returns_supported_platform() {
    assert!(Platform::current().is_some(), "host platform should be supported");
  }

  #[test]
  fn parses_aliases_case_insensitively() {
    assert_eq!("Win32".parse::<Platform>().unwrap(), Platform::Win32);
    assert_eq!("linux".parse::<Platform>().unwrap(), Platform::Unix);
    assert_eq!("DARWIN".parse::<Platform>().unwrap(), Platform::Mach);
    assert_eq!("WebASM".parse::<Platform>().unwrap(), Platform::WebAsm);
  }

  #[test]
  fn rejects_unknown_platform() {
    let err = "beos".parse::<Platform>().unwrap_err();
    assert_eq!(err, PlatformError::UnknownPlatform("beos".to_string()));
  }

  #[test]
  fn library_extension_follows_platform() {
    assert_eq!(Platform::Win32.static_lib_extension(), "lib");
    assert_eq!(Platform::Unix.static_lib_extension(), "a");
    assert_eq!(Platform::WebAsm.executable_extension(), Some("js"));
    assert_eq!(Platform::Mach.executable_extension(), None);
  }
}
