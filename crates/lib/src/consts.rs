pub const APP_NAME: &str = "bismuth";

/// Per-domain directory holding intermediate build artifacts.
pub const INTERMEDIATE_DIR: &str = "Intermediate";
/// Subdirectory of `INTERMEDIATE_DIR` holding module hashes, libraries and precompiled interfaces.
pub const MODULES_DIR: &str = "Modules";
/// Directory created inside a deploy for cloned repositories.
pub const DEPLOY_DIR: &str = "Deploy";
/// Default output directory for final executables, relative to the project root.
pub const BUILD_DIR: &str = "Build";

pub const HASH_EXTENSION: &str = "hash";
pub const TEMP_DIR_SUFFIX: &str = "_temp";

pub const PROJECT_FILE_SUFFIX: &str = ".bismuth";
pub const MODULE_DESCRIPTOR_SUFFIX: &str = ".module.json";
pub const DEPLOY_DESCRIPTOR_SUFFIX: &str = ".deploy.json";
pub const RULES_DESCRIPTOR_SUFFIX: &str = ".rules.json";

/// Environment variable overriding the host-default toolchain.
pub const TOOLCHAIN_ENV: &str = "BISMUTH_TOOLCHAIN";

/// Directories never descended into while scanning a domain.
pub const SCAN_SKIP_DIRS: &[&str] = &[INTERMEDIATE_DIR, BUILD_DIR, DEPLOY_DIR];

pub const DEFAULT_CONFIGURATION: &str = "Development";
