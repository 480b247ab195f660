//! bismuth-lib: dependency staging and command generation for C++20 module builds
//!
//! The crate is organised around the build pipeline:
//! - `scan`: crawls a domain root for module, deploy and rules descriptors
//! - `solve`: stages modules and partitions into a `Timeline`
//! - `driver`: toolchain-neutral `CommandDriver` and its renderers
//! - `execute`: runs a timeline stage by stage and links the final targets
//! - `deploy`: third-party preparation actions run during staging

pub mod config;
pub mod consts;
pub mod deploy;
pub mod driver;
pub mod execute;
pub mod platform;
pub mod record;
pub mod scan;
pub mod solve;
pub mod store;
pub mod util;
