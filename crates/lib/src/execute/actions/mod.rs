//! Process-level actions: compiler invocations, shell commands, downloads
//! and repository clones.

pub mod cmd;
pub mod fetch;
pub mod git;
pub mod process;

pub use cmd::execute_cmd;
pub use fetch::execute_fetch;
pub use git::git_clone;
pub use process::{FailureKind, run_invocation};
