//! Infrastructure layer
//!
//! Concrete implementations for everything outside the process:
//! - platform REST APIs (GitLab, GitHub, Azure DevOps) over an HTTP transport
//! - git mirror transfers through the command line
//! - configuration, the repository index and scratch directories on disk
pub mod filesystem;
pub mod git;
pub mod http;
pub mod platforms;
pub mod process;

pub use filesystem::{AppConfig, ConfigStore, RepositoryIndexStore, ScratchDir};
pub use git::{GitMirror, MirrorOperations};
pub use platforms::{DirectoryAdapter, PlatformRegistry};
pub use process::CommandExecutor;
