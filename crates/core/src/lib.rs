//! Isle Core Library
//!
//! Script registry, precondition checks and command routing for the Isle
//! Mesh command-line dispatcher.

pub mod config;
pub mod error;
pub mod executor;
pub mod manifest;
pub mod permission;
pub mod registry;
pub mod router;
pub mod validator;

// Re-export commonly used types
pub use config::IsleConfig;
pub use error::{Error, Result, EXIT_FAILURE, EXIT_SPAWN_FAILURE};
pub use executor::{ProcessExecutor, Runnable, ScriptCommand};
pub use manifest::{CliManifest, CommandSpec, WorkDir};
pub use permission::{DockerAccess, PermissionGate, PermissionState, SystemDocker};
pub use registry::{ScriptBinding, ScriptRegistry};
pub use router::{CommandRouter, Deprecation, InvocationContext, ResolvedInvocation, Route};
pub use validator::{ExecutableValidator, ValidationReport};

/// Isle version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
