//! Error types for the Isle dispatcher

use std::path::PathBuf;

use thiserror::Error;

use crate::validator::ScriptFailure;

/// Result type alias using the Isle error
pub type Result<T> = std::result::Result<T, Error>;

/// Exit status for every fatal condition detected before dispatch
pub const EXIT_FAILURE: i32 = 1;

/// Exit status when the target could not be started at all
pub const EXIT_SPAWN_FAILURE: i32 = 127;

/// Isle error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No script registered for '{0}'")]
    ScriptNotFound(String),

    #[error("{} script(s) missing or not executable", failures.len())]
    ScriptValidation { failures: Vec<ScriptFailure> },

    #[error("user is not in the '{group}' group")]
    DockerGroupMissing { group: String },

    #[error("cannot access the Docker daemon")]
    DockerDaemonUnreachable { group: String },

    #[error("Error checking Docker group membership: {0}")]
    PermissionCheck(String),

    #[error("'{command}' must be run under a namespace: {}", namespaces.join(", "))]
    NamespaceRequired {
        command: String,
        namespaces: Vec<String>,
    },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unknown project: {project}")]
    UnknownProject {
        project: String,
        available: Vec<String>,
    },

    #[error("failed to start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Process exit status this error maps to
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Spawn { .. } => EXIT_SPAWN_FAILURE,
            _ => EXIT_FAILURE,
        }
    }

    /// Concrete steps the user can take to fix the condition
    pub fn remediation(&self) -> Vec<String> {
        match self {
            Error::ScriptValidation { failures } => {
                let mut lines: Vec<String> = failures
                    .iter()
                    .map(|f| format!("{}: {} ({})", f.name, f.reason, f.path.display()))
                    .collect();
                lines.push("Reinstall the CLI or restore the listed scripts, then try again.".to_string());
                lines
            }
            Error::DockerGroupMissing { group } => vec![
                format!("sudo usermod -aG {} $USER", group),
                format!("newgrp {}", group),
                "   (or log out and log back in)".to_string(),
            ],
            Error::DockerDaemonUnreachable { group } => vec![
                format!("newgrp {}", group),
                "(or log out and log back in)".to_string(),
            ],
            Error::NamespaceRequired { command, namespaces } => namespaces
                .iter()
                .map(|ns| format!("isle {} {}", ns, command))
                .collect(),
            Error::UnknownCommand(_) => {
                vec!["Use \"isle help\" to see available commands.".to_string()]
            }
            Error::UnknownProject { available, .. } => {
                vec![format!("Available projects: {}", available.join(", "))]
            }
            Error::Spawn { .. } => {
                vec!["Check that the configured interpreter is installed and on PATH.".to_string()]
            }
            _ => Vec::new(),
        }
    }
}
