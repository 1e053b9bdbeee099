//! Executable validation
//!
//! Every registered script is checked on every invocation. A script that
//! exists but lacks the execute bit gets one repair attempt; anything still
//! broken afterwards fails the whole pass.

use std::fmt;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::registry::ScriptBinding;

const OWNER_EXECUTE: u32 = 0o100;
const ALL_EXECUTE: u32 = 0o111;

/// Why a script failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Missing,
    NotAFile,
    NotExecutable,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Missing => write!(f, "does not exist"),
            FailureReason::NotAFile => write!(f, "is not a regular file"),
            FailureReason::NotExecutable => write!(f, "is still not executable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFailure {
    pub name: String,
    pub path: PathBuf,
    pub reason: FailureReason,
}

/// Outcome of one validation pass
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub checked: usize,
    pub repaired: Vec<PathBuf>,
    pub failures: Vec<ScriptFailure>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn a failed pass into the fatal error that aborts dispatch
    pub fn into_result(self) -> Result<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(Error::ScriptValidation {
                failures: self.failures,
            })
        }
    }
}

/// Grants execute permission to a script
pub trait Remediator {
    fn grant_execute(&self, path: &Path) -> io::Result<()>;
}

/// `chmod +x`
#[derive(Debug, Default, Clone, Copy)]
pub struct Chmod;

impl Remediator for Chmod {
    fn grant_execute(&self, path: &Path) -> io::Result<()> {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(perms.mode() | ALL_EXECUTE);
        fs::set_permissions(path, perms)
    }
}

/// Checks that every script exists and is executable, fixing the mode once
pub struct ExecutableValidator<R = Chmod> {
    remediator: R,
}

impl ExecutableValidator<Chmod> {
    pub fn new() -> Self {
        Self { remediator: Chmod }
    }
}

impl Default for ExecutableValidator<Chmod> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Remediator> ExecutableValidator<R> {
    pub fn with_remediator(remediator: R) -> Self {
        Self { remediator }
    }

    /// Check every binding without stopping at the first failure
    pub fn validate_all<'a, I>(&self, bindings: I) -> ValidationReport
    where
        I: IntoIterator<Item = &'a ScriptBinding>,
    {
        let mut report = ValidationReport::default();

        for binding in bindings {
            report.checked += 1;
            let path = &binding.target_path;

            let reason = match fs::metadata(path) {
                Err(_) => Some(FailureReason::Missing),
                Ok(meta) if !meta.is_file() => Some(FailureReason::NotAFile),
                Ok(meta) if is_executable(meta.permissions().mode()) => None,
                Ok(_) => {
                    info!(
                        "Script {} is not executable. Attempting to make it executable.",
                        path.display()
                    );
                    self.repair(path, &mut report)
                }
            };

            if let Some(reason) = reason {
                warn!("Script {} ({}) {}", binding.logical_name, path.display(), reason);
                report.failures.push(ScriptFailure {
                    name: binding.logical_name.clone(),
                    path: path.clone(),
                    reason,
                });
            }
        }

        debug!(
            checked = report.checked,
            repaired = report.repaired.len(),
            failed = report.failures.len(),
            "script validation finished"
        );
        report
    }

    fn repair(&self, path: &Path, report: &mut ValidationReport) -> Option<FailureReason> {
        if let Err(e) = self.remediator.grant_execute(path) {
            warn!("Failed to make {} executable: {}", path.display(), e);
        }

        match fs::metadata(path) {
            Err(_) => Some(FailureReason::Missing),
            Ok(meta) if is_executable(meta.permissions().mode()) => {
                info!("Made {} executable.", path.display());
                report.repaired.push(path.to_path_buf());
                None
            }
            Ok(_) => Some(FailureReason::NotExecutable),
        }
    }
}

fn is_executable(mode: u32) -> bool {
    mode & OWNER_EXECUTE != 0
}
