//! Process execution
//!
//! Runs the resolved target synchronously. Standard streams are inherited,
//! so the user talks to the script directly, and the child's exit status is
//! handed back verbatim.

use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::debug;

use crate::error::{Error, Result};
use crate::registry::{ScriptBinding, ScriptRegistry};
use crate::router::{InvocationContext, ResolvedInvocation};

/// Something the router can dispatch to
pub trait Runnable {
    /// Run to completion and return the exit code
    fn execute(&self, context: &InvocationContext) -> Result<i32>;
}

/// An external script, optionally run through an interpreter
#[derive(Debug, Clone)]
pub struct ScriptCommand {
    interpreter: Option<String>,
    path: PathBuf,
}

impl ScriptCommand {
    pub fn new(path: &Path, interpreter: Option<&str>) -> Self {
        Self {
            interpreter: interpreter.filter(|i| !i.is_empty()).map(str::to_string),
            path: path.to_path_buf(),
        }
    }

    /// Program and argument vector for this invocation
    pub fn command_line(&self, context: &InvocationContext) -> (PathBuf, Vec<String>) {
        let mut args = Vec::new();
        let program = match &self.interpreter {
            Some(interpreter) => {
                args.push(self.path.to_string_lossy().into_owned());
                PathBuf::from(interpreter)
            }
            None => self.path.clone(),
        };
        args.extend(context.argument_vector());
        (program, args)
    }
}

impl Runnable for ScriptCommand {
    fn execute(&self, context: &InvocationContext) -> Result<i32> {
        let (program, args) = self.command_line(context);
        debug!(
            program = %program.display(),
            script = %self.path.display(),
            args = %context.argument_string(),
            cwd = %context.working_directory.display(),
            "running script"
        );

        let status = Command::new(&program)
            .args(&args)
            .current_dir(&context.working_directory)
            .status()
            .map_err(|source| Error::Spawn {
                program: program.clone(),
                source,
            })?;

        let code = exit_code(status);
        debug!(code, "child exited");
        Ok(code)
    }
}

/// Exit code of a finished child; signal deaths follow the shell's 128+N
pub fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}

/// Binds resolved invocations to runnable scripts
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    interpreter: Option<String>,
}

impl ProcessExecutor {
    pub fn new(interpreter: Option<&str>) -> Self {
        Self {
            interpreter: interpreter.map(str::to_string),
        }
    }

    pub fn command_for(&self, binding: &ScriptBinding) -> ScriptCommand {
        ScriptCommand::new(&binding.target_path, self.interpreter.as_deref())
    }

    pub fn run(&self, registry: &ScriptRegistry, resolved: &ResolvedInvocation) -> Result<i32> {
        let binding = registry.resolve(&resolved.script)?;
        self.command_for(binding).execute(&resolved.context)
    }
}
