//! Invocation pipeline
//!
//! validate scripts → Docker gate (when required) → route → execute. Each
//! stage is fail-fast; nothing is spawned unless every earlier stage passed.

use isle_core::{
    CliManifest, CommandRouter, DockerAccess, ExecutableValidator, IsleConfig, PermissionGate,
    ProcessExecutor, Result, Route, ScriptRegistry, SystemDocker,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::help;

/// Split raw arguments into command, subcommand and the rest
pub fn split_argv(argv: &[String]) -> (Option<&str>, Option<&str>, &[String]) {
    let command = argv.first().map(String::as_str);
    let subcommand = argv.get(1).map(String::as_str);
    let rest = argv.get(2..).unwrap_or(&[]);
    (command, subcommand, rest)
}

/// One configured dispatcher per process
pub struct Dispatcher<'a, A = SystemDocker> {
    manifest: &'a CliManifest,
    registry: ScriptRegistry,
    install_root: PathBuf,
    caller_dir: PathBuf,
    validator: ExecutableValidator,
    gate: PermissionGate<A>,
    executor: ProcessExecutor,
}

impl<'a> Dispatcher<'a, SystemDocker> {
    pub fn from_config(
        manifest: &'a CliManifest,
        config: &IsleConfig,
        install_root: &Path,
        caller_dir: &Path,
    ) -> Self {
        let gate = PermissionGate::new(
            SystemDocker::new(config.docker_binary.clone()),
            config.docker_group.clone(),
        );
        Self::new(
            manifest,
            install_root,
            caller_dir,
            gate,
            ProcessExecutor::new(config.interpreter()),
        )
    }
}

impl<'a, A: DockerAccess> Dispatcher<'a, A> {
    pub fn new(
        manifest: &'a CliManifest,
        install_root: &Path,
        caller_dir: &Path,
        gate: PermissionGate<A>,
        executor: ProcessExecutor,
    ) -> Self {
        Self {
            manifest,
            registry: ScriptRegistry::from_manifest(manifest, install_root),
            install_root: install_root.to_path_buf(),
            caller_dir: caller_dir.to_path_buf(),
            validator: ExecutableValidator::new(),
            gate,
            executor,
        }
    }

    /// Run one invocation and return the process exit code
    ///
    /// Help text and deprecation notices go to `out`; the child writes to the
    /// inherited streams directly.
    pub fn dispatch<W: Write>(&self, argv: &[String], out: &mut W) -> Result<i32> {
        let (command, subcommand, rest) = split_argv(argv);
        debug!(
            manifest = %self.registry.version(),
            scripts = self.registry.len(),
            ?command,
            ?subcommand,
            "dispatching"
        );
        if self.registry.is_empty() {
            warn!(manifest = %self.registry.version(), "manifest registers no scripts");
        }

        let report = self
            .validator
            .validate_all(self.registry.bindings())
            .into_result()?;
        debug!(checked = report.checked, "all scripts executable");

        let router = CommandRouter::new(self.manifest, &self.install_root, &self.caller_dir);

        if router.requires_docker(command) {
            let state = self.gate.check()?;
            debug!(?state, "docker access confirmed");
        }

        match router.route(command, subcommand, rest)? {
            Route::Help => {
                help::render(self.manifest, out)?;
                Ok(0)
            }
            Route::Invoke(resolved) => {
                if let Some(notice) = &resolved.deprecation {
                    writeln!(out, "{}", notice)?;
                    out.flush()?;
                }
                self.executor.run(&self.registry, &resolved)
            }
        }
    }
}
