//! Command routing
//!
//! Turns `isle <command> [subcommand] [args...]` into a resolved invocation:
//! which script runs, with which arguments, from which directory. The table
//! comes from the manifest; this module only interprets it.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::manifest::{CliManifest, CommandSpec, WorkDir};

/// Words that show usage instead of running anything
pub const HELP_KEYWORDS: &[&str] = &["help", "--help", "-h"];

/// Everything the target needs to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub command: String,
    pub subcommand: Option<String>,
    pub extra_args: Vec<String>,
    pub working_directory: PathBuf,
}

impl InvocationContext {
    /// `[subcommand, ...extra_args]` with empty tokens dropped
    pub fn argument_vector(&self) -> Vec<String> {
        self.subcommand
            .iter()
            .chain(self.extra_args.iter())
            .filter(|arg| !arg.is_empty())
            .cloned()
            .collect()
    }

    /// Space-joined form of the argument vector, for log lines
    pub fn argument_string(&self) -> String {
        self.argument_vector().join(" ")
    }
}

/// Advisory notice for a deprecated spelling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deprecation {
    pub used: String,
    pub canonical: String,
}

impl fmt::Display for Deprecation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Note: 'isle {}' is now 'isle {}'", self.used, self.canonical)
    }
}

/// A command ready to hand to the executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInvocation {
    /// Logical name of the script to run
    pub script: String,
    pub requires_docker: bool,
    pub context: InvocationContext,
    pub deprecation: Option<Deprecation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Help,
    Invoke(ResolvedInvocation),
}

/// Resolves parsed CLI input against a manifest's routing table
pub struct CommandRouter<'a> {
    manifest: &'a CliManifest,
    install_root: PathBuf,
    caller_dir: PathBuf,
}

impl<'a> CommandRouter<'a> {
    pub fn new(manifest: &'a CliManifest, install_root: &Path, caller_dir: &Path) -> Self {
        Self {
            manifest,
            install_root: install_root.to_path_buf(),
            caller_dir: caller_dir.to_path_buf(),
        }
    }

    pub fn is_help(command: Option<&str>) -> bool {
        command.map_or(true, |c| HELP_KEYWORDS.contains(&c))
    }

    /// Whether running `command` needs the Docker gate
    ///
    /// Legacy aliases inherit the requirement of their canonical command.
    pub fn requires_docker(&self, command: Option<&str>) -> bool {
        let Some(spec) = command.and_then(|c| self.manifest.find(c)) else {
            return false;
        };
        if spec.requires_namespace() {
            return false;
        }
        let canonical = spec
            .canonical_tokens()
            .and_then(|tokens| tokens.first().and_then(|t| self.manifest.find(t)));
        spec.requires_docker || canonical.is_some_and(|c| c.requires_docker)
    }

    pub fn route(
        &self,
        command: Option<&str>,
        subcommand: Option<&str>,
        extra_args: &[String],
    ) -> Result<Route> {
        let command = match command {
            Some(c) if !Self::is_help(Some(c)) => c,
            _ => return Ok(Route::Help),
        };

        let spec = self
            .manifest
            .find(command)
            .ok_or_else(|| Error::UnknownCommand(command.to_string()))?;

        if spec.requires_namespace() {
            return Err(Error::NamespaceRequired {
                command: command.to_string(),
                namespaces: spec.namespaces.clone(),
            });
        }

        if let Some(tokens) = spec.canonical_tokens() {
            return self.route_legacy(command, spec, &tokens, subcommand, extra_args);
        }

        self.resolve(spec, subcommand, extra_args).map(Route::Invoke)
    }

    fn route_legacy(
        &self,
        used: &str,
        spec: &CommandSpec,
        tokens: &[&str],
        subcommand: Option<&str>,
        extra_args: &[String],
    ) -> Result<Route> {
        let deprecation = Deprecation {
            used: used.to_string(),
            canonical: tokens.join(" "),
        };
        debug!("{}", deprecation);

        // Re-read the line as if the user had typed the canonical form
        let mut argv: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        argv.extend(subcommand.map(str::to_string));
        argv.extend(extra_args.iter().cloned());

        let target = argv
            .first()
            .and_then(|name| self.manifest.find(name))
            .filter(|c| c.is_dispatchable())
            .ok_or_else(|| {
                Error::InvalidConfig(format!("'{}' has no dispatchable canonical form", spec.name))
            })?;

        let rest = argv.get(2..).unwrap_or(&[]);
        let mut resolved = self.resolve(target, argv.get(1).map(String::as_str), rest)?;
        resolved.requires_docker |= spec.requires_docker;
        resolved.deprecation = Some(deprecation);
        Ok(Route::Invoke(resolved))
    }

    fn resolve(
        &self,
        spec: &CommandSpec,
        subcommand: Option<&str>,
        extra_args: &[String],
    ) -> Result<ResolvedInvocation> {
        let subcommand = subcommand.filter(|s| !s.is_empty());

        if let Some(project) = subcommand.filter(|_| !spec.projects.is_empty()) {
            return self.resolve_project(spec, project, extra_args);
        }

        let caller_override = subcommand
            .map(|s| spec.caller_dir_subcommands.iter().any(|c| c == s))
            .unwrap_or(false);
        let workdir = if caller_override { WorkDir::Caller } else { spec.workdir };

        let resolved = ResolvedInvocation {
            script: spec.script_name().to_string(),
            requires_docker: spec.requires_docker,
            context: InvocationContext {
                command: spec.name.clone(),
                subcommand: subcommand.map(str::to_string),
                extra_args: extra_args.to_vec(),
                working_directory: self.directory(workdir),
            },
            deprecation: None,
        };
        debug!(
            command = %spec.name,
            script = %resolved.script,
            cwd = %resolved.context.working_directory.display(),
            "command resolved"
        );
        Ok(resolved)
    }

    /// `isle run <project> [args]` runs any registered script by name
    ///
    /// The command's `projects` list is only the hint shown when the name is
    /// not registered.
    fn resolve_project(
        &self,
        spec: &CommandSpec,
        project: &str,
        extra_args: &[String],
    ) -> Result<ResolvedInvocation> {
        if !self.manifest.scripts.contains_key(project) {
            return Err(Error::UnknownProject {
                project: project.to_string(),
                available: spec.projects.clone(),
            });
        }

        let mut args = extra_args.iter().filter(|a| !a.is_empty()).cloned();
        Ok(ResolvedInvocation {
            script: project.to_string(),
            requires_docker: spec.requires_docker,
            context: InvocationContext {
                command: spec.name.clone(),
                subcommand: args.next(),
                extra_args: args.collect(),
                working_directory: self.directory(WorkDir::InstallRoot),
            },
            deprecation: None,
        })
    }

    fn directory(&self, workdir: WorkDir) -> PathBuf {
        match workdir {
            WorkDir::InstallRoot => self.install_root.clone(),
            WorkDir::Caller => self.caller_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "/opt/isle";
    const CWD: &str = "/home/dev/my-mesh-app";

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn route(manifest: &CliManifest, argv: &[&str]) -> Result<Route> {
        let router = CommandRouter::new(manifest, Path::new(ROOT), Path::new(CWD));
        let rest = args(argv.get(2..).unwrap_or(&[]));
        router.route(argv.first().copied(), argv.get(1).copied(), &rest)
    }

    fn invoke(manifest: &CliManifest, argv: &[&str]) -> ResolvedInvocation {
        match route(manifest, argv).unwrap() {
            Route::Invoke(resolved) => resolved,
            Route::Help => panic!("expected an invocation for {:?}", argv),
        }
    }

    #[test]
    fn test_help_routes() {
        let manifest = CliManifest::builtin("v2").unwrap();
        assert_eq!(route(&manifest, &[]).unwrap(), Route::Help);
        assert_eq!(route(&manifest, &["help"]).unwrap(), Route::Help);
        assert_eq!(route(&manifest, &["--help"]).unwrap(), Route::Help);
    }

    #[test]
    fn test_namespaced_command() {
        let manifest = CliManifest::builtin("v2").unwrap();
        let resolved = invoke(&manifest, &["router", "status", "--verbose"]);

        assert_eq!(resolved.script, "router");
        assert!(resolved.requires_docker);
        assert_eq!(resolved.context.argument_vector(), args(&["status", "--verbose"]));
        assert_eq!(resolved.context.working_directory, PathBuf::from(ROOT));
    }

    #[test]
    fn test_core_app_commands_run_in_caller_dir() {
        let manifest = CliManifest::builtin("v2").unwrap();
        for sub in ["up", "down", "logs", "ps", "prune"] {
            let resolved = invoke(&manifest, &["app", sub]);
            assert_eq!(resolved.context.working_directory, PathBuf::from(CWD), "app {}", sub);
        }

        let ssl = invoke(&manifest, &["app", "ssl", "generate"]);
        assert_eq!(ssl.context.working_directory, PathBuf::from(ROOT));
    }

    #[test]
    fn test_bare_legacy_command_requires_namespace() {
        let manifest = CliManifest::builtin("v2").unwrap();
        match route(&manifest, &["up"]) {
            Err(Error::NamespaceRequired { command, namespaces }) => {
                assert_eq!(command, "up");
                assert!(namespaces.contains(&"app".to_string()));
            }
            other => panic!("unexpected route: {:?}", other),
        }

        // Aliases report the spelling the user typed
        match route(&manifest, &["proxy", "up"]) {
            Err(Error::NamespaceRequired { command, namespaces }) => {
                assert_eq!(command, "proxy");
                assert_eq!(namespaces, vec!["agent".to_string()]);
            }
            other => panic!("unexpected route: {:?}", other),
        }
    }

    #[test]
    fn test_every_legacy_bare_command_is_intercepted() {
        let manifest = CliManifest::builtin("v2").unwrap();
        let legacy = [
            "init", "up", "down", "logs", "ps", "prune", "scaffold", "config", "discover", "ssl",
            "mesh-proxy", "proxy", "embed-jinja", "jinja", "mdns", "sample",
        ];
        for name in legacy {
            assert!(
                matches!(route(&manifest, &[name]), Err(Error::NamespaceRequired { .. })),
                "{} should require a namespace",
                name
            );
        }
    }

    #[test]
    fn test_deprecated_alias_resolves_to_canonical() {
        let manifest = CliManifest::builtin("v1").unwrap();
        let legacy = invoke(&manifest, &["localhost-mdns", "foo", "--bar"]);
        let canonical = invoke(&manifest, &["sample", "localhost-mdns", "foo", "--bar"]);

        let notice = legacy.deprecation.clone().unwrap();
        assert_eq!(
            notice.to_string(),
            "Note: 'isle localhost-mdns' is now 'isle sample localhost-mdns'"
        );
        assert_eq!(legacy.script, canonical.script);
        assert_eq!(legacy.context, canonical.context);
        assert_eq!(legacy.context.argument_vector(), args(&["localhost-mdns", "foo", "--bar"]));
    }

    #[test]
    fn test_deprecated_alias_into_namespace() {
        let manifest = CliManifest::builtin("v2").unwrap();
        let resolved = invoke(&manifest, &["localhost-mdns", "up"]);

        assert_eq!(resolved.script, "app");
        assert!(resolved.deprecation.is_some());
        assert_eq!(resolved.context.argument_vector(), args(&["sample", "localhost-mdns", "up"]));
    }

    #[test]
    fn test_unknown_command() {
        let manifest = CliManifest::builtin("v2").unwrap();
        assert!(matches!(
            route(&manifest, &["teleport"]),
            Err(Error::UnknownCommand(c)) if c == "teleport"
        ));
        // Flat v1 names that were never migrated are unknown in v2
        assert!(matches!(route(&manifest, &["test-cli"]), Err(Error::UnknownCommand(_))));
    }

    #[test]
    fn test_v1_silent_alias() {
        let manifest = CliManifest::builtin("v1").unwrap();
        let resolved = invoke(&manifest, &["jinja", "up"]);
        assert_eq!(resolved.script, "embed-jinja");
        assert!(resolved.deprecation.is_none());
        assert_eq!(resolved.context.working_directory, PathBuf::from(ROOT));
    }

    #[test]
    fn test_project_dispatch() {
        let manifest = CliManifest::builtin("v1").unwrap();

        let resolved = invoke(&manifest, &["run", "mesh-proxy", "up", "-d"]);
        assert_eq!(resolved.script, "mesh-proxy");
        assert_eq!(resolved.context.argument_vector(), args(&["up", "-d"]));
        assert_eq!(resolved.context.working_directory, PathBuf::from(ROOT));

        let bare = invoke(&manifest, &["run"]);
        assert_eq!(bare.script, "run");
        assert_eq!(bare.context.working_directory, PathBuf::from(CWD));

        // Any registered script is a valid project, not just the hinted ones
        let mdns = invoke(&manifest, &["run", "mdns", "install"]);
        assert_eq!(mdns.script, "mdns");
        assert_eq!(mdns.context.argument_vector(), args(&["install"]));
        assert_eq!(invoke(&manifest, &["run", "test-cli"]).script, "test-cli");

        match route(&manifest, &["run", "nope"]) {
            Err(Error::UnknownProject { project, available }) => {
                assert_eq!(project, "nope");
                assert_eq!(available, manifest.find("run").unwrap().projects);
            }
            other => panic!("unexpected route: {:?}", other),
        }
    }

    #[test]
    fn test_requires_docker() {
        let v2 = CliManifest::builtin("v2").unwrap();
        let router = CommandRouter::new(&v2, Path::new(ROOT), Path::new(CWD));
        assert!(router.requires_docker(Some("app")));
        assert!(router.requires_docker(Some("localhost-mdns")));
        assert!(!router.requires_docker(Some("create")));
        assert!(!router.requires_docker(Some("up")));
        assert!(!router.requires_docker(Some("help")));
        assert!(!router.requires_docker(None));
    }

    #[test]
    fn test_empty_tokens_dropped() {
        let manifest = CliManifest::builtin("v2").unwrap();
        let resolved = invoke(&manifest, &["install", "", "", "mdns", ""]);
        assert_eq!(resolved.context.subcommand, None);
        assert_eq!(resolved.context.argument_vector(), args(&["mdns"]));
    }

    #[test]
    fn test_argument_string_round_trip() {
        let samples: &[(&str, &[&str])] = &[
            ("up", &["-d", "--build"]),
            ("", &["logs", "", "web"]),
            ("status", &[]),
        ];
        for (sub, rest) in samples {
            let context = InvocationContext {
                command: "app".into(),
                subcommand: Some(sub.to_string()).filter(|s| !s.is_empty()),
                extra_args: args(rest),
                working_directory: PathBuf::from(ROOT),
            };
            let tokens: Vec<String> = context
                .argument_string()
                .split_whitespace()
                .map(str::to_string)
                .collect();
            assert_eq!(tokens, context.argument_vector());
        }
    }
}
