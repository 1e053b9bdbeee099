//! Versioned CLI manifests
//!
//! A manifest is the declarative description of one release of the command
//! surface: which logical scripts exist, where they live relative to the
//! install root, and how each top-level command is routed. Swapping the
//! manifest swaps the whole table without touching routing logic.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Manifest version used when nothing else is configured
pub const DEFAULT_VERSION: &str = "v2";

const BUILTIN_MANIFESTS: &[(&str, &str)] = &[
    ("v1", include_str!("../manifests/v1.toml")),
    ("v2", include_str!("../manifests/v2.toml")),
];

/// Names of the manifests compiled into the binary
pub fn builtin_versions() -> Vec<&'static str> {
    BUILTIN_MANIFESTS.iter().map(|(v, _)| *v).collect()
}

/// Where a command's target script runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkDir {
    /// The CLI's own installation directory
    #[default]
    InstallRoot,
    /// The directory the user invoked `isle` from
    Caller,
}

/// One routing table entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,

    #[serde(default)]
    pub summary: String,

    /// Namespaces this command moved under; non-empty means it may not be run bare
    #[serde(default)]
    pub namespaces: Vec<String>,

    #[serde(default)]
    pub requires_docker: bool,

    /// Canonical command line this deprecated alias stands for
    #[serde(default)]
    pub legacy_of: Option<String>,

    /// Logical script name, defaults to the command name
    #[serde(default)]
    pub script: Option<String>,

    /// Silent alternate spellings
    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default)]
    pub workdir: WorkDir,

    /// Subcommands that always run from the caller's directory
    #[serde(default)]
    pub caller_dir_subcommands: Vec<String>,

    /// Scripts selectable by subcommand (`isle run <project>`)
    #[serde(default)]
    pub projects: Vec<String>,
}

impl CommandSpec {
    /// Logical script this command dispatches to
    pub fn script_name(&self) -> &str {
        self.script.as_deref().unwrap_or(&self.name)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    pub fn requires_namespace(&self) -> bool {
        !self.namespaces.is_empty()
    }

    pub fn is_legacy(&self) -> bool {
        self.legacy_of.is_some()
    }

    /// Whether invoking this entry ends up spawning its own script
    pub fn is_dispatchable(&self) -> bool {
        !self.requires_namespace() && !self.is_legacy()
    }

    /// Tokens of the canonical form for a legacy alias
    pub fn canonical_tokens(&self) -> Option<Vec<&str>> {
        self.legacy_of
            .as_deref()
            .map(|line| line.split_whitespace().collect())
    }
}

/// A complete, versioned command surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliManifest {
    pub version: String,

    /// Logical script name to path relative to the install root
    #[serde(default)]
    pub scripts: BTreeMap<String, PathBuf>,

    #[serde(default, rename = "command")]
    pub commands: Vec<CommandSpec>,
}

impl CliManifest {
    /// Load one of the manifests compiled into the binary
    pub fn builtin(version: &str) -> Result<Self> {
        let (_, source) = BUILTIN_MANIFESTS
            .iter()
            .find(|(v, _)| *v == version)
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "unknown manifest version '{}' (available: {})",
                    version,
                    builtin_versions().join(", ")
                ))
            })?;
        Self::from_toml(source)
    }

    /// Load a manifest from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading manifest from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and verify a manifest
    pub fn from_toml(source: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(source)?;
        manifest.verify()?;
        Ok(manifest)
    }

    /// Find the entry for a command name or alias
    pub fn find(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.iter().find(|c| c.matches(name))
    }

    /// Check the table's internal consistency
    ///
    /// Every script a dispatchable command can reach must be registered,
    /// names and aliases must be unique, and legacy aliases must point at a
    /// command that can actually run.
    pub fn verify(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spec in &self.commands {
            for name in std::iter::once(&spec.name).chain(spec.aliases.iter()) {
                if !seen.insert(name.as_str()) {
                    return Err(Error::InvalidConfig(format!(
                        "manifest {}: command name '{}' is defined twice",
                        self.version, name
                    )));
                }
            }
        }

        for spec in &self.commands {
            if let Some(tokens) = spec.canonical_tokens() {
                let target = tokens.first().ok_or_else(|| {
                    Error::InvalidConfig(format!(
                        "manifest {}: '{}' has an empty legacy_of",
                        self.version, spec.name
                    ))
                })?;
                match self.find(target) {
                    Some(canonical) if canonical.is_dispatchable() => {}
                    _ => {
                        return Err(Error::InvalidConfig(format!(
                            "manifest {}: '{}' is an alias of '{}', which cannot be dispatched",
                            self.version, spec.name, target
                        )))
                    }
                }
                continue;
            }

            if !spec.is_dispatchable() {
                continue;
            }

            let reachable = std::iter::once(spec.script_name())
                .chain(spec.projects.iter().map(String::as_str));
            for script in reachable {
                if !self.scripts.contains_key(script) {
                    return Err(Error::InvalidConfig(format!(
                        "manifest {}: command '{}' refers to unregistered script '{}'",
                        self.version, spec.name, script
                    )));
                }
            }
        }

        Ok(())
    }
}
