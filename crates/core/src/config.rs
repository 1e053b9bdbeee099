//! CLI configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::manifest::{CliManifest, DEFAULT_VERSION};

/// Isle configuration, read from `~/.isle/config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IsleConfig {
    /// Installation directory the manifest's script paths are relative to
    pub install_root: Option<PathBuf>,

    /// Built-in manifest version
    pub manifest: String,

    /// Manifest file that replaces the built-in table
    pub manifest_file: Option<PathBuf>,

    /// Program the scripts are run with; empty runs them directly
    pub interpreter: String,

    /// Container runtime client used for the daemon probe
    pub docker_binary: String,

    /// Group that grants access to the Docker socket
    pub docker_group: String,
}

impl Default for IsleConfig {
    fn default() -> Self {
        Self {
            install_root: None,
            manifest: DEFAULT_VERSION.to_string(),
            manifest_file: None,
            interpreter: "bash".to_string(),
            docker_binary: "docker".to_string(),
            docker_group: "docker".to_string(),
        }
    }
}

impl IsleConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The manifest this configuration selects
    pub fn manifest(&self) -> Result<CliManifest> {
        match &self.manifest_file {
            Some(path) => CliManifest::load(path),
            None => CliManifest::builtin(&self.manifest),
        }
    }

    /// Absolute install root
    ///
    /// The binary is installed as `<root>/isle-cli/isle`, next to the
    /// `scripts/` directory, so the fallback is the parent of the directory
    /// holding the running executable.
    pub fn install_root(&self) -> Result<PathBuf> {
        let root = match &self.install_root {
            Some(root) => root.clone(),
            None => {
                let exe = std::env::current_exe()?;
                root_of_executable(&exe).ok_or_else(|| {
                    Error::InvalidConfig(format!("unexpected executable location: {}", exe.display()))
                })?
            }
        };

        if root.is_absolute() {
            Ok(root)
        } else {
            Ok(std::env::current_dir()?.join(root))
        }
    }

    pub fn interpreter(&self) -> Option<&str> {
        Some(self.interpreter.as_str()).filter(|i| !i.is_empty())
    }
}

/// `<root>/isle-cli/isle` → `<root>`
fn root_of_executable(exe: &Path) -> Option<PathBuf> {
    let exe_dir = exe.parent()?;
    Some(exe_dir.parent().unwrap_or(exe_dir).to_path_buf())
}

/// Default configuration directory
pub fn default_config_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".isle")
}

/// Default configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}
