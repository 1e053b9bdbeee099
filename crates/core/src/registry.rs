//! Script registry
//!
//! Maps logical script names to absolute paths under the install root.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::manifest::CliManifest;

/// A logical script name bound to its location on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBinding {
    pub logical_name: String,
    pub target_path: PathBuf,
}

/// Immutable name-to-path table built once at startup
#[derive(Debug, Clone)]
pub struct ScriptRegistry {
    version: String,
    bindings: BTreeMap<String, ScriptBinding>,
}

impl ScriptRegistry {
    /// Bind every script declared in the manifest under `install_root`
    pub fn from_manifest(manifest: &CliManifest, install_root: &Path) -> Self {
        let bindings = manifest
            .scripts
            .iter()
            .map(|(name, rel)| {
                let binding = ScriptBinding {
                    logical_name: name.clone(),
                    target_path: install_root.join(rel),
                };
                (name.clone(), binding)
            })
            .collect();

        Self {
            version: manifest.version.clone(),
            bindings,
        }
    }

    /// Manifest version the table was built from
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn resolve(&self, logical_name: &str) -> Result<&ScriptBinding> {
        self.bindings
            .get(logical_name)
            .ok_or_else(|| Error::ScriptNotFound(logical_name.to_string()))
    }

    pub fn bindings(&self) -> impl Iterator<Item = &ScriptBinding> {
        self.bindings.values()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
