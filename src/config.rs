//! # Installer Configuration
//!
//! Defines the data structures for the `.wildfly-modules.yaml` configuration
//! file and the logic for parsing it.
//!
//! ## Key Components
//!
//! - **`InstallConfig`**: the full configuration surface of an install run:
//!   the server install root, module naming (group prefix and slot policy),
//!   the write mode, the configuration files to patch, and the descriptor
//!   policy switches (extra dependencies, flattening, global registration).
//!
//! - **`WriteMode`**: governs whether prior on-disk state for a module (or
//!   the whole group subtree) is destroyed (`REPLACE`), cleared and rebuilt
//!   (`UPDATE`), or unioned with new data (`MERGE`, the default).
//!
//! Keys are camelCase in the file (`wildflyHome`, `writeMode`, ...), the
//! convention of the build tools this installer integrates with. All
//! parameters are read-only for the duration of a run.

use crate::error::{Error, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".wildfly-modules.yaml";

/// Write policy for module directories and the patched server configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum WriteMode {
    /// Destroy the whole group subtree first, then rebuild from the graph.
    Replace,
    /// Clear each visited module directory before writing it.
    Update,
    /// Union new data with whatever is already on disk.
    #[default]
    Merge,
}

/// A statically configured dependency entry, appended to the root module's
/// descriptor only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtraDependency {
    /// Dotted module name, e.g. `org.postgresql.jdbc`.
    pub name: String,
    /// Module slot; defaults to `main`.
    #[serde(default = "default_slot")]
    pub slot: String,
}

/// Full configuration for one install run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InstallConfig {
    /// Root of the target server installation. Required.
    pub wildfly_home: PathBuf,

    /// Naming namespace prepended to every module name and used as the
    /// top-level directory under `modules/`.
    #[serde(default = "default_group")]
    pub group: String,

    /// Fixed slot label, used when `coordinateSlots` is disabled.
    #[serde(default = "default_slot")]
    pub slot: String,

    /// When true (the default) the artifact version is used as the module
    /// slot; when false every module lands in the fixed `slot`.
    #[serde(default = "default_true")]
    pub coordinate_slots: bool,

    /// Write policy for module directories and the configuration patch.
    #[serde(default)]
    pub write_mode: WriteMode,

    /// Server configuration files to patch. Relative names resolve against
    /// `<wildflyHome>/standalone/configuration/`.
    #[serde(default = "default_config_files")]
    pub config_files: Vec<String>,

    /// Statically injected dependencies for the root module's descriptor.
    #[serde(default)]
    pub extra_dependencies: Vec<ExtraDependency>,

    /// Emit transitive resource paths instead of dependency declarations,
    /// producing a self-contained root descriptor with no inter-module
    /// edges.
    #[serde(default)]
    pub resources_instead_of_dependencies: bool,

    /// Extend flattening to every module in the tree instead of the root
    /// only.
    #[serde(default)]
    pub flatten_recursive: bool,

    /// Route extra dependencies through the same find-or-create keying as
    /// graph-derived ones, so duplicates collapse. When false extras are
    /// appended unconditionally.
    #[serde(default = "default_true")]
    pub dedupe_extra_dependencies: bool,

    /// Keep the root module registered in `global-modules`. When false a
    /// registration the patch just created is rolled back again, leaving
    /// the configuration untouched apart from formatting.
    #[serde(default = "default_true")]
    pub is_global: bool,
}

fn default_group() -> String {
    "global".to_string()
}

fn default_slot() -> String {
    "main".to_string()
}

fn default_true() -> bool {
    true
}

fn default_config_files() -> Vec<String> {
    vec!["standalone.xml".to_string()]
}

impl InstallConfig {
    /// Root of the module repository: `<wildflyHome>/modules`.
    pub fn modules_root(&self) -> PathBuf {
        self.wildfly_home.join("modules")
    }

    /// The group's subtree inside the module repository, the unit cleared
    /// by `WriteMode::Replace`.
    pub fn group_home(&self) -> PathBuf {
        self.modules_root().join(&self.group)
    }

    /// Absolute paths of the configuration files to patch.
    ///
    /// Relative names resolve against the server's standalone configuration
    /// directory; absolute entries are used as-is.
    pub fn config_file_paths(&self) -> Vec<PathBuf> {
        self.config_files
            .iter()
            .map(|name| {
                let path = Path::new(name);
                if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    self.wildfly_home
                        .join("standalone")
                        .join("configuration")
                        .join(name)
                }
            })
            .collect()
    }

    /// Whether the flatten policy applies to a module at the given tree
    /// depth (0 = root).
    pub fn flatten_applies(&self, depth: usize) -> bool {
        self.resources_instead_of_dependencies && (depth == 0 || self.flatten_recursive)
    }
}

/// Parse a configuration from a YAML string.
pub fn parse(yaml: &str) -> Result<InstallConfig> {
    serde_yaml::from_str(yaml).map_err(|e| {
        let message = e.to_string();
        let hint = if message.contains("wildflyHome") {
            Some("add 'wildflyHome:' pointing at the server install root".to_string())
        } else {
            None
        };
        Error::ConfigParse { message, hint }
    })
}

/// Load a configuration from a YAML file.
pub fn from_file(path: &Path) -> Result<InstallConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigParse {
        message: format!("failed to read {}: {}", path.display(), e),
        hint: None,
    })?;
    parse(&contents)
}
