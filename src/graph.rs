//! # Dependency Graph Input Boundary
//!
//! The resolved dependency graph is produced by the host build tool, not by
//! this crate. It arrives in two narrow forms:
//!
//! - a **graph manifest**: a YAML document describing the root
//!   [`DependencyNode`] with its [`ArtifactCoordinate`] and children,
//!   standing in for the host tool's `buildGraph(project)`;
//! - an [`ArtifactResolver`]: the service turning a coordinate into a file
//!   on disk, standing in for the host tool's repository system. Resolution
//!   may block on I/O and its failure aborts the whole install.
//!
//! The same coordinate can appear under multiple parents (a DAG collapsed
//! into a tree); no node identity sharing is assumed.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Maven-style artifact coordinate plus the resolved artifact file.
///
/// `module_name` carries the automatic module name the resolution service
/// extracted from the artifact's own metadata, when one exists; it takes
/// precedence over `groupId.artifactId` naming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactCoordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    /// Resolved artifact file, typically inside the local repository.
    pub file: PathBuf,
    /// Module name embedded in the artifact's metadata, if any.
    #[serde(default)]
    pub module_name: Option<String>,
}

impl ArtifactCoordinate {
    /// Stable key identifying this coordinate within one run.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.group_id, self.artifact_id, self.version
        )
    }
}

/// One node of the resolved dependency tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyNode {
    #[serde(flatten)]
    pub coordinate: ArtifactCoordinate,
    /// Ordered child nodes.
    #[serde(default)]
    pub dependencies: Vec<DependencyNode>,
}

/// Resolves an artifact coordinate to a file on disk.
///
/// Provided by the host build tool and treated as a black box that may
/// raise resolution errors.
pub trait ArtifactResolver {
    fn resolve(&self, coordinate: &ArtifactCoordinate) -> Result<PathBuf>;
}

/// Resolver for manifests whose coordinates already carry resolved file
/// paths: verifies the file exists and hands it back.
#[derive(Debug, Default)]
pub struct FileResolver;

impl ArtifactResolver for FileResolver {
    fn resolve(&self, coordinate: &ArtifactCoordinate) -> Result<PathBuf> {
        if coordinate.file.is_file() {
            Ok(coordinate.file.clone())
        } else {
            Err(Error::Resolution {
                coordinate: coordinate.to_string(),
                message: format!("artifact file not found: {}", coordinate.file.display()),
            })
        }
    }
}

/// Parse a graph manifest from a YAML string.
pub fn parse(yaml: &str) -> Result<DependencyNode> {
    serde_yaml::from_str(yaml).map_err(|e| Error::GraphParse {
        message: e.to_string(),
    })
}

/// Load a graph manifest from a YAML file.
pub fn from_file(path: &Path) -> Result<DependencyNode> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::GraphParse {
        message: format!("failed to read {}: {}", path.display(), e),
    })?;
    parse(&contents)
}
