//! # Module Tree Builder
//!
//! Recursive conversion of the resolved dependency tree into the on-disk
//! module repository. Each node becomes one [`Module`]: its artifact is
//! resolved and copied into a deterministic home directory, its children
//! are built first, and its descriptor is written as the final step of
//! construction.
//!
//! The walk is single-threaded, synchronous, and depth-first; the first
//! failure anywhere aborts the whole install with no partial cleanup.
//! Coordinates already built this run are served from a memo map, so a
//! diamond in the graph costs one build per distinct coordinate while the
//! idempotent write path remains the safety net for anything staged
//! externally.

use crate::config::{InstallConfig, WriteMode};
use crate::descriptor;
use crate::error::{Error, Result};
use crate::graph::{ArtifactResolver, DependencyNode};
use crate::report::{InstallReport, InstalledModule};
use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A `(name, slot)` reference to a module, as used in dependency lists and
/// the global-modules registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRef {
    pub name: String,
    pub slot: String,
}

/// A module derived from one dependency node. Constructed once per distinct
/// coordinate and never mutated after construction completes.
#[derive(Debug, Clone)]
pub struct Module {
    /// Dotted identifier, prefixed by the configured group.
    pub name: String,
    pub slot: String,
    /// `modulesRoot / name.replace('.', '/') / slot`.
    pub home: PathBuf,
    /// Resource file names present in the home directory after the walk.
    pub resources: Vec<String>,
    /// Child modules as `(name, slot)` references.
    pub dependencies: Vec<ModuleRef>,
    /// Tree level, 0 = root.
    pub depth: usize,
}

/// Outcome of building one node, cached per coordinate key.
#[derive(Debug, Clone)]
struct BuiltModule {
    reference: ModuleRef,
    /// Artifact files of this module and its whole subtree, for flattening.
    artifacts: Vec<PathBuf>,
}

/// Walks the dependency tree and materializes modules.
pub struct ModuleTreeBuilder<'a> {
    config: &'a InstallConfig,
    resolver: &'a dyn ArtifactResolver,
    dry_run: bool,
    built: HashMap<String, BuiltModule>,
    report: InstallReport,
}

impl<'a> ModuleTreeBuilder<'a> {
    pub fn new(
        config: &'a InstallConfig,
        resolver: &'a dyn ArtifactResolver,
        dry_run: bool,
    ) -> Self {
        Self {
            config,
            resolver,
            dry_run,
            built: HashMap::new(),
            report: InstallReport::new(dry_run),
        }
    }

    /// Build the whole tree, returning the root module's reference.
    pub fn build_tree(&mut self, root: &DependencyNode) -> Result<ModuleRef> {
        let built = self.build(root, 0)?;
        Ok(built.reference)
    }

    /// The accumulated run result.
    pub fn into_report(self) -> InstallReport {
        self.report
    }

    fn build(&mut self, node: &DependencyNode, depth: usize) -> Result<BuiltModule> {
        let indent = "|   ".repeat(depth);
        let key = node.coordinate.key();
        info!("{}{}", indent, node.coordinate);

        if let Some(cached) = self.built.get(&key) {
            debug!("{}already installed this run, reusing", indent);
            return Ok(cached.clone());
        }

        let artifact = self.resolver.resolve(&node.coordinate)?;

        let name = self.module_name(node);
        info!("{}module name: {}", indent, name);
        let slot = self.module_slot(node);

        let home = self
            .config
            .modules_root()
            .join(name.replace('.', "/"))
            .join(&slot);
        info!("{}module home: {}", indent, home.display());

        if !self.dry_run {
            self.resolve_home(&home)?;
            self.copy_artifact(&artifact, &home)?;
        }
        if !artifact
            .file_name()
            .map(|n| n.to_string_lossy().ends_with(".jar"))
            .unwrap_or(false)
        {
            self.report.warn(format!(
                "artifact for {} is not a .jar and will not be listed as a resource-root: {}",
                node.coordinate,
                artifact.display()
            ));
        }

        if !node.dependencies.is_empty() {
            info!("{}dependencies:", indent);
        }
        let mut dependencies = Vec::new();
        let mut artifacts = vec![artifact.clone()];
        for child in &node.dependencies {
            let built = self.build(child, depth + 1)?;
            dependencies.push(built.reference.clone());
            artifacts.extend(built.artifacts);
        }

        let flattened = self.config.flatten_applies(depth);
        if flattened && !self.dry_run {
            // Back the self-contained descriptor with real files: the
            // subtree's artifacts are staged into this home too.
            for subtree_artifact in artifacts.iter().skip(1) {
                self.copy_artifact(subtree_artifact, &home)?;
            }
        }
        if flattened && depth == 0 && !self.config.extra_dependencies.is_empty() {
            self.report.warn(format!(
                "flattening suppressed {} extra dependencies on the root module",
                self.config.extra_dependencies.len()
            ));
        }

        let mut module = Module {
            name,
            slot,
            home: home.clone(),
            resources: Vec::new(),
            dependencies,
            depth,
        };

        if self.dry_run {
            module.resources = artifacts
                .iter()
                .take(if flattened { artifacts.len() } else { 1 })
                .filter_map(|a| a.file_name().map(|n| n.to_string_lossy().to_string()))
                .filter(|n| n.ends_with(".jar"))
                .collect();
        } else {
            let extras = if depth == 0 {
                &self.config.extra_dependencies[..]
            } else {
                &[][..]
            };
            module.resources = descriptor::write_descriptor(
                &module,
                self.config.write_mode,
                flattened,
                extras,
                self.config.dedupe_extra_dependencies,
            )?;
            self.report
                .record_write(home.join(descriptor::DESCRIPTOR_FILE));
        }

        let built = BuiltModule {
            reference: ModuleRef {
                name: module.name.clone(),
                slot: module.slot.clone(),
            },
            artifacts,
        };
        self.report.record_module(InstalledModule {
            name: module.name,
            slot: module.slot,
            home: module.home,
            depth,
        });
        self.built.insert(key, built.clone());
        Ok(built)
    }

    /// Module name: the embedded hint when present, else
    /// `groupId.artifactId`, prefixed by the configured group.
    fn module_name(&self, node: &DependencyNode) -> String {
        let base = node
            .coordinate
            .module_name
            .clone()
            .unwrap_or_else(|| {
                format!(
                    "{}.{}",
                    node.coordinate.group_id, node.coordinate.artifact_id
                )
            });
        if self.config.group.is_empty() {
            base
        } else {
            format!("{}.{}", self.config.group, base)
        }
    }

    /// Module slot: the artifact version under coordinate-based slots, else
    /// the fixed configured label.
    fn module_slot(&self, node: &DependencyNode) -> String {
        if self.config.coordinate_slots {
            node.coordinate.version.clone()
        } else {
            self.config.slot.clone()
        }
    }

    /// Create the home directory, clearing previous contents first under
    /// `UPDATE` and `REPLACE`.
    fn resolve_home(&self, home: &Path) -> Result<()> {
        if !home.exists() {
            fs::create_dir_all(home).map_err(|e| Error::Filesystem {
                message: format!("failed to create {}: {}", home.display(), e),
            })?;
        } else if matches!(
            self.config.write_mode,
            WriteMode::Update | WriteMode::Replace
        ) {
            clear_directory(home)?;
        }
        Ok(())
    }

    fn copy_artifact(&mut self, artifact: &Path, home: &Path) -> Result<()> {
        let file_name = artifact.file_name().ok_or_else(|| Error::Filesystem {
            message: format!("artifact has no file name: {}", artifact.display()),
        })?;
        let target = home.join(file_name);
        fs::copy(artifact, &target).map_err(|e| Error::Filesystem {
            message: format!(
                "failed to copy {} to {}: {}",
                artifact.display(),
                target.display(),
                e
            ),
        })?;
        self.report.record_write(target);
        Ok(())
    }
}

/// Remove everything inside `directory` while keeping the directory itself.
pub fn clear_directory(directory: &Path) -> Result<()> {
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path).map_err(|e| Error::Filesystem {
                message: format!("failed to remove {}: {}", path.display(), e),
            })?;
        } else {
            fs::remove_file(&path).map_err(|e| Error::Filesystem {
                message: format!("failed to remove {}: {}", path.display(), e),
            })?;
        }
    }
    Ok(())
}
