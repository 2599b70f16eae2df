//! # Install Report
//!
//! The run result returned to the caller: which modules were materialized,
//! which paths were written, and any warnings collected along the way. The
//! core stays usable as a library because outcomes travel in this value
//! instead of a global logger or mutation of the host tool.

use std::path::PathBuf;

/// A module materialized (or, under dry-run, planned) by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledModule {
    /// Dotted module name including the group prefix.
    pub name: String,
    pub slot: String,
    /// The module's home directory inside the module repository.
    pub home: PathBuf,
    /// Tree level; 0 is the root module.
    pub depth: usize,
}

/// Result of one install run.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    /// Modules in the order they finished building (children before their
    /// parent, root last).
    pub modules: Vec<InstalledModule>,
    /// Files written: artifacts, descriptors, patched configurations.
    pub written: Vec<PathBuf>,
    /// Non-fatal observations surfaced to the caller.
    pub warnings: Vec<String>,
    /// Whether the run skipped all filesystem writes.
    pub dry_run: bool,
}

impl InstallReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    pub fn record_module(&mut self, module: InstalledModule) {
        self.modules.push(module);
    }

    pub fn record_write(&mut self, path: PathBuf) {
        self.written.push(path);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// The root module of the walk, if any module was built.
    pub fn root_module(&self) -> Option<&InstalledModule> {
        self.modules.iter().find(|m| m.depth == 0)
    }
}
