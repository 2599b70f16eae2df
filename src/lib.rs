//! # WildFly Modules Library
//!
//! This library converts a resolved project dependency graph into an
//! on-disk module repository for an isolated-classloading application
//! server (WildFly / JBoss Modules), then registers the resulting top-level
//! module in the server's shared configuration. It backs the
//! `wildfly-modules` command-line tool but is usable directly by any build
//! integration that can hand it a dependency tree.
//!
//! ## Core Concepts
//!
//! - **Graph input (`graph`)**: the external boundary. Artifact
//!   coordinates with resolved files, arranged as a dependency tree, plus
//!   the `ArtifactResolver` trait for turning coordinates into files.
//! - **Module tree building (`module`)**: the depth-first walk producing
//!   one module per distinct coordinate: naming, slot selection, home
//!   directory resolution under the configured write mode, artifact
//!   placement.
//! - **Descriptors (`descriptor`)**: generation and merging of each
//!   module's `module.xml`.
//! - **Idempotent XML mutation (`xml`)**: the find-or-create subtree
//!   primitive shared by the descriptor writer and the configuration
//!   patcher.
//! - **Configuration patching (`patcher`)**: registration of the root
//!   module in `profile/subsystem(ee)/global-modules`.
//! - **Run results (`report`)**: created modules, written paths, and
//!   warnings returned as a value instead of logged-and-forgotten state.
//!
//! ## Execution Flow
//!
//! [`installer::install`] checks the environment, clears the group subtree
//! under `REPLACE`, builds the module tree, and patches each configured
//! server configuration file, returning an [`report::InstallReport`].
//!
//! ## Quick Example
//!
//! ```no_run
//! use wildfly_modules::{config, graph, installer};
//! use wildfly_modules::graph::FileResolver;
//!
//! let config = config::parse("wildflyHome: /opt/wildfly").unwrap();
//! let root = graph::from_file("dependency-graph.yaml".as_ref()).unwrap();
//! let report = installer::install(&config, &root, &FileResolver, false).unwrap();
//! println!("installed {} modules", report.modules.len());
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod graph;
pub mod installer;
pub mod module;
pub mod patcher;
pub mod report;
pub mod xml;
