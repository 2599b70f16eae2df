//! Validate command implementation
//!
//! Checks the environment and inputs without writing anything: the
//! configuration parses, the graph manifest parses, the server install
//! root exists, every target configuration file is present, and each
//! artifact in the graph resolves to a file. Also lists the global modules
//! currently registered in each configuration file.

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

use wildfly_modules::config::{self, DEFAULT_CONFIG_FILE};
use wildfly_modules::graph::{self, ArtifactResolver, DependencyNode, FileResolver};
use wildfly_modules::{installer, patcher};

use super::install::DEFAULT_GRAPH_FILE;

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the installer configuration file
    #[arg(short, long, value_name = "PATH", env = "WILDFLY_MODULES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the resolved dependency graph manifest
    #[arg(short, long, value_name = "PATH", env = "WILDFLY_MODULES_GRAPH")]
    pub graph: Option<PathBuf>,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the validate command
pub fn execute(args: ValidateArgs) -> Result<()> {
    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if !config_path.exists() {
        anyhow::bail!("Configuration file not found: {}", config_path.display());
    }
    let config = config::from_file(&config_path)?;

    let graph_path = args
        .graph
        .unwrap_or_else(|| PathBuf::from(DEFAULT_GRAPH_FILE));
    if !graph_path.exists() {
        anyhow::bail!("Graph manifest not found: {}", graph_path.display());
    }
    let root = graph::from_file(&graph_path)?;

    installer::check_environment(&config)?;
    resolve_all(&root)?;

    if !args.quiet {
        println!(
            "✅ {}",
            style(format!(
                "Configuration, environment, and {} graph nodes are valid",
                node_count(&root)
            ))
            .green()
        );
        for path in config.config_file_paths() {
            let registrations = patcher::registered_modules(&path)?;
            println!("   {}:", path.display());
            if registrations.is_empty() {
                println!("      no global modules registered");
            }
            for registration in registrations {
                println!("      {} (slot {})", registration.name, registration.slot);
            }
        }
    }

    Ok(())
}

fn resolve_all(node: &DependencyNode) -> Result<()> {
    FileResolver.resolve(&node.coordinate)?;
    for child in &node.dependencies {
        resolve_all(child)?;
    }
    Ok(())
}

fn node_count(node: &DependencyNode) -> usize {
    1 + node.dependencies.iter().map(node_count).sum::<usize>()
}
