//! Install command implementation
//!
//! The install command executes the full pipeline: environment check,
//! group subtree reset under REPLACE, depth-first module tree
//! materialization, and the global-modules registration patch on every
//! configured server configuration file.

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

use wildfly_modules::config::{self, WriteMode, DEFAULT_CONFIG_FILE};
use wildfly_modules::graph::{self, FileResolver};
use wildfly_modules::installer;

/// Default graph manifest file name, as emitted by the host build tool.
pub const DEFAULT_GRAPH_FILE: &str = "dependency-graph.yaml";

/// Arguments for the install command
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Path to the installer configuration file
    #[arg(short, long, value_name = "PATH", env = "WILDFLY_MODULES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the resolved dependency graph manifest
    #[arg(short, long, value_name = "PATH", env = "WILDFLY_MODULES_GRAPH")]
    pub graph: Option<PathBuf>,

    /// Override the configured write mode
    #[arg(long, value_name = "MODE")]
    pub write_mode: Option<WriteMode>,

    /// Show what would be done without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the install command
pub fn execute(args: InstallArgs) -> Result<()> {
    use std::time::Instant;

    let start_time = Instant::now();

    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if !config_path.exists() {
        anyhow::bail!("Configuration file not found: {}", config_path.display());
    }

    let graph_path = args
        .graph
        .unwrap_or_else(|| PathBuf::from(DEFAULT_GRAPH_FILE));
    if !graph_path.exists() {
        anyhow::bail!("Graph manifest not found: {}", graph_path.display());
    }

    if !args.quiet {
        println!("🔧 WildFly Modules Install");
        println!();
        if args.dry_run {
            println!("🔎 DRY RUN MODE - No changes will be made");
            println!();
        }
    }

    let mut config = config::from_file(&config_path)?;
    if let Some(write_mode) = args.write_mode {
        config.write_mode = write_mode;
    }
    let root = graph::from_file(&graph_path)?;

    match installer::install(&config, &root, &FileResolver, args.dry_run) {
        Ok(report) => {
            let duration = start_time.elapsed();

            if !args.quiet {
                println!(
                    "✅ {} in {:.2}s",
                    style(format!("Installed {} modules", report.modules.len())).green(),
                    duration.as_secs_f64()
                );
                if let Some(root_module) = report.root_module() {
                    println!(
                        "   root module: {} (slot {})",
                        root_module.name, root_module.slot
                    );
                }
                if !report.dry_run && !report.written.is_empty() {
                    println!("   {} files written", report.written.len());
                }
                for warning in &report.warnings {
                    println!("⚠️  {}", style(warning).yellow());
                }
            }

            Ok(())
        }
        Err(e) => {
            if !args.quiet {
                println!("❌ Install failed");
                println!();
            }
            Err(e.into())
        }
    }
}
