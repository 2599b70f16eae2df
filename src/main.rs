//! # WildFly Modules CLI
//!
//! Binary entry point for the `wildfly-modules` command-line tool.
//!
//! Its responsibilities are parsing command-line arguments with `clap`,
//! initializing logging, dispatching to the selected command, and
//! translating top-level errors into user-facing output. The install logic
//! itself lives in the library crate, keeping the binary a thin wrapper.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
