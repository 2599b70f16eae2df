//! # Error Handling
//!
//! Centralized error handling for the `wildfly-modules` library, following
//! the taxonomy of the install pipeline: environment errors are raised before
//! any mutation, resolution errors abort the tree walk at the failing node,
//! and I/O or XML errors propagate immediately with no retry and no rollback
//! of modules already written.
//!
//! There is deliberately no recovery tier: every error is fatal to the run
//! and surfaced with its message, favoring visible aborting failures over
//! silent partial state.

use thiserror::Error;

/// Main error type for wildfly-modules operations
#[derive(Error, Debug)]
pub enum Error {
    /// The target server installation is missing, not a directory, or a
    /// configuration file that must be patched does not exist.
    ///
    /// Raised before any module directory or configuration file is touched.
    #[error("Environment error: {message}")]
    Environment { message: String },

    /// An error occurred while parsing the installer configuration file.
    ///
    /// Includes the specific parsing issue and optionally a hint about how
    /// to fix it.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An error occurred while parsing the resolved dependency graph
    /// manifest produced by the host build tool.
    #[error("Graph manifest error: {message}")]
    GraphParse { message: String },

    /// An artifact could not be resolved to a file on disk.
    ///
    /// Aborts the walk at the failing node; modules already written stay on
    /// disk.
    #[error("Artifact resolution error for {coordinate}: {message}")]
    Resolution {
        coordinate: String,
        message: String,
    },

    /// A module descriptor could not be generated, merged, or written.
    #[error("Descriptor error for {path}: {message}")]
    Descriptor { path: String, message: String },

    /// A server configuration file could not be patched.
    #[error("Configuration patch error for {path}: {message}")]
    ConfigPatch { path: String, message: String },

    /// An error occurred while copying artifacts or managing module
    /// directories.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An XML tree manipulation or serialization error.
    #[error("XML error: {0}")]
    Xml(#[from] xot::Error),

    /// An XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] xot::ParseError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
