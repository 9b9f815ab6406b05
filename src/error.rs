//! # Error Handling
//!
//! This module defines the centralized error type for the `layer-stack`
//! library. It uses `thiserror` to derive an `Error` enum that covers every
//! failure the merge engine and its callers can run into.
//!
//! ## Key Components
//!
//! - **`Error`**: The enum of all failures. Variants fall into three groups:
//!   - fatal I/O failures (`Io`, `Listing`, `Layer`, `Filesystem`, `Archive`),
//!     which abort an operation immediately;
//!   - user-facing refusals (`Collisions`, `Document`, `Validation`,
//!     `ConfigParse`), reported after the engine has collected everything it
//!     can;
//!   - `Internal`, which marks a broken invariant inside the engine and is
//!     never caused by conflicting input.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for layer-stack operations
#[derive(Error, Debug)]
pub enum Error {
    /// A layer directory could not be listed for a reason other than the
    /// path being absent. This aborts the whole merge.
    #[error("Failed to list directory \"{}\" in layer {layer}: {message}", path.display())]
    Listing {
        layer: usize,
        path: PathBuf,
        message: String,
    },

    /// A layer could not serve a file or directory request.
    #[error("Layer error: {message}")]
    Layer { message: String },

    /// The directory tree is deeper than the merge engine is willing to walk.
    #[error("Directory tree too deep at \"{}\" (limit {limit})", path.display())]
    DepthExceeded { path: PathBuf, limit: usize },

    /// An internal invariant of the merge engine was violated.
    ///
    /// This always indicates a bug in the engine, never conflicting input.
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// The layers could not be merged because of unresolved collisions.
    #[error("Unable to merge layers: {file_collisions} file collision(s), {type_collisions} path type collision(s)")]
    Collisions {
        file_collisions: usize,
        type_collisions: usize,
    },

    /// A layer document (properties or build steps) could not be loaded.
    #[error("Document error in {}: {message}", path.display())]
    Document { path: PathBuf, message: String },

    /// A merged document failed validation.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// An error occurred while parsing the stack configuration file.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An error occurred while writing output files or directories.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An error occurred while writing the resources archive.
    #[error("Archive error: {message}")]
    Archive { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

impl Error {
    /// Shorthand for an [`Error::Internal`] with the given message.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Returns true when this error signals a bug rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Internal { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
