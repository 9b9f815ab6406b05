//! Locating and parsing `.json` / `.json5` layer documents.
//!
//! A document is addressed by its base name (e.g. `properties`). A layer may
//! carry either `<name>.json` or `<name>.json5`, never both.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Syntax of a located document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    /// JSON5: comments, trailing commas, unquoted keys
    Json5,
}

/// Find `<name>.json` or `<name>.json5` in `dir`.
///
/// Returns `Ok(None)` when neither exists. Both existing, or either one
/// being a directory, is an error.
pub fn find_document(dir: &Path, name: &str) -> Result<Option<(PathBuf, DocumentFormat)>> {
    let json_path = dir.join(format!("{}.json", name));
    let json5_path = dir.join(format!("{}.json5", name));

    let json_exists = is_document_file(&json_path)?;
    let json5_exists = is_document_file(&json5_path)?;

    match (json_exists, json5_exists) {
        (true, true) => Err(Error::Document {
            path: json_path,
            message: format!(
                "both {}.json and {}.json5 were found, choose one",
                name, name
            ),
        }),
        (true, false) => Ok(Some((json_path, DocumentFormat::Json))),
        (false, true) => Ok(Some((json5_path, DocumentFormat::Json5))),
        (false, false) => Ok(None),
    }
}

fn is_document_file(path: &Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Err(Error::Document {
            path: path.to_path_buf(),
            message: "expected a file, but found a directory".to_string(),
        }),
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Document {
            path: path.to_path_buf(),
            message: format!("failed to inspect: {}", e),
        }),
    }
}

/// Parse document text in the given format.
pub fn parse_document<T: DeserializeOwned>(
    path: &Path,
    content: &str,
    format: DocumentFormat,
) -> Result<T> {
    let parsed = match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        DocumentFormat::Json5 => json5::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| Error::Document {
        path: path.to_path_buf(),
        message: format!("failed to parse: {}", message),
    })
}

/// Find and parse the document `<name>` in `dir`.
pub fn read_document<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Option<T>> {
    let Some((path, format)) = find_document(dir, name)? else {
        return Ok(None);
    };
    let content = fs::read_to_string(&path).map_err(|e| Error::Document {
        path: path.clone(),
        message: format!("failed to read: {}", e),
    })?;
    parse_document(&path, &content, format).map(Some)
}
