//! # Stack Configuration
//!
//! A layer stack can be described on the command line (`--layer` repeated)
//! or in a `.layer-stack.yaml` file:
//!
//! ```yaml
//! layers:
//!   - default_image_layers/scripts_setup
//!   - images/exam
//! output: ./out
//! overwrite_output: false
//! ```
//!
//! ## Resolution
//!
//! - Relative paths in the file resolve against the file's directory.
//! - Relative paths on the command line resolve against the working
//!   directory.
//! - Command-line layers are stacked after the file's layers; a
//!   command-line `--output` replaces the file's `output`.
//! - Every layer must be an existing directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::defaults::DEFAULT_OUTPUT_DIR;
use crate::error::{Error, Result};

/// Contents of a stack file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    /// Layer directories, first layer first
    #[serde(default)]
    pub layers: Vec<PathBuf>,
    /// Output directory
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Delete an existing output directory instead of refusing
    #[serde(default)]
    pub overwrite_output: bool,
}

impl StackConfig {
    /// Make every relative path absolute against `base`.
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        self.layers = self.layers.iter().map(|p| absolutize(base, p)).collect();
        self.output = self.output.map(|p| absolutize(base, &p));
        self
    }
}

/// Parse stack file text.
pub fn parse(yaml_content: &str) -> Result<StackConfig> {
    if yaml_content.trim().is_empty() {
        return Ok(StackConfig::default());
    }
    serde_yaml::from_str(yaml_content).map_err(|e| Error::ConfigParse {
        message: e.to_string(),
        hint: Some(
            "expected a mapping with 'layers' (list of paths), 'output' and 'overwrite_output'"
                .to_string(),
        ),
    })
}

/// Read a stack file; relative paths resolve against its directory.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<StackConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(parse(&content)?.resolve_relative_to(base))
}

/// A fully resolved stack: absolute, existing layer directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    pub layers: Vec<PathBuf>,
    pub output: PathBuf,
    pub overwrite_output: bool,
}

/// Command-line side of a stack
#[derive(Debug, Clone, Default)]
pub struct StackOverrides {
    pub layers: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub overwrite_output: bool,
}

/// Combine an optional stack file with command-line values.
pub fn resolve_stack(
    file: Option<StackConfig>,
    overrides: StackOverrides,
    working_dir: &Path,
) -> Result<Stack> {
    let file = file.unwrap_or_default();

    let mut layers = file.layers;
    layers.extend(overrides.layers.iter().map(|p| absolutize(working_dir, p)));
    if layers.is_empty() {
        return Err(Error::ConfigParse {
            message: "No layers given".to_string(),
            hint: Some(
                "pass --layer <DIR> (repeatable) or list them under 'layers:' in the stack file"
                    .to_string(),
            ),
        });
    }
    ensure_layer_dirs(&layers)?;

    let output = overrides
        .output
        .map(|p| absolutize(working_dir, &p))
        .or(file.output)
        .unwrap_or_else(|| absolutize(working_dir, Path::new(DEFAULT_OUTPUT_DIR)));

    Ok(Stack {
        layers,
        output,
        overwrite_output: overrides.overwrite_output || file.overwrite_output,
    })
}

/// Every layer path must be an existing directory.
pub fn ensure_layer_dirs(layers: &[PathBuf]) -> Result<()> {
    for layer in layers {
        let meta = std::fs::metadata(layer).map_err(|e| Error::Filesystem {
            message: format!("Failed to check layer path {}: {}", layer.display(), e),
        })?;
        if !meta.is_dir() {
            return Err(Error::Filesystem {
                message: format!(
                    "Layer path does not point to a directory: {}",
                    layer.display()
                ),
            });
        }
    }
    Ok(())
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
