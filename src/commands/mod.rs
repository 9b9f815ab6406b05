//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `layer-stack` command-line tool. Each subcommand is defined in its own file
//! to keep the logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic.
//!
//! Commands that operate on a layer stack share [`StackArgs`], which resolves
//! `--layer`, `--config` and the optional `.layer-stack.yaml` into a
//! [`Stack`].

pub mod build;
pub mod completions;
pub mod ls;
pub mod merge;
pub mod new;

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use layer_stack::config::{self, resolve_stack, Stack, StackConfig, StackOverrides};
use layer_stack::defaults::DEFAULT_CONFIG_FILENAME;
use layer_stack::layer::{DirLayer, Layer};

/// Layer selection shared by the stack commands
#[derive(Args, Debug, Clone, Default)]
pub struct StackArgs {
    /// Layer directory. Repeat for every layer, first layer first.
    ///
    /// Layers from the stack file come before these.
    #[arg(short, long = "layer", value_name = "DIR")]
    pub layers: Vec<PathBuf>,

    /// Path to a stack file listing the layers.
    ///
    /// Defaults to `.layer-stack.yaml` in the working directory when it exists.
    #[arg(short, long, value_name = "FILE", env = "LAYER_STACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// The directory relative layer paths are resolved against.
    ///
    /// If not provided, it defaults to the current working directory.
    #[arg(long, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,
}

impl StackArgs {
    fn working_dir(&self) -> Result<PathBuf> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Ok(match &self.working_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => cwd.join(dir),
            None => cwd,
        })
    }

    fn load_config(&self, working_dir: &Path) -> Result<Option<StackConfig>> {
        let path = match &self.config {
            Some(path) => {
                let path = working_dir.join(path);
                if !path.exists() {
                    return Err(layer_stack::suggestions::config_not_found(&path));
                }
                path
            }
            None => {
                let default = working_dir.join(DEFAULT_CONFIG_FILENAME);
                if !default.exists() {
                    return Ok(None);
                }
                default
            }
        };

        log::debug!("Loading stack file {}", path.display());
        let stack = config::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        Ok(Some(stack))
    }

    /// Resolve the full stack, with the output settings of the command.
    pub fn resolve(&self, output: Option<PathBuf>, overwrite_output: bool) -> Result<Stack> {
        let working_dir = self.working_dir()?;
        let file = self.load_config(&working_dir)?;
        let overrides = StackOverrides {
            layers: self.layers.clone(),
            output,
            overwrite_output,
        };
        Ok(resolve_stack(file, overrides, &working_dir)?)
    }
}

/// On-disk layers for every directory of the stack
pub fn dir_layers(stack: &Stack) -> Vec<DirLayer> {
    stack.layers.iter().map(|root| DirLayer::new(root)).collect()
}

/// Borrow layers as trait objects, in order.
pub fn layer_refs<L: Layer>(layers: &[L]) -> Vec<&dyn Layer> {
    layers.iter().map(|l| l as &dyn Layer).collect()
}

/// Labels for reports, one per layer
pub fn layer_labels(stack: &Stack) -> Vec<String> {
    stack
        .layers
        .iter()
        .map(|p| p.display().to_string())
        .collect()
}

/// Refuse an existing output unless it may be overwritten.
pub fn check_output(stack: &Stack) -> Result<()> {
    if !stack.overwrite_output && stack.output.exists() {
        return Err(layer_stack::suggestions::output_exists(
            &stack.output,
            "path already exists",
        ));
    }
    Ok(())
}
