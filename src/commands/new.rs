//! # New Command Implementation
//!
//! This module implements the `new` subcommand, which scaffolds an image layer
//! folder: a `properties.json5`, a `build_steps.json5` and a `resources/`
//! directory holding one example step script.
//!
//! The scaffold is a valid single-layer stack on its own, so
//! `layer-stack build -l <path>` works right after `new`.

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use layer_stack::defaults::{BUILD_STEPS_NAME, PROPERTIES_NAME, RESOURCES_DIR_NAME};
use layer_stack::output::{emoji, OutputConfig};
use layer_stack::suggestions;

const PROPERTIES_TEMPLATE: &str = r#"// Image properties. Layers are combined with a JSON merge patch:
// later layers override keys of earlier layers, null removes a key.
{
  imageTemplate: {
    vmProfile: {
      vmSize: "Standard_D2s_v3",
      osDiskSizeGB: 127,
    },
    source: {
      type: "PlatformImage",
      publisher: "MicrosoftWindowsDesktop",
      offer: "windows-11",
      sku: "win11-23h2-avd",
      version: "latest",
    },
  },
  placeholderProperties: {},
}
"#;

const BUILD_STEPS_TEMPLATE: &str = r#"// Build steps run in the order pre, default, post.
// Every layer's steps are appended to the steps of the layers before it.
{
  pre: [],
  default: [
    {
      type: "PowerShell",
      name: "Run example script",
      runElevated: true,
      runAsSystem: true,
      scriptUri: "C:\\imagebuild_resources\\010_example.ps1",
    },
  ],
  post: [],
}
"#;

const EXAMPLE_SCRIPT_NAME: &str = "010_example.ps1";

const EXAMPLE_SCRIPT_TEMPLATE: &str = r#"# Files in resources/ are merged across layers into C:\imagebuild_resources.
# Numbered files (010_name.ps1, 010_pre_name.ps1, 010_post_name.ps1) are
# renumbered into one sequence across all layers.
Write-Host "Hello from the example image layer"
"#;

/// Create a new image layer folder
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Path of the image layer to create. Must not exist yet.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

/// Execute the `new` command.
pub fn execute(args: NewArgs, output: &OutputConfig) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    scaffold(&args.path, &mut out)?;

    let absolute = fs::canonicalize(&args.path)
        .with_context(|| format!("Failed to resolve {}", args.path.display()))?;
    writeln!(out)?;
    writeln!(
        out,
        "{} Created new image layer at {}",
        emoji(output, "✨", "[OK]"),
        absolute.display()
    )?;
    Ok(())
}

/// Write the scaffold below `root`, printing one line per created entry.
fn scaffold(root: &Path, out: &mut impl Write) -> Result<()> {
    if root.symlink_metadata().is_ok() {
        return Err(suggestions::new_target_exists(root));
    }

    let shown = root
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| root.to_path_buf());

    create_dir(root, &shown, out)?;
    create_file(
        &root.join(format!("{}.json5", PROPERTIES_NAME)),
        &shown.join(format!("{}.json5", PROPERTIES_NAME)),
        PROPERTIES_TEMPLATE,
        out,
    )?;
    create_file(
        &root.join(format!("{}.json5", BUILD_STEPS_NAME)),
        &shown.join(format!("{}.json5", BUILD_STEPS_NAME)),
        BUILD_STEPS_TEMPLATE,
        out,
    )?;
    create_dir(
        &root.join(RESOURCES_DIR_NAME),
        &shown.join(RESOURCES_DIR_NAME),
        out,
    )?;
    create_file(
        &root.join(RESOURCES_DIR_NAME).join(EXAMPLE_SCRIPT_NAME),
        &shown.join(RESOURCES_DIR_NAME).join(EXAMPLE_SCRIPT_NAME),
        EXAMPLE_SCRIPT_TEMPLATE,
        out,
    )?;
    Ok(())
}

fn create_dir(path: &Path, shown: &Path, out: &mut impl Write) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {}", path.display()))?;
    writeln!(out, "[DIR ] {}", shown.display())?;
    Ok(())
}

fn create_file(path: &Path, shown: &Path, content: &str, out: &mut impl Write) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    writeln!(out, "[FILE] {}", shown.display())?;
    Ok(())
}
