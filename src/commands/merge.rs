//! # Merge Command Implementation
//!
//! This module implements the `merge` subcommand, which stacks layer
//! directories into one output directory.
//!
//! ## Functionality
//!
//! - **Merging**: Every file of every layer lands in the output exactly once.
//!   Numbered files (`010_setup.ps1`, `010_pre_setup.ps1`, ...) are
//!   resequenced across all layers.
//! - **Collisions**: Files present in more than one layer, and names that are
//!   a file in one layer and a directory in another, are reported together
//!   and abort the merge before anything is written.
//! - **Dry Run**: `--dry-run` prints the plan and the renamed files only.
//! - **Metadata**: Copies keep their permissions and modification time.

use anyhow::Result;
use clap::Args;
use std::io::{self, Write};
use std::path::PathBuf;

use layer_stack::execute::{copy_mappings, ensure_empty_directory};
use layer_stack::merge::merge_layers;
use layer_stack::output::{emoji, format_size, OutputConfig};
use layer_stack::{report, suggestions};

use super::{check_output, dir_layers, layer_labels, layer_refs, StackArgs};

/// Merge layer directories into a single output directory
#[derive(Args, Debug)]
pub struct MergeArgs {
    #[command(flatten)]
    pub stack: StackArgs,

    /// Directory the merged tree is written to (default: ./out)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Delete the output directory first if it already exists
    #[arg(long)]
    pub overwrite_output: bool,

    /// Show what would be merged without copying any files
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `merge` command.
pub fn execute(args: MergeArgs, output: &OutputConfig) -> Result<()> {
    let stack = args.stack.resolve(args.output, args.overwrite_output)?;
    let layers = dir_layers(&stack);
    let refs = layer_refs(&layers);
    let labels = layer_labels(&stack);

    println!(
        "{} Merging {} layer(s)",
        emoji(output, "🔀", "[MERGE]"),
        refs.len()
    );
    let outcome = merge_layers(&refs, ".")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if outcome.has_collisions() {
        report::write_collisions(&mut out, &outcome, &labels)?;
        return Err(suggestions::merge_collisions(
            outcome.file_collisions.len(),
            outcome.type_collisions.len(),
        ));
    }

    report::write_renames(&mut out, &outcome, &labels)?;
    writeln!(out)?;

    if args.dry_run {
        writeln!(out, "Dry run: no files were copied")?;
        return Ok(());
    }

    check_output(&stack)?;
    ensure_empty_directory(&stack.output, stack.overwrite_output)?;
    let bytes = copy_mappings(&refs, &outcome.mappings, &stack.output)?;

    writeln!(
        out,
        "{} Created {} file(s) ({}) in {}",
        emoji(output, "✅", "[OK]"),
        outcome.mappings.len(),
        format_size(bytes),
        stack.output.display()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(temp: &TempDir, layers: &[&str], dry_run: bool) -> MergeArgs {
        MergeArgs {
            stack: StackArgs {
                layers: layers.iter().map(PathBuf::from).collect(),
                config: None,
                working_dir: Some(temp.path().to_path_buf()),
            },
            output: Some(PathBuf::from("out")),
            overwrite_output: false,
            dry_run,
        }
    }

    fn write(temp: &TempDir, path: &str, content: &str) {
        let full = temp.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    #[test]
    fn test_merge_writes_output() {
        let temp = TempDir::new().unwrap();
        write(&temp, "base/010_install.ps1", "install");
        write(&temp, "image/010_pre_prepare.ps1", "prepare");

        execute(args(&temp, &["base", "image"], false), &OutputConfig::without_color()).unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join("out/000_prepare.ps1")).unwrap(),
            "prepare"
        );
        assert_eq!(
            fs::read_to_string(temp.path().join("out/001_install.ps1")).unwrap(),
            "install"
        );
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp = TempDir::new().unwrap();
        write(&temp, "base/a.txt", "a");

        execute(args(&temp, &["base"], true), &OutputConfig::without_color()).unwrap();
        assert!(!temp.path().join("out").exists());
    }

    #[test]
    fn test_collisions_abort() {
        let temp = TempDir::new().unwrap();
        write(&temp, "base/a.txt", "a");
        write(&temp, "image/a.txt", "b");

        let err = execute(args(&temp, &["base", "image"], false), &OutputConfig::without_color())
            .unwrap_err();
        assert!(err.to_string().contains("Unable to merge layers"));
        assert!(!temp.path().join("out").exists());
    }

    #[test]
    fn test_existing_output_is_refused() {
        let temp = TempDir::new().unwrap();
        write(&temp, "base/a.txt", "a");
        fs::create_dir(temp.path().join("out")).unwrap();

        let err = execute(args(&temp, &["base"], false), &OutputConfig::without_color())
            .unwrap_err();
        assert!(err.to_string().contains("--overwrite-output"));
    }
}
