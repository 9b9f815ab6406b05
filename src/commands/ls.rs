//! # Ls Command Implementation
//!
//! This module implements the `ls` subcommand, which lists the files a merge
//! of the layer stack would produce.
//!
//! ## Functionality
//!
//! - **File Listing**: Shows every target path of the merge plan
//! - **Resources**: `--resources` lists the merged `resources/` directories of
//!   image layers instead of the whole layers
//! - **Pattern Filtering**: Supports glob patterns to filter the output
//! - **Detailed Output**: Optional long format showing permissions, size and
//!   the contributing layer
//! - **Sorting**: Files can be sorted by name, size, or path
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::{Args, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;

use layer_stack::defaults::RESOURCES_DIR_NAME;
use layer_stack::layer::Layer;
use layer_stack::merge::{merge_layers, MergeOutcome};
use layer_stack::output::{format_permissions, format_size, OutputConfig};
use layer_stack::{report, suggestions};

use super::{dir_layers, layer_labels, layer_refs, StackArgs};

/// List the files a merge of the layers would produce
#[derive(Args, Debug)]
pub struct LsArgs {
    #[command(flatten)]
    pub stack: StackArgs,

    /// List the merged `resources/` directories of image layers.
    #[arg(long)]
    pub resources: bool,

    /// Filter files by glob pattern (e.g., "*.ps1", "tools/**/*.json").
    #[arg(short, long, value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Use long listing format showing permissions, size and source layer.
    #[arg(long)]
    pub long: bool,

    /// Sort order for file listing.
    #[arg(short, long, value_enum, default_value = "path")]
    pub sort: SortOrder,

    /// Show only the total count of files.
    #[arg(long)]
    pub count: bool,

    /// Reverse the sort order.
    #[arg(short, long)]
    pub reverse: bool,
}

/// Sort order options for file listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum SortOrder {
    /// Sort alphabetically by file name
    Name,
    /// Sort by file size
    Size,
    /// Sort by full target path
    #[default]
    Path,
}

/// File information for listing
#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    layer_index: usize,
    size: u64,
    permissions: u32,
}

/// Execute the `ls` command.
pub fn execute(args: LsArgs, _output: &OutputConfig) -> Result<()> {
    let stack = args.stack.resolve(None, false)?;
    let layers = dir_layers(&stack);
    let refs = layer_refs(&layers);
    let labels = layer_labels(&stack);

    let base = if args.resources {
        PathBuf::from(RESOURCES_DIR_NAME)
    } else {
        PathBuf::from(".")
    };
    let outcome = merge_layers(&refs, &base)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if outcome.has_collisions() {
        report::write_collisions(&mut out, &outcome, &labels)?;
        return Err(suggestions::merge_collisions(
            outcome.file_collisions.len(),
            outcome.type_collisions.len(),
        ));
    }

    let mut files = collect_files(&refs, &outcome)?;
    if let Some(pattern) = &args.pattern {
        let glob_pattern =
            glob::Pattern::new(pattern).map_err(|e| suggestions::invalid_glob(pattern, &e))?;
        files.retain(|f| f.path.to_str().is_some_and(|s| glob_pattern.matches(s)));
    }
    sort_files(&mut files, args.sort, args.reverse);

    if args.count {
        writeln!(out, "{}", files.len())?;
        return Ok(());
    }

    if files.is_empty() {
        writeln!(out, "No files would be created.")?;
        return Ok(());
    }

    for file in &files {
        if args.long {
            writeln!(
                out,
                "{} {:>8} layer {:<3} {}",
                format_permissions(file.permissions),
                format_size(file.size),
                file.layer_index + 1,
                file.path.display()
            )?;
        } else {
            writeln!(out, "{}", file.path.display())?;
        }
    }

    let total_size: u64 = files.iter().map(|f| f.size).sum();
    writeln!(out)?;
    writeln!(
        out,
        "{} file(s), {} total",
        files.len(),
        format_size(total_size)
    )?;

    Ok(())
}

fn collect_files(layers: &[&dyn Layer], outcome: &MergeOutcome) -> Result<Vec<FileInfo>> {
    outcome
        .mappings
        .iter()
        .map(|mapping| {
            let layer = layers.get(mapping.layer_index).ok_or_else(|| {
                anyhow::anyhow!("mapping refers to unknown layer {}", mapping.layer_index)
            })?;
            let stat = layer.stat_file(&mapping.source_path)?;
            Ok(FileInfo {
                path: mapping.target_path.clone(),
                layer_index: mapping.layer_index,
                size: stat.size,
                permissions: stat.mode,
            })
        })
        .collect()
}

fn sort_files(files: &mut [FileInfo], order: SortOrder, reverse: bool) {
    match order {
        SortOrder::Name => files.sort_by(|a, b| {
            let name_a = a.path.file_name().unwrap_or_default();
            let name_b = b.path.file_name().unwrap_or_default();
            name_a.cmp(name_b)
        }),
        SortOrder::Size => files.sort_by_key(|f| f.size),
        SortOrder::Path => files.sort_by(|a, b| a.path.cmp(&b.path)),
    }
    if reverse {
        files.reverse();
    }
}
