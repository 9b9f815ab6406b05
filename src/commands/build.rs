//! # Build Command Implementation
//!
//! This module implements the `build` subcommand, which turns a stack of image
//! layers into an image building package.
//!
//! ## Pipeline
//!
//! 1. **Scan**: Read `properties` and `build_steps` documents and measure the
//!    `resources/` directory of every layer (in parallel).
//! 2. **Properties**: Merge with a JSON merge patch and validate.
//! 3. **Build steps**: Concatenate the `pre`, `default` and `post` buckets and
//!    validate every step.
//! 4. **Resources**: Merge the `resources/` directories with the layer merge
//!    engine. Any collision aborts the build.
//! 5. **Package**: Write `properties.json`, `resources.zip`,
//!    `resources.manifest.json` and `build_steps.json`.
//!
//! A merged document that fails validation is printed before the error so the
//! offending key can be traced back to a layer.

use anyhow::{Context, Result};
use clap::Args;
use log::{info, warn};
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use layer_stack::image::{
    merge_layer_build_steps, merge_layer_properties, merge_resources, resource_layers,
    scan_layers, validate_build_steps, validate_properties, ImageLayer,
};
use layer_stack::defaults::RESOURCES_DIR_NAME;
use layer_stack::layer::Layer;
use layer_stack::output::{emoji, format_size, heading, OutputConfig};
use layer_stack::package::{progress_bar, to_tab_indented_json, ImagePackage};
use layer_stack::{report, suggestions};

use super::{check_output, StackArgs};

/// Build an image building package from image layers
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub stack: StackArgs,

    /// Directory the package is written to (default: ./out)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Delete the output directory first if it already exists
    #[arg(long)]
    pub overwrite_output: bool,

    /// Merge and validate everything without writing the package
    #[arg(long)]
    pub dry_run: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the `build` command.
pub fn execute(args: BuildArgs, output: &OutputConfig) -> Result<()> {
    let stack = args.stack.resolve(args.output, args.overwrite_output)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for root in &stack.layers {
        warn_on_typos(root);
    }

    info!("Scanning layers");
    let layers = scan_layers(&stack.layers)?;
    write_layer_summary(&mut out, output, &layers)?;

    info!("Merging properties");
    let properties = merge_layer_properties(&layers);
    if let Err(e) = validate_properties(&properties) {
        print_document(&mut out, "properties", &properties)?;
        return Err(suggestions::invalid_document("properties", e));
    }

    info!("Merging build steps");
    let build_steps = merge_layer_build_steps(&layers);
    if let Err(e) = validate_build_steps(&build_steps) {
        print_document(&mut out, "build steps", &Value::Array(build_steps))?;
        return Err(suggestions::invalid_document("build steps", e));
    }

    info!("Merging resources");
    let resources = resource_layers(&layers);
    let outcome = merge_resources(&resources)?;
    let labels = resource_labels(&layers);
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
        writeln!(
            out,
            "Dry run: {} build step(s) and {} resource file(s) validated, nothing was written",
            build_steps.len(),
            outcome.mappings.len()
        )?;
        return Ok(());
    }

    check_output(&stack)?;
    info!("Writing package to {}", stack.output.display());
    let resource_refs: Vec<&dyn Layer> = resources.iter().map(|l| l.as_ref()).collect();
    let package = ImagePackage {
        properties: &properties,
        build_steps: &build_steps,
        resources: &resource_refs,
        mappings: &outcome.mappings,
    };
    let progress = progress_bar(args.quiet);
    let summary = package
        .write(&stack.output, stack.overwrite_output, &progress)
        .with_context(|| format!("Failed to write package to {}", stack.output.display()))?;

    writeln!(
        out,
        "{} Package written to {} ({} resource file(s), {})",
        emoji(output, "📦", "[OK]"),
        summary.output.display(),
        summary.files,
        format_size(summary.resource_bytes)
    )?;
    writeln!(out, "resources.zip sha256: {}", summary.archive_sha256)?;
    Ok(())
}

/// Warn about top-level names that look like a misspelled layer entry.
fn warn_on_typos(root: &Path) {
    let Ok(entries) = fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(expected) = suggestions::layer_entry_typo(&name) {
            warn!(
                "{}: found '{}', did you mean '{}'?",
                root.display(),
                name,
                expected
            );
        }
    }
}

fn write_layer_summary(
    out: &mut impl Write,
    output: &OutputConfig,
    layers: &[ImageLayer],
) -> io::Result<()> {
    writeln!(out, "{}", heading(output, "Merging the following layers"))?;
    for (index, layer) in layers.iter().enumerate() {
        writeln!(out, "  ({}) {}", index + 1, layer.label())?;
        writeln!(out, "      {}", describe_layer(layer))?;
    }
    writeln!(out)
}

/// Report labels for the merged `resources/` directories, one per layer.
fn resource_labels(layers: &[ImageLayer]) -> Vec<String> {
    layers
        .iter()
        .map(|layer| match &layer.resources {
            Some(resources) => resources.path.display().to_string(),
            None => layer.root.join(RESOURCES_DIR_NAME).display().to_string(),
        })
        .collect()
}

fn describe_layer(layer: &ImageLayer) -> String {
    let build_steps = match &layer.build_steps {
        Some(steps) => steps.total_count().to_string(),
        None => "not configured".to_string(),
    };
    let resources = match &layer.resources {
        Some(resources) => format_size(resources.size),
        None => "no resource folder".to_string(),
    };
    format!(
        "has properties: {}, build_steps: {}, resources: {}",
        layer.properties.is_some(),
        build_steps,
        resources
    )
}

fn print_document(out: &mut impl Write, kind: &str, document: &Value) -> Result<()> {
    writeln!(out, "Merged {}:", kind)?;
    out.write_all(&to_tab_indented_json(document)?)?;
    writeln!(out)?;
    Ok(())
}
