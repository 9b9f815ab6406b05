//! # Merge Reports
//!
//! Human-readable rendering of a [`MergeOutcome`]. The merge engine never
//! prints anything itself; commands pass a writer (usually stdout) and the
//! layer labels to use.
//!
//! Layers are numbered from 1 in all output, matching the layer summary the
//! `build` command prints.

use std::io::{self, Write};
use std::path::Path;

use crate::merge::MergeOutcome;

/// Write every collision of `outcome`. Writes nothing when there are none.
pub fn write_collisions(
    out: &mut impl Write,
    outcome: &MergeOutcome,
    labels: &[String],
) -> io::Result<()> {
    if !outcome.file_collisions.is_empty() {
        writeln!(out, "The following path(s) have colliding files:")?;
        for collision in &outcome.file_collisions {
            writeln!(out, "- {}", collision.path.display())?;
            for &layer in &collision.colliding_layer_indexes {
                writeln!(out, "  + layer {}: {}", layer + 1, label(labels, layer))?;
            }
        }
    }

    if !outcome.type_collisions.is_empty() {
        writeln!(
            out,
            "On the following path(s) both files and directories exist with the same name:"
        )?;
        for collision in &outcome.type_collisions {
            writeln!(out, "- {}", collision.path.display())?;
            for &layer in &collision.directory_layer_indexes {
                writeln!(
                    out,
                    "  [DIR ] layer {}: {}",
                    layer + 1,
                    Path::new(label(labels, layer)).join(&collision.path).display()
                )?;
            }
            for &layer in &collision.file_layer_indexes {
                writeln!(
                    out,
                    "  [FILE] layer {}: {}",
                    layer + 1,
                    Path::new(label(labels, layer)).join(&collision.path).display()
                )?;
            }
        }
    }

    Ok(())
}

/// Write the per-layer list of files whose target differs from their source.
pub fn write_renames(
    out: &mut impl Write,
    outcome: &MergeOutcome,
    labels: &[String],
) -> io::Result<()> {
    writeln!(
        out,
        "Combining {} file(s). The following files were renamed:",
        outcome.mappings.len()
    )?;
    for (layer, layer_label) in labels.iter().enumerate() {
        writeln!(out, "From layer {}: {}", layer + 1, layer_label)?;
        let mut renamed = 0;
        for mapping in outcome.mappings_for_layer(layer).filter(|m| m.is_renamed()) {
            writeln!(
                out,
                "  {} -> {}",
                mapping.source_path.display(),
                mapping.target_path.display()
            )?;
            renamed += 1;
        }
        if renamed == 0 {
            writeln!(out, "  No files were renamed")?;
        }
    }
    Ok(())
}

fn label(labels: &[String], layer: usize) -> &str {
    labels.get(layer).map(String::as_str).unwrap_or("<unknown layer>")
}
