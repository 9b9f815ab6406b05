//! Ordering resolution for files sharing one identity.
//!
//! Unordered files keep their path but may only have one contributor.
//! Ordered (numbered) files from all layers are resequenced into one global
//! sequence: `pre` entries first, then neutral, then `post`, each bucket in
//! discovery order (layer index ascending, then listing order). The numeric
//! prefix a file was contributed with is discarded and replaced by its
//! position in that sequence.

use std::path::{Path, PathBuf};

use super::normalize::{OrderClass, Preference};
use super::FileMapping;
use crate::error::{Error, Result};

/// Minimum width of the sequence prefix
pub const MIN_PAD_WIDTH: usize = 3;

/// A file entry handed to the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub layer_index: usize,
    /// Path of the file relative to its layer root
    pub source_path: PathBuf,
    /// Base name the file keeps once its prefix is replaced
    pub target_name: String,
    pub class: OrderClass,
}

/// Resolve the target paths for a group of same-identity file entries.
///
/// Returns the mappings plus the colliding layer indexes. Exactly one of the
/// two is non-empty for a non-empty input. Mixing ordered and unordered
/// entries is an internal error.
pub fn resolve_files(entries: &[FileEntry]) -> Result<(Vec<FileMapping>, Vec<usize>)> {
    if entries.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let ordered_count = entries.iter().filter(|e| e.class.is_ordered()).count();
    if ordered_count != 0 && ordered_count != entries.len() {
        return Err(Error::internal(
            "entries must either all be ordered or all be unordered",
        ));
    }

    if ordered_count == 0 {
        return Ok(resolve_unordered(entries));
    }

    Ok((resolve_ordered(entries), Vec::new()))
}

fn resolve_unordered(entries: &[FileEntry]) -> (Vec<FileMapping>, Vec<usize>) {
    match entries {
        [only] => (
            vec![FileMapping {
                layer_index: only.layer_index,
                source_path: only.source_path.clone(),
                target_path: only.source_path.clone(),
            }],
            Vec::new(),
        ),
        _ => (Vec::new(), entries.iter().map(|e| e.layer_index).collect()),
    }
}

fn resolve_ordered(entries: &[FileEntry]) -> Vec<FileMapping> {
    let in_bucket = |wanted: Preference| {
        entries.iter().filter(move |e| {
            matches!(e.class, OrderClass::Ordered { preference, .. } if preference == wanted)
        })
    };
    let sequence = in_bucket(Preference::Pre)
        .chain(in_bucket(Preference::Neutral))
        .chain(in_bucket(Preference::Post));

    let width = pad_width(entries.len());
    sequence
        .enumerate()
        .map(|(position, entry)| FileMapping {
            layer_index: entry.layer_index,
            source_path: entry.source_path.clone(),
            target_path: sequenced_path(&entry.source_path, position, width, &entry.target_name),
        })
        .collect()
}

/// Number of digits used for sequence prefixes when `count` entries compete.
pub fn pad_width(count: usize) -> usize {
    count.to_string().len().max(MIN_PAD_WIDTH)
}

fn sequenced_path(source: &Path, position: usize, width: usize, target_name: &str) -> PathBuf {
    let file_name = format!("{:0width$}_{}", position, target_name, width = width);
    match source.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}
