//! Recursive directory merge across layers.
//!
//! Each call handles one directory level: it lists that directory in every
//! layer, groups the entries by identity (in first-seen order, so the result
//! never depends on hash iteration order), and then either recurses,
//! resolves files, or records a collision for each group. Every call returns
//! its own [`MergeOutcome`]; the parent splices child outcomes in.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use super::normalize::{normalize, Identity, OrderClass};
use super::ordering::{resolve_files, FileEntry};
use super::{EntryPathTypeCollision, FileCollision, MergeOutcome};
use crate::defaults::MAX_MERGE_DEPTH;
use crate::error::{Error, Result};
use crate::layer::{normalize_relative, Layer};

/// One entry discovered in one layer
#[derive(Debug, Clone)]
struct LayerEntry {
    layer_index: usize,
    source_path: PathBuf,
    target_name: String,
    is_dir: bool,
    class: OrderClass,
}

#[derive(Debug)]
struct Group {
    identity: Identity,
    entries: Vec<LayerEntry>,
}

impl Group {
    /// Layer indexes that contributed a directory, and those that contributed a file
    fn split_by_type(&self) -> (Vec<usize>, Vec<usize>) {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in &self.entries {
            if entry.is_dir {
                dirs.push(entry.layer_index);
            } else {
                files.push(entry.layer_index);
            }
        }
        (dirs, files)
    }

    fn file_entries(&self) -> Vec<FileEntry> {
        self.entries
            .iter()
            .map(|e| FileEntry {
                layer_index: e.layer_index,
                source_path: e.source_path.clone(),
                target_name: e.target_name.clone(),
                class: e.class,
            })
            .collect()
    }
}

/// Merge `layers` starting at `base_path` (use `"."` for the layer roots).
///
/// Layers are given in stacking order; index 0 is the first layer. The
/// outcome lists mappings and collisions in deterministic order: groups in
/// first-seen order (layer ascending, then listing order), subdirectories
/// expanded in place.
pub fn merge_layers(layers: &[&dyn Layer], base_path: impl AsRef<Path>) -> Result<MergeOutcome> {
    merge_layers_with_limit(layers, base_path, MAX_MERGE_DEPTH)
}

/// Like [`merge_layers`], but with an explicit bound on directory nesting
/// below `base_path`.
pub fn merge_layers_with_limit(
    layers: &[&dyn Layer],
    base_path: impl AsRef<Path>,
    max_depth: usize,
) -> Result<MergeOutcome> {
    let base = normalize_relative(base_path.as_ref());
    merge_level(layers, &base, 0, max_depth)
}

fn merge_level(
    layers: &[&dyn Layer],
    base: &Path,
    depth: usize,
    max_depth: usize,
) -> Result<MergeOutcome> {
    if depth > max_depth {
        return Err(Error::DepthExceeded {
            path: base.to_path_buf(),
            limit: max_depth,
        });
    }

    let groups = collect_groups(layers, base)?;
    debug!(
        "Merging \"{}\": {} group(s) across {} layer(s)",
        base.display(),
        groups.len(),
        layers.len()
    );

    let mut outcome = MergeOutcome::default();
    for group in groups {
        let path = base.join(&group.identity.name);
        let (dir_layers, file_layers) = group.split_by_type();
        trace!(
            "Group {:?}: {} dir(s), {} file(s)",
            group.identity,
            dir_layers.len(),
            file_layers.len()
        );

        if file_layers.is_empty() {
            if group.identity.ordered {
                return Err(Error::internal(format!(
                    "directory group at \"{}\" has an ordered identity",
                    path.display()
                )));
            }
            outcome.extend(merge_level(layers, &path, depth + 1, max_depth)?);
        } else if dir_layers.is_empty() {
            let (mappings, colliding) = resolve_files(&group.file_entries())?;
            outcome.mappings.extend(mappings);
            if !colliding.is_empty() {
                outcome.file_collisions.push(FileCollision {
                    path,
                    colliding_layer_indexes: colliding,
                });
            }
        } else {
            outcome.type_collisions.push(EntryPathTypeCollision {
                path,
                directory_layer_indexes: dir_layers,
                file_layer_indexes: file_layers,
            });
        }
    }

    Ok(outcome)
}

/// List `base` in every layer and group the entries by identity.
fn collect_groups(layers: &[&dyn Layer], base: &Path) -> Result<Vec<Group>> {
    let mut groups: Vec<Group> = Vec::new();
    let mut positions: HashMap<Identity, usize> = HashMap::new();

    for (layer_index, layer) in layers.iter().enumerate() {
        let listing = layer.list_entries(base).map_err(|e| Error::Listing {
            layer: layer_index,
            path: base.to_path_buf(),
            message: e.to_string(),
        })?;
        // absent in this layer: contributes nothing
        let Some(entries) = listing else {
            continue;
        };

        for entry in entries {
            let normalized = normalize(&entry.name, entry.is_dir)?;
            let layer_entry = LayerEntry {
                layer_index,
                source_path: base.join(&entry.name),
                target_name: normalized.target_name,
                is_dir: entry.is_dir,
                class: normalized.class,
            };

            match positions.get(&normalized.identity) {
                Some(&position) => groups[position].entries.push(layer_entry),
                None => {
                    positions.insert(normalized.identity.clone(), groups.len());
                    groups.push(Group {
                        identity: normalized.identity,
                        entries: vec![layer_entry],
                    });
                }
            }
        }
    }

    Ok(groups)
}
