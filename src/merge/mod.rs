//! # Layered Directory Merge Engine
//!
//! Stacks an ordered list of [`Layer`]s into one target tree. The result of a
//! merge is a plan, not a copy: every contributing source file gets exactly
//! one [`FileMapping`] to a target path, and every place where layers
//! disagree is reported as a collision. Executing the plan is left to the
//! caller (see [`crate::execute`] and [`crate::package`]).
//!
//! ## Rules
//!
//! - Entries are grouped per directory level by their normalized identity
//!   (see [`normalize`]).
//! - A directory present in several layers is merged recursively.
//! - A plain file may only come from one layer; two or more contributors are
//!   a [`FileCollision`]. There is no "last layer wins".
//! - Numbered files (`NNN_name`, `NNN_pre_name`, `NNN_post_name`) from all
//!   layers are renumbered into one sequence (see [`ordering`]).
//! - A name that is a directory in one layer and a file in another is an
//!   [`EntryPathTypeCollision`]; nothing below it is merged.
//!
//! Collisions do not stop the traversal: a single merge reports all of them.
//! Only a layer that cannot be listed aborts the merge.
//!
//! ## Example
//!
//! ```
//! use layer_stack::layer::{Layer, MemoryLayer};
//! use layer_stack::merge::merge_layers;
//!
//! let mut base = MemoryLayer::new("base");
//! base.add_file_string("010_install.ps1", "...").unwrap();
//! let mut image = MemoryLayer::new("image");
//! image.add_file_string("010_pre_prepare.ps1", "...").unwrap();
//!
//! let layers: Vec<&dyn Layer> = vec![&base, &image];
//! let outcome = merge_layers(&layers, ".").unwrap();
//! assert!(!outcome.has_collisions());
//!
//! let targets: Vec<_> = outcome.mappings.iter().map(|m| m.target_path.clone()).collect();
//! assert_eq!(targets[0].to_str(), Some("000_prepare.ps1"));
//! assert_eq!(targets[1].to_str(), Some("001_install.ps1"));
//! ```

pub mod normalize;
pub mod ordering;
pub mod tree;

pub use normalize::{normalize, Identity, NormalizedEntry, OrderClass, Preference};
pub use ordering::{pad_width, resolve_files, FileEntry};
pub use tree::{merge_layers, merge_layers_with_limit};

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Maps one source file of one layer to its path in the merged tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMapping {
    /// Index of the contributing layer
    pub layer_index: usize,
    /// Path relative to the layer root
    pub source_path: PathBuf,
    /// Path relative to the merged output root
    pub target_path: PathBuf,
}

impl FileMapping {
    /// True when the file is written under a different name than its source.
    pub fn is_renamed(&self) -> bool {
        self.source_path != self.target_path
    }
}

/// Two or more layers contribute a plain file at the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCollision {
    pub path: PathBuf,
    pub colliding_layer_indexes: Vec<usize>,
}

/// Some layers have a directory and others a file at the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPathTypeCollision {
    pub path: PathBuf,
    pub directory_layer_indexes: Vec<usize>,
    pub file_layer_indexes: Vec<usize>,
}

/// Everything a merge produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub mappings: Vec<FileMapping>,
    pub file_collisions: Vec<FileCollision>,
    pub type_collisions: Vec<EntryPathTypeCollision>,
}

impl MergeOutcome {
    pub fn has_collisions(&self) -> bool {
        !self.file_collisions.is_empty() || !self.type_collisions.is_empty()
    }

    /// Append another outcome, keeping the order of both.
    pub fn extend(&mut self, other: MergeOutcome) {
        self.mappings.extend(other.mappings);
        self.file_collisions.extend(other.file_collisions);
        self.type_collisions.extend(other.type_collisions);
    }

    /// Mappings contributed by one layer, in merge order.
    pub fn mappings_for_layer(&self, layer_index: usize) -> impl Iterator<Item = &FileMapping> {
        self.mappings
            .iter()
            .filter(move |m| m.layer_index == layer_index)
    }

    /// Return the mappings, or [`Error::Collisions`] if any collision was found.
    ///
    /// Callers that want to show the collisions first should render them with
    /// [`crate::report`] before calling this.
    pub fn into_mappings(self) -> Result<Vec<FileMapping>> {
        if self.has_collisions() {
            return Err(Error::Collisions {
                file_collisions: self.file_collisions.len(),
                type_collisions: self.type_collisions.len(),
            });
        }
        Ok(self.mappings)
    }
}
