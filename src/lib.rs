//! # Layer Stack Library
//!
//! This library stacks an ordered list of directory trees ("layers") into a
//! single tree. It is used by the `layer-stack` command-line tool to merge
//! image layers and to build image building packages, but the merge engine
//! has no knowledge of images and can be used on its own.
//!
//! ## Quick Example
//!
//! ```
//! use layer_stack::layer::{Layer, MemoryLayer};
//! use layer_stack::merge::merge_layers;
//!
//! let mut base = MemoryLayer::new("base");
//! base.add_file_string("tools/install.ps1", "...").unwrap();
//! base.add_file_string("020_install.ps1", "...").unwrap();
//!
//! let mut image = MemoryLayer::new("image");
//! image.add_file_string("tools/configure.ps1", "...").unwrap();
//! image.add_file_string("010_post_cleanup.ps1", "...").unwrap();
//!
//! let layers: Vec<&dyn Layer> = vec![&base, &image];
//! let outcome = merge_layers(&layers, ".").unwrap();
//!
//! assert!(!outcome.has_collisions());
//! assert_eq!(outcome.mappings.len(), 4);
//! ```
//!
//! ## Core Concepts
//!
//! - **Layers (`layer`)**: Read-only views of a directory tree, on disk or in
//!   memory.
//! - **Merge engine (`merge`)**: Groups entries by normalized identity, merges
//!   shared directories, resequences numbered files and reports collisions.
//! - **Reports (`report`)**: Renders collisions and renames for humans.
//! - **Execution (`execute`)**: Copies a merge plan into an output directory.
//! - **Images (`image`, `package`)**: Image layer documents and the image
//!   building package writer.
//! - **Configuration (`config`)**: The optional `.layer-stack.yaml` stack file.

pub mod config;
pub mod defaults;
pub mod error;
pub mod execute;
pub mod image;
pub mod layer;
pub mod merge;
pub mod output;
pub mod package;
pub mod report;
pub mod suggestions;

#[cfg(test)]
mod merge_proptest;
