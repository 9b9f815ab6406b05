//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Following CLI recommendations,
//! errors should tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use layer_stack::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Configuration file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::config_not_found(path));
//! ```

use std::path::Path;

use crate::defaults::{BUILD_STEPS_NAME, PROPERTIES_NAME, RESOURCES_DIR_NAME};

/// Generate an error for when the stack file is not found.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create a .layer-stack.yaml file listing your layers\n\
         hint: Use -c/--config to specify a different path\n\
         hint: Set LAYER_STACK_CONFIG environment variable",
        path = path.display()
    )
}

/// Generate an error for an output path that already exists.
pub fn output_exists(path: &Path, error: impl std::fmt::Display) -> anyhow::Error {
    anyhow::anyhow!(
        "Cannot write output to {path}\n\
         error: {error}\n\n\
         hint: Use --overwrite-output to delete the existing output first\n\
         hint: Use -o/--output to choose another directory",
        path = path.display()
    )
}

/// Generate an error for layers that could not be merged.
pub fn merge_collisions(file_collisions: usize, type_collisions: usize) -> anyhow::Error {
    anyhow::anyhow!(
        "Unable to merge layers: {file_collisions} file collision(s), \
         {type_collisions} path type collision(s)\n\n\
         hint: A plain file may only exist in one layer; remove or rename the duplicates\n\
         hint: Prefix step scripts with a number (e.g. 010_setup.ps1) so they are sequenced instead\n\
         hint: A name cannot be a file in one layer and a directory in another"
    )
}

/// Generate an error for a merged document that failed validation.
pub fn invalid_document(kind: &str, error: impl std::fmt::Display) -> anyhow::Error {
    anyhow::anyhow!(
        "Merged {kind} result in an invalid document\n\
         error: {error}\n\n\
         hint: The merged document was printed above\n\
         hint: Later layers patch earlier ones; set a key to null to remove it"
    )
}

/// Generate an error for an invalid glob pattern.
///
/// Includes hints about glob syntax.
pub fn invalid_glob(pattern: &str, error: &glob::PatternError) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid glob pattern: {pattern}\n\
         error: {error}\n\n\
         hint: Use * for single path component, ** for recursive matching\n\
         hint: Use [abc] for character classes, [!abc] to negate\n\
         hint: Escape special characters with backslash"
    )
}

/// Generate an error for `new` pointing at an existing path.
pub fn new_target_exists(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Cannot create image layer: {path} already exists\n\n\
         hint: Choose a path that does not exist yet",
        path = path.display()
    )
}

/// Suggest the layer entry a misspelled top-level name probably meant.
///
/// `name` is a file or directory name found in a layer root, with its
/// extension (if any). Returns `None` for exact names and unrelated names.
pub fn layer_entry_typo(name: &str) -> Option<&'static str> {
    let stem = name
        .strip_suffix(".json5")
        .or_else(|| name.strip_suffix(".json"))
        .unwrap_or(name);
    let known = [PROPERTIES_NAME, BUILD_STEPS_NAME, RESOURCES_DIR_NAME];
    if known.contains(&stem) {
        return None;
    }
    find_similar(stem, &known)
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut previous: Vec<usize> = (0..=b_len).collect();
    let mut current = vec![0usize; b_len + 1];

    for i in 1..=a_len {
        current[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_len]
}
