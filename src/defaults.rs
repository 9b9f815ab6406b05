//! Default values for layer-stack.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

/// Name of the optional stack file looked up in the working directory.
pub const DEFAULT_CONFIG_FILENAME: &str = ".layer-stack.yaml";

/// Output directory used when neither `--output` nor the stack file names one.
pub const DEFAULT_OUTPUT_DIR: &str = "./out";

/// Base name of the image properties document (`.json` or `.json5`).
pub const PROPERTIES_NAME: &str = "properties";

/// Base name of the build steps document (`.json` or `.json5`).
pub const BUILD_STEPS_NAME: &str = "build_steps";

/// Directory within an image layer holding the files to ship.
pub const RESOURCES_DIR_NAME: &str = "resources";

/// Name of the provenance manifest written next to the resources archive.
pub const RESOURCES_MANIFEST_NAME: &str = "resources.manifest.json";

/// Maximum directory nesting the merge engine will walk.
///
/// Symlinked directories are never followed, so this only guards against
/// pathologically deep trees.
pub const MAX_MERGE_DEPTH: usize = 128;

/// Maximum number of placeholder properties an image may declare.
pub const MAX_PLACEHOLDER_PROPERTIES: usize = 50;
