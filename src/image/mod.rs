//! # Image Layers
//!
//! An image layer is a directory that may carry up to three things:
//!
//! - `properties.json` / `properties.json5`: image properties, merged across
//!   layers with a JSON merge patch (see [`properties`]).
//! - `build_steps.json` / `build_steps.json5`: `pre`, `default` and `post`
//!   build steps (see [`build_steps`]).
//! - `resources/`: files shipped with the image, merged with the layered
//!   directory merge engine ([`crate::merge`]).
//!
//! None of them is required. Layers are scanned in parallel; the scan result
//! keeps the order the layers were given in.

pub mod build_steps;
pub mod document;
pub mod properties;

pub use build_steps::{
    hardcoded_build_steps, merge_build_steps, package_build_steps, validate_build_steps,
    BuildStepsConfig, SOURCE_URI_PLACEHOLDER,
};
pub use document::{find_document, read_document, DocumentFormat};
pub use properties::{merge_patch, merge_properties, validate_properties};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rayon::prelude::*;
use serde_json::{Map, Value};
use walkdir::WalkDir;

use crate::defaults::{BUILD_STEPS_NAME, PROPERTIES_NAME, RESOURCES_DIR_NAME};
use crate::error::{Error, Result};
use crate::layer::{DirLayer, EmptyLayer, Layer};
use crate::merge::{merge_layers, MergeOutcome};

/// The `resources/` directory of a layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcesDir {
    pub path: PathBuf,
    /// Total size of all files below `path`, in bytes
    pub size: u64,
}

/// Everything found in one image layer directory
#[derive(Debug, Clone)]
pub struct ImageLayer {
    pub root: PathBuf,
    pub properties: Option<Value>,
    pub build_steps: Option<BuildStepsConfig>,
    pub resources: Option<ResourcesDir>,
}

impl ImageLayer {
    /// Read the documents of the layer at `root` and measure its resources.
    pub fn scan(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        debug!("Scanning image layer {}", root.display());

        let properties: Option<Value> = read_document(&root, PROPERTIES_NAME)?;
        if let Some(document) = &properties {
            if !document.is_object() {
                return Err(Error::Document {
                    path: root.join(PROPERTIES_NAME),
                    message: "properties must be a JSON object".to_string(),
                });
            }
        }

        let build_steps = read_document(&root, BUILD_STEPS_NAME)?;
        let resources = scan_resources(&root)?;

        Ok(Self {
            root,
            properties,
            build_steps,
            resources,
        })
    }

    /// A [`Layer`] over this layer's `resources/` directory, or an empty
    /// layer when it has none.
    pub fn resources_layer(&self) -> Box<dyn Layer> {
        match &self.resources {
            Some(resources) => Box::new(DirLayer::new(&resources.path)),
            None => Box::new(EmptyLayer::new(self.root.display().to_string())),
        }
    }

    /// Label used in reports
    pub fn label(&self) -> String {
        self.root.display().to_string()
    }
}

fn scan_resources(root: &Path) -> Result<Option<ResourcesDir>> {
    let path = root.join(RESOURCES_DIR_NAME);
    match fs::metadata(&path) {
        Ok(meta) if meta.is_dir() => {
            let size = dir_size(&path)?;
            Ok(Some(ResourcesDir { path, size }))
        }
        Ok(_) => Err(Error::Document {
            path,
            message: format!("expected \"{}\" to be a directory", RESOURCES_DIR_NAME),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Document {
            path,
            message: format!("failed to inspect: {}", e),
        }),
    }
}

/// Total size of the regular files below `path`.
pub fn dir_size(path: &Path) -> Result<u64> {
    let mut size = 0;
    for entry in WalkDir::new(path) {
        let entry = entry.map_err(|e| Error::Layer {
            message: format!("failed to walk {}: {}", path.display(), e),
        })?;
        if entry.file_type().is_file() {
            let meta = entry.metadata().map_err(|e| Error::Layer {
                message: format!("failed to stat {}: {}", entry.path().display(), e),
            })?;
            size += meta.len();
        }
    }
    Ok(size)
}

/// Scan all layers in parallel, keeping their order.
pub fn scan_layers(roots: &[PathBuf]) -> Result<Vec<ImageLayer>> {
    info!("Scanning {} image layer(s)", roots.len());
    roots.par_iter().map(|root| ImageLayer::scan(root)).collect()
}

/// Merge the properties of all layers. Layers without properties are
/// skipped; without any properties the result is an empty object.
pub fn merge_layer_properties(layers: &[ImageLayer]) -> Value {
    merge_properties(layers.iter().filter_map(|l| l.properties.as_ref()))
        .unwrap_or_else(|| Value::Object(Map::new()))
}

/// Merge the build steps of all layers.
pub fn merge_layer_build_steps(layers: &[ImageLayer]) -> Vec<Value> {
    merge_build_steps(layers.iter().filter_map(|l| l.build_steps.as_ref()))
}

/// [`Layer`] views over every layer's `resources/`, in layer order.
pub fn resource_layers(layers: &[ImageLayer]) -> Vec<Box<dyn Layer>> {
    layers.iter().map(ImageLayer::resources_layer).collect()
}

/// Merge the `resources/` directories of all layers.
pub fn merge_resources(resources: &[Box<dyn Layer>]) -> Result<MergeOutcome> {
    let refs: Vec<&dyn Layer> = resources.iter().map(|l| l.as_ref()).collect();
    merge_layers(&refs, ".")
}
