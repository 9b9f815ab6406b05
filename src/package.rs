//! # Image Building Package
//!
//! Writes the output of `layer-stack build`: a directory with
//!
//! - `properties.json`: the merged image properties (tab indented);
//! - `resources.zip`: every merged resource file at its target path;
//! - `resources.manifest.json`: where each archive entry came from;
//! - `build_steps.json`: the merged build steps, wrapped with the fixed
//!   download/extract steps (which pin the SHA-256 of `resources.zip`) and
//!   the fixed cleanup/sysprep steps.
//!
//! The archive is hashed after it has been finalized, since the zip writer
//! needs to seek in its output.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Datelike, Timelike, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::defaults::{
    BUILD_STEPS_NAME, PROPERTIES_NAME, RESOURCES_DIR_NAME, RESOURCES_MANIFEST_NAME,
};
use crate::error::{Error, Result};
use crate::execute::ensure_empty_directory;
use crate::image::package_build_steps;
use crate::layer::{FileStat, Layer};
use crate::merge::FileMapping;

/// Provenance of one archive entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Path inside the archive
    pub target: String,
    /// Contributing layer, numbered from 1
    pub layer: usize,
    /// Path relative to the layer's `resources/` directory
    pub source: String,
    pub size: u64,
    pub mode: u32,
    pub comment: String,
}

/// What was written
#[derive(Debug, Clone)]
pub struct PackageSummary {
    pub output: PathBuf,
    pub archive_sha256: String,
    pub files: usize,
    pub resource_bytes: u64,
}

/// Merged inputs of a package
pub struct ImagePackage<'a> {
    pub properties: &'a Value,
    pub build_steps: &'a [Value],
    /// Resource layers, in the order the mappings refer to them
    pub resources: &'a [&'a dyn Layer],
    pub mappings: &'a [FileMapping],
}

impl ImagePackage<'_> {
    /// Write the package into `output`, which must not exist unless
    /// `overwrite` is set.
    pub fn write(
        &self,
        output: &Path,
        overwrite: bool,
        progress: &ProgressBar,
    ) -> Result<PackageSummary> {
        ensure_empty_directory(output, overwrite)?;

        let stats = self.stat_resources()?;
        let resource_bytes: u64 = stats.iter().map(|s| s.size).sum();

        let properties_json = to_tab_indented_json(self.properties)?;
        progress.set_length(properties_json.len() as u64 + resource_bytes);

        let properties_path = output.join(format!("{}.json", PROPERTIES_NAME));
        write_file(&properties_path, &properties_json, progress)?;

        let archive_path = output.join(format!("{}.zip", RESOURCES_DIR_NAME));
        let manifest = self.write_archive(&archive_path, &stats, progress)?;
        let archive_sha256 = sha256_file(&archive_path)?;
        info!("Resources archive checksum: {}", archive_sha256);

        let manifest_json = to_tab_indented_json(&manifest)?;
        fs::write(output.join(RESOURCES_MANIFEST_NAME), manifest_json).map_err(|e| {
            Error::Filesystem {
                message: format!("Failed to write {}: {}", RESOURCES_MANIFEST_NAME, e),
            }
        })?;

        let build_steps = package_build_steps(self.build_steps.to_vec(), &archive_sha256);
        let build_steps_json = to_tab_indented_json(&build_steps)?;
        progress.inc_length(build_steps_json.len() as u64);
        let build_steps_path = output.join(format!("{}.json", BUILD_STEPS_NAME));
        write_file(&build_steps_path, &build_steps_json, progress)?;

        progress.finish_with_message("done");

        Ok(PackageSummary {
            output: output.to_path_buf(),
            archive_sha256,
            files: self.mappings.len(),
            resource_bytes,
        })
    }

    fn layer(&self, mapping: &FileMapping) -> Result<&dyn Layer> {
        self.resources
            .get(mapping.layer_index)
            .copied()
            .ok_or_else(|| {
                Error::internal(format!(
                    "mapping for {} refers to unknown layer {}",
                    mapping.source_path.display(),
                    mapping.layer_index
                ))
            })
    }

    fn stat_resources(&self) -> Result<Vec<FileStat>> {
        self.mappings
            .iter()
            .map(|mapping| self.layer(mapping)?.stat_file(&mapping.source_path))
            .collect()
    }

    fn write_archive(
        &self,
        archive_path: &Path,
        stats: &[FileStat],
        progress: &ProgressBar,
    ) -> Result<Vec<ManifestEntry>> {
        let file = fs::File::create(archive_path).map_err(|e| Error::Filesystem {
            message: format!("Failed to create '{}': {}", archive_path.display(), e),
        })?;
        let mut archive = ZipWriter::new(file);
        let mut manifest = Vec::with_capacity(self.mappings.len());

        for (mapping, stat) in self.mappings.iter().zip(stats) {
            let target = archive_entry_name(&mapping.target_path);
            let source = archive_entry_name(&mapping.source_path);
            progress.set_message(target.clone());
            debug!("Adding {} (layer {}) as {}", source, mapping.layer_index + 1, target);

            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .last_modified_time(zip_time(stat))
                .unix_permissions(stat.mode);
            archive
                .start_file(target.as_str(), options)
                .map_err(archive_error)?;

            let reader = self.layer(mapping)?.open_file(&mapping.source_path)?;
            io::copy(&mut progress.wrap_read(reader), &mut archive)?;

            manifest.push(ManifestEntry {
                comment: format!("from layer {}: {}", mapping.layer_index + 1, source),
                target,
                layer: mapping.layer_index + 1,
                source,
                size: stat.size,
                mode: stat.mode,
            });
        }

        progress.set_message("Writing archive");
        archive.finish().map_err(archive_error)?;
        Ok(manifest)
    }
}

/// Progress bar for package writing; hidden when `quiet`.
pub fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template(
        "{msg:30!} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
    ) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// Archive paths always use `/`, whatever the host separator.
fn archive_entry_name(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Zip timestamps cover 1980..2107; anything outside falls back to the
/// zip epoch.
fn zip_time(stat: &FileStat) -> zip::DateTime {
    let modified: DateTime<Utc> = stat.modified.into();
    u16::try_from(modified.year())
        .ok()
        .and_then(|year| {
            zip::DateTime::from_date_and_time(
                year,
                modified.month() as u8,
                modified.day() as u8,
                modified.hour() as u8,
                modified.minute() as u8,
                modified.second() as u8,
            )
            .ok()
        })
        .unwrap_or_default()
}

fn archive_error(e: zip::result::ZipError) -> Error {
    Error::Archive {
        message: e.to_string(),
    }
}

/// Pretty JSON indented with tabs, the layout of every document in a package.
pub fn to_tab_indented_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

fn write_file(path: &Path, data: &[u8], progress: &ProgressBar) -> Result<()> {
    if let Some(name) = path.file_name() {
        progress.set_message(name.to_string_lossy().into_owned());
    }
    let mut file = fs::File::create(path).map_err(|e| Error::Filesystem {
        message: format!("Failed to create '{}': {}", path.display(), e),
    })?;
    file.write_all(data).map_err(|e| Error::Filesystem {
        message: format!("Failed to write '{}': {}", path.display(), e),
    })?;
    progress.inc(data.len() as u64);
    Ok(())
}

/// Hex SHA-256 of the file at `path`.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
