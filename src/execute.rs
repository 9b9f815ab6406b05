//! # Executing a Merge Plan
//!
//! Copies the files named by a list of [`FileMapping`]s from their layers into
//! an output directory on disk.
//!
//! ## Process
//!
//! 1.  **Prepare Output**: [`ensure_empty_directory`] refuses to write into an
//!     existing path unless asked to delete it first.
//!
//! 2.  **Create Directories**: Parent directories of each target are created
//!     once; already-created directories are remembered.
//!
//! 3.  **Copy Content**: File content is streamed from the layer.
//!
//! 4.  **Restore Metadata**: On Unix-like systems the permission bits are
//!     restored; the modification time is restored everywhere.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::layer::{FileStat, Layer};
use crate::merge::FileMapping;

/// Create `path` as a new, empty directory.
///
/// An existing file or directory at `path` is an error, unless `overwrite`
/// is set, in which case it is deleted first.
pub fn ensure_empty_directory(path: &Path, overwrite: bool) -> Result<()> {
    if overwrite {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => {
                debug!("Removing existing output directory {}", path.display());
                fs::remove_dir_all(path).map_err(|e| Error::Filesystem {
                    message: format!("Failed to delete '{}': {}", path.display(), e),
                })?;
            }
            Ok(_) => {
                fs::remove_file(path).map_err(|e| Error::Filesystem {
                    message: format!("Failed to delete '{}': {}", path.display(), e),
                })?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::Filesystem {
                    message: format!("Failed to inspect '{}': {}", path.display(), e),
                })
            }
        }
    } else {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => {
                return Err(Error::Filesystem {
                    message: format!("Directory already exists: {}", path.display()),
                })
            }
            Ok(_) => {
                return Err(Error::Filesystem {
                    message: format!("Path is already a file: {}", path.display()),
                })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::Filesystem {
                    message: format!("Failed to inspect '{}': {}", path.display(), e),
                })
            }
        }
    }

    fs::create_dir_all(path).map_err(|e| Error::Filesystem {
        message: format!("Failed to create directory '{}': {}", path.display(), e),
    })
}

/// Copy every mapping from its layer into `output`.
///
/// `layers` must be the same slice (same order) the mappings were produced
/// from. Returns the number of bytes copied.
pub fn copy_mappings(
    layers: &[&dyn Layer],
    mappings: &[FileMapping],
    output: &Path,
) -> Result<u64> {
    let mut created_dirs: HashSet<PathBuf> = HashSet::new();
    let mut copied = 0;

    for mapping in mappings {
        let layer = layers.get(mapping.layer_index).ok_or_else(|| {
            Error::internal(format!(
                "mapping for {} refers to unknown layer {}",
                mapping.source_path.display(),
                mapping.layer_index
            ))
        })?;
        let target = output.join(&mapping.target_path);

        if let Some(parent) = target.parent() {
            if !created_dirs.contains(parent) {
                fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
                    message: format!("Failed to create directory '{}': {}", parent.display(), e),
                })?;
                created_dirs.insert(parent.to_path_buf());
            }
        }

        copied += copy_file(*layer, &mapping.source_path, &target)?;
        debug!(
            "Copied {} (layer {}) to {}",
            mapping.source_path.display(),
            mapping.layer_index + 1,
            target.display()
        );
    }

    Ok(copied)
}

fn copy_file(layer: &dyn Layer, source: &Path, target: &Path) -> Result<u64> {
    let stat = layer.stat_file(source)?;
    let mut reader = layer.open_file(source)?;
    let mut file = fs::File::create(target).map_err(|e| Error::Filesystem {
        message: format!("Failed to create file '{}': {}", target.display(), e),
    })?;

    let written = io::copy(&mut reader, &mut file).map_err(|e| Error::Filesystem {
        message: format!(
            "Failed to copy {} from {} to '{}': {}",
            source.display(),
            layer.describe(),
            target.display(),
            e
        ),
    })?;

    restore_metadata(&file, target, &stat)?;
    Ok(written)
}

fn restore_metadata(file: &fs::File, target: &Path, stat: &FileStat) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(stat.mode))
            .map_err(|e| Error::Filesystem {
                message: format!(
                    "Failed to set permissions on '{}': {}",
                    target.display(),
                    e
                ),
            })?;
    }

    file.set_modified(stat.modified)
        .map_err(|e| Error::Filesystem {
            message: format!(
                "Failed to set modification time on '{}': {}",
                target.display(),
                e
            ),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{File, MemoryLayer};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn mapping(layer: usize, source: &str, target: &str) -> FileMapping {
        FileMapping {
            layer_index: layer,
            source_path: PathBuf::from(source),
            target_path: PathBuf::from(target),
        }
    }

    #[test]
    fn test_ensure_empty_directory_creates_missing() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("a/b/out");
        ensure_empty_directory(&out, false).unwrap();
        assert!(out.is_dir());
    }

    #[test]
    fn test_ensure_empty_directory_refuses_existing() {
        let temp = TempDir::new().unwrap();
        let err = ensure_empty_directory(temp.path(), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let file = temp.path().join("file");
        fs::write(&file, "x").unwrap();
        let err = ensure_empty_directory(&file, false).unwrap_err();
        assert!(err.to_string().contains("already a file"));
    }

    #[test]
    fn test_ensure_empty_directory_overwrite() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("stale.txt"), "old").unwrap();

        ensure_empty_directory(&out, true).unwrap();
        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_copy_mappings_renames_and_nests() {
        let temp = TempDir::new().unwrap();
        let mut a = MemoryLayer::new("a");
        a.add_file_string("scripts/010_setup.ps1", "setup").unwrap();
        let mut b = MemoryLayer::new("b");
        b.add_file_string("readme.txt", "hello").unwrap();

        let mappings = vec![
            mapping(0, "scripts/010_setup.ps1", "scripts/000_setup.ps1"),
            mapping(1, "readme.txt", "readme.txt"),
        ];
        let copied = copy_mappings(&[&a, &b], &mappings, temp.path()).unwrap();

        assert_eq!(copied, 10);
        assert_eq!(
            fs::read_to_string(temp.path().join("scripts/000_setup.ps1")).unwrap(),
            "setup"
        );
        assert_eq!(
            fs::read_to_string(temp.path().join("readme.txt")).unwrap(),
            "hello"
        );
        assert!(!temp.path().join("scripts/010_setup.ps1").exists());
    }

    #[test]
    fn test_copy_preserves_mtime_and_mode() {
        let temp = TempDir::new().unwrap();
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        let mut layer = MemoryLayer::new("a");
        layer
            .add_file(
                "run.sh",
                File {
                    content: b"#!/bin/sh".to_vec(),
                    permissions: 0o755,
                    modified_time: modified,
                },
            )
            .unwrap();

        copy_mappings(&[&layer], &[mapping(0, "run.sh", "run.sh")], temp.path()).unwrap();

        let meta = fs::metadata(temp.path().join("run.sh")).unwrap();
        assert_eq!(meta.modified().unwrap(), modified);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            assert_eq!(meta.permissions().mode() & 0o777, 0o755);
        }
    }

    #[test]
    fn test_unknown_layer_is_internal_error() {
        let temp = TempDir::new().unwrap();
        let layer = MemoryLayer::new("a");
        let err = copy_mappings(&[&layer], &[mapping(3, "x", "x")], temp.path()).unwrap_err();
        assert!(err.is_internal());
    }
}
