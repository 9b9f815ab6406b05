use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::warn;

use super::{normalize_relative, DirEntry, FileStat, Layer};
use crate::error::{Error, Result};

/// A layer backed by a directory on the host filesystem.
///
/// Listings are sorted by name. Symbolic links to files are treated as
/// files; symbolic links to directories are skipped (with a warning) so that
/// link cycles can never make the merge walk forever.
#[derive(Debug, Clone)]
pub struct DirLayer {
    root: PathBuf,
}

impl DirLayer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of this layer
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(normalize_relative(path))
    }

    fn classify(&self, entry: &fs::DirEntry, relative: &Path) -> io::Result<Option<bool>> {
        let file_type = entry.file_type()?;
        if !file_type.is_symlink() {
            return Ok(Some(file_type.is_dir()));
        }
        match fs::metadata(entry.path()) {
            Ok(target) if target.is_dir() => {
                warn!(
                    "Skipping symlinked directory {} in layer {}",
                    relative.display(),
                    self.root.display()
                );
                Ok(None)
            }
            Ok(_) => Ok(Some(false)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "Skipping dangling symlink {} in layer {}",
                    relative.display(),
                    self.root.display()
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

impl DirLayer {
    /// First component of `path` (below the root) that is a symlink.
    ///
    /// A missing component ends the walk; the listing reports it as absent.
    fn symlinked_component(&self, path: &Path) -> Result<Option<PathBuf>> {
        let mut relative = PathBuf::new();
        for component in normalize_relative(path).components() {
            relative.push(component);
            match fs::symlink_metadata(self.root.join(&relative)) {
                Ok(meta) if meta.file_type().is_symlink() => return Ok(Some(relative)),
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }
}

impl Layer for DirLayer {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn list_entries(&self, path: &Path) -> Result<Option<Vec<DirEntry>>> {
        if let Some(link) = self.symlinked_component(path)? {
            warn!(
                "Not following symlinked directory {} in layer {}",
                link.display(),
                self.root.display()
            );
            return Ok(None);
        }

        let full_path = self.resolve(path);
        let read_dir = match fs::read_dir(&full_path) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let name = entry.file_name().into_string().map_err(|raw| Error::Layer {
                message: format!(
                    "non UTF-8 file name {:?} in {}",
                    raw,
                    full_path.display()
                ),
            })?;
            let relative = normalize_relative(path).join(&name);
            if let Some(is_dir) = self.classify(&entry, &relative)? {
                entries.push(DirEntry { name, is_dir });
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Some(entries))
    }

    fn open_file(&self, path: &Path) -> Result<Box<dyn Read + '_>> {
        let file = fs::File::open(self.resolve(path))?;
        Ok(Box::new(file))
    }

    fn stat_file(&self, path: &Path) -> Result<FileStat> {
        let metadata = fs::metadata(self.resolve(path))?;
        Ok(FileStat {
            size: metadata.len(),
            modified: metadata.modified()?,
            mode: file_mode(&metadata),
        })
    }
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
