//! In-memory layer implementation

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{normalize_relative, DirEntry, FileStat, Layer};
use crate::error::{Error, Result};

/// Represents a file with content and metadata
#[derive(Debug, Clone)]
pub struct File {
    /// File content as bytes
    pub content: Vec<u8>,
    /// File permissions (simplified as u32)
    pub permissions: u32,
    /// File modification time
    pub modified_time: SystemTime,
}

impl File {
    /// Create a new file with content
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            content,
            permissions: 0o644, // Default permissions
            modified_time: SystemTime::now(),
        }
    }

    /// Create a new file from string content
    pub fn from_string(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }

    /// Get file size in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// In-memory directory tree.
///
/// Directories exist implicitly as parents of files, or explicitly through
/// [`MemoryLayer::add_dir`] (which allows empty directories).
#[derive(Debug, Clone, Default)]
pub struct MemoryLayer {
    label: String,
    /// Files stored as path -> content mapping
    files: BTreeMap<PathBuf, File>,
    /// Explicitly created directories
    dirs: BTreeSet<PathBuf>,
}

impl MemoryLayer {
    /// Create a new empty layer with a diagnostic label
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Add or update a file
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P, file: File) -> Result<()> {
        let path = normalize_relative(path.as_ref());
        if path.as_os_str().is_empty() {
            return Err(Error::Layer {
                message: "cannot add a file at the layer root".to_string(),
            });
        }
        if self.is_dir(&path) {
            return Err(Error::Layer {
                message: format!("{} is already a directory", path.display()),
            });
        }
        let mut ancestor = path.parent();
        while let Some(dir) = ancestor {
            if self.files.contains_key(dir) {
                return Err(Error::Layer {
                    message: format!("{} is a file, not a directory", dir.display()),
                });
            }
            ancestor = dir.parent();
        }
        self.files.insert(path, file);
        Ok(())
    }

    /// Add a file with content
    pub fn add_file_content<P: AsRef<Path>>(&mut self, path: P, content: Vec<u8>) -> Result<()> {
        self.add_file(path, File::new(content))
    }

    /// Add a file with string content
    pub fn add_file_string<P: AsRef<Path>>(&mut self, path: P, content: &str) -> Result<()> {
        self.add_file(path, File::from_string(content))
    }

    /// Add a (possibly empty) directory
    pub fn add_dir<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = normalize_relative(path.as_ref());
        if self.files.contains_key(&path) {
            return Err(Error::Layer {
                message: format!("{} is already a file", path.display()),
            });
        }
        if !path.as_os_str().is_empty() {
            self.dirs.insert(path);
        }
        Ok(())
    }

    /// Get a file by path
    pub fn get_file<P: AsRef<Path>>(&self, path: P) -> Option<&File> {
        self.files.get(&normalize_relative(path.as_ref()))
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the layer holds no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over all files as (path, file) pairs, sorted by path
    pub fn files(&self) -> impl Iterator<Item = (&PathBuf, &File)> {
        self.files.iter()
    }

    fn is_dir(&self, path: &Path) -> bool {
        if path.as_os_str().is_empty() || self.dirs.contains(path) {
            return true;
        }
        let descends = |candidate: &PathBuf| candidate.starts_with(path) && candidate != path;
        self.files.keys().any(descends) || self.dirs.iter().any(descends)
    }
}

impl Layer for MemoryLayer {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn list_entries(&self, path: &Path) -> Result<Option<Vec<DirEntry>>> {
        let path = normalize_relative(path);
        if self.files.contains_key(&path) {
            return Err(Error::Layer {
                message: format!("{} is not a directory", path.display()),
            });
        }
        if !self.is_dir(&path) {
            return Ok(None);
        }

        // name -> is_dir; BTreeMap keeps the listing sorted by name
        let mut children: BTreeMap<String, bool> = BTreeMap::new();
        let all_paths = self
            .files
            .keys()
            .map(|p| (p, false))
            .chain(self.dirs.iter().map(|p| (p, true)));
        for (candidate, candidate_is_dir) in all_paths {
            let Ok(rest) = candidate.strip_prefix(&path) else {
                continue;
            };
            let mut components = rest.components();
            let Some(first) = components.next() else {
                continue;
            };
            let name = first.as_os_str().to_string_lossy().into_owned();
            let is_dir = candidate_is_dir || components.next().is_some();
            *children.entry(name).or_insert(false) |= is_dir;
        }

        Ok(Some(
            children
                .into_iter()
                .map(|(name, is_dir)| DirEntry { name, is_dir })
                .collect(),
        ))
    }

    fn open_file(&self, path: &Path) -> Result<Box<dyn Read + '_>> {
        let file = self.get_file(path).ok_or_else(|| Error::Layer {
            message: format!("File not found: {}", path.display()),
        })?;
        Ok(Box::new(Cursor::new(file.content.as_slice())))
    }

    fn stat_file(&self, path: &Path) -> Result<FileStat> {
        let file = self.get_file(path).ok_or_else(|| Error::Layer {
            message: format!("File not found: {}", path.display()),
        })?;
        Ok(FileStat {
            size: file.size() as u64,
            modified: file.modified_time,
            mode: file.permissions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_root_sorted_with_implied_dirs() {
        let mut layer = MemoryLayer::new("mem");
        layer.add_file_string("b.txt", "b").unwrap();
        layer.add_file_string("a.txt", "a").unwrap();
        layer.add_file_string("sub/c.txt", "c").unwrap();

        let entries = layer.list_entries(Path::new(".")).unwrap().unwrap();
        assert_eq!(
            entries,
            vec![
                DirEntry::file("a.txt"),
                DirEntry::file("b.txt"),
                DirEntry::dir("sub"),
            ]
        );
    }

    #[test]
    fn test_list_nested_directory() {
        let mut layer = MemoryLayer::new("mem");
        layer.add_file_string("sub/inner/deep.txt", "d").unwrap();
        layer.add_file_string("sub/c.txt", "c").unwrap();

        let entries = layer.list_entries(Path::new("sub")).unwrap().unwrap();
        assert_eq!(entries, vec![DirEntry::file("c.txt"), DirEntry::dir("inner")]);
    }

    #[test]
    fn test_list_missing_directory_is_none() {
        let mut layer = MemoryLayer::new("mem");
        layer.add_file_string("a.txt", "a").unwrap();
        assert!(layer.list_entries(Path::new("missing")).unwrap().is_none());
    }

    #[test]
    fn test_list_file_is_error() {
        let mut layer = MemoryLayer::new("mem");
        layer.add_file_string("a.txt", "a").unwrap();
        assert!(layer.list_entries(Path::new("a.txt")).is_err());
    }

    #[test]
    fn test_empty_explicit_directory() {
        let mut layer = MemoryLayer::new("mem");
        layer.add_dir("empty").unwrap();

        let root = layer.list_entries(Path::new("")).unwrap().unwrap();
        assert_eq!(root, vec![DirEntry::dir("empty")]);
        let inner = layer.list_entries(Path::new("empty")).unwrap().unwrap();
        assert!(inner.is_empty());
    }

    #[test]
    fn test_file_and_directory_conflicts_rejected() {
        let mut layer = MemoryLayer::new("mem");
        layer.add_file_string("x", "file").unwrap();
        assert!(layer.add_file_string("x/y", "nested").is_err());
        assert!(layer.add_dir("x").is_err());

        layer.add_file_string("d/inner.txt", "i").unwrap();
        assert!(layer.add_file_string("d", "file").is_err());
    }

    #[test]
    fn test_open_and_stat() {
        let mut layer = MemoryLayer::new("mem");
        let mut file = File::from_string("#!/bin/sh");
        file.permissions = 0o755;
        layer.add_file("bin/run.sh", file).unwrap();

        let mut content = String::new();
        layer
            .open_file(Path::new("bin/run.sh"))
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "#!/bin/sh");

        let stat = layer.stat_file(Path::new("./bin/run.sh")).unwrap();
        assert_eq!(stat.size, 9);
        assert_eq!(stat.mode, 0o755);
        assert!(layer.open_file(Path::new("missing")).is_err());
    }
}
