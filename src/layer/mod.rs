//! Layer handles: read-only views of one source directory tree.
//!
//! The merge engine never touches the host filesystem directly. It talks to
//! each layer through the [`Layer`] trait, which exposes three capabilities:
//! listing a relative directory, opening a relative file and reading a
//! file's metadata. All paths handed to a layer are relative to its root;
//! the empty path (or `.`) denotes the root itself.
//!
//! Implementations:
//!
//! - [`DirLayer`]: a directory on disk.
//! - [`EmptyLayer`]: reports every path as absent. Stands in for layers that
//!   have no subtree to contribute (e.g. an image layer without `resources/`).
//! - [`MemoryLayer`]: an in-memory tree, used by tests and benchmarks.

mod dir;
mod empty;
mod memory;

pub use dir::DirLayer;
pub use empty::EmptyLayer;
pub use memory::{File, MemoryLayer};

use std::fmt;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use crate::error::Result;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File or directory name (a single path component)
    pub name: String,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Metadata needed to reproduce a file in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Unix permission bits (e.g. `0o644`)
    pub mode: u32,
}

/// Read-only capability over a single directory tree.
///
/// Implementations must be safe to share across threads; the engine itself
/// is single-threaded but callers may merge several layer stacks at once.
pub trait Layer: Send + Sync {
    /// Human-readable label used in diagnostics (usually the root path).
    fn describe(&self) -> String;

    /// List the entries of the directory at `path`, sorted by name.
    ///
    /// Returns `Ok(None)` when the path does not exist in this layer. Any
    /// other failure is an error.
    fn list_entries(&self, path: &Path) -> Result<Option<Vec<DirEntry>>>;

    /// Open the file at `path` for reading.
    fn open_file(&self, path: &Path) -> Result<Box<dyn Read + '_>>;

    /// Stat the file at `path`.
    fn stat_file(&self, path: &Path) -> Result<FileStat>;
}

impl<L: Layer + ?Sized> Layer for Box<L> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn list_entries(&self, path: &Path) -> Result<Option<Vec<DirEntry>>> {
        (**self).list_entries(path)
    }

    fn open_file(&self, path: &Path) -> Result<Box<dyn Read + '_>> {
        (**self).open_file(path)
    }

    fn stat_file(&self, path: &Path) -> Result<FileStat> {
        (**self).stat_file(path)
    }
}

impl fmt::Debug for dyn Layer + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Layer({})", self.describe())
    }
}

/// Normalize a layer-relative path: drops `.` components so that `"."`,
/// `""` and `"./a"` all address the same place.
pub fn normalize_relative(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_relative_strips_cur_dir() {
        assert_eq!(normalize_relative(Path::new(".")), PathBuf::new());
        assert_eq!(normalize_relative(Path::new("")), PathBuf::new());
        assert_eq!(normalize_relative(Path::new("./a/b")), PathBuf::from("a/b"));
        assert_eq!(normalize_relative(Path::new("a/./b")), PathBuf::from("a/b"));
    }

    #[test]
    fn test_dir_entry_constructors() {
        assert!(DirEntry::dir("sub").is_dir);
        assert!(!DirEntry::file("a.txt").is_dir);
        assert_eq!(DirEntry::file("a.txt").name, "a.txt");
    }

    #[test]
    fn test_boxed_layer_delegates() {
        let mut memory = MemoryLayer::new("boxed");
        memory.add_file_string("a.txt", "a").unwrap();
        let boxed: Box<dyn Layer> = Box::new(memory);

        assert_eq!(boxed.describe(), "boxed");
        let entries = boxed.list_entries(Path::new(".")).unwrap().unwrap();
        assert_eq!(entries, vec![DirEntry::file("a.txt")]);
        assert_eq!(boxed.stat_file(Path::new("a.txt")).unwrap().size, 1);
    }
}
