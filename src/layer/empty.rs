use std::io::{self, Read};
use std::path::Path;

use super::{DirEntry, FileStat, Layer};
use crate::error::{Error, Result};

/// A layer without content: every path is absent.
#[derive(Debug, Clone, Default)]
pub struct EmptyLayer {
    label: String,
}

impl EmptyLayer {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Layer for EmptyLayer {
    fn describe(&self) -> String {
        if self.label.is_empty() {
            "<empty>".to_string()
        } else {
            self.label.clone()
        }
    }

    fn list_entries(&self, _path: &Path) -> Result<Option<Vec<DirEntry>>> {
        Ok(None)
    }

    fn open_file(&self, path: &Path) -> Result<Box<dyn Read + '_>> {
        Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist in an empty layer", path.display()),
        )))
    }

    fn stat_file(&self, path: &Path) -> Result<FileStat> {
        Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist in an empty layer", path.display()),
        )))
    }
}
