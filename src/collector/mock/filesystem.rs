//! In-memory mock filesystem for testing collectors without real `/proc`.

use crate::collector::traits::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Stores file contents in memory, allowing tests to simulate various
/// `/proc` states without needing actual Linux access.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashMap<PathBuf, String>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content, replacing any previous one.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files.insert(path.as_ref().to_path_buf(), content.into());
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_add_and_read() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/stat", "cpu 1 2 3 4\n");
        fs.add_file("/proc/stat", "cpu 5 6 7 8\n");

        let content = fs.read_to_string(Path::new("/proc/stat")).unwrap();
        assert_eq!(content, "cpu 5 6 7 8\n");
    }

    #[test]
    fn test_mock_fs_missing_file() {
        let fs = MockFs::new();
        let err = fs.read_to_string(Path::new("/proc/stat")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
