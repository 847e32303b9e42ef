//! Folder discovery seam used while expanding the catalog.

use std::io;
use std::path::Path;

/// Answers reachability and subfolder questions about remote folders.
pub trait FolderSource {
    /// True if `path` exists and is a directory.
    fn is_dir(&self, path: &str) -> bool;

    /// Names (not full paths) of the immediate subdirectories of `path`.
    fn subfolders(&self, path: &str) -> io::Result<Vec<String>>;
}

/// Folders reachable through the local filesystem (mounted shares, UNC paths on Windows).
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFolders;

impl FolderSource for LocalFolders {
    fn is_dir(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }

    fn subfolders(&self, path: &str) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
