//! Filesystem access used by the resolver and the sync engine
//!
//! All platform differences live behind [`FileSystem`]; the rest of the crate
//! only speaks in terms of its capabilities.

use filetime::FileTime;
use std::io;
use std::path::{Path, PathBuf};

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name, lossily converted to UTF-8
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Capabilities the sync engine needs from a filesystem
pub trait FileSystem {
    /// List the immediate children of `path`, sorted by name
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    fn is_dir(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copy `from` over `to`, replacing any existing file
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Absolute path with symlinks resolved
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// True when `a` and `b` name the same file or directory. Paths that
    /// cannot be resolved are compared lexically.
    fn same_path(&self, a: &Path, b: &Path) -> bool {
        match (self.canonicalize(a), self.canonicalize(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => path_clean::clean(a) == path_clean::clean(b),
        }
    }
}

/// The local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl FileSystem for StdFs {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();

        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            // Follow symlinks so a linked character directory still counts
            let is_dir = entry.path().is_dir();
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
                is_dir,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::copy(from, to)?;

        // Keep the prototype's mtime so repeated runs leave identical files
        let metadata = std::fs::metadata(from)?;
        filetime::set_file_mtime(to, FileTime::from_last_modification_time(&metadata))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_dir_sorted() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("Zeta")).unwrap();
        std::fs::create_dir(temp_dir.path().join("Alpha")).unwrap();
        std::fs::write(temp_dir.path().join("Middle.lua"), "x").unwrap();

        let entries = StdFs.read_dir(temp_dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();

        assert_eq!(names, vec!["Alpha", "Middle.lua", "Zeta"]);
        assert!(entries[0].is_dir);
        assert!(!entries[1].is_dir);
    }

    #[test]
    fn test_copy_file_overwrites_and_keeps_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src.txt");
        let dst = temp_dir.path().join("dst.txt");
        std::fs::write(&src, "new").unwrap();
        std::fs::write(&dst, "old contents").unwrap();

        let stamp = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&src, stamp).unwrap();

        StdFs.copy_file(&src, &dst).unwrap();

        assert_eq!(std::fs::read_to_string(&dst).unwrap(), "new");
        let copied = std::fs::metadata(&dst).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&copied), stamp);
    }

    #[cfg(unix)]
    #[test]
    fn test_same_path_follows_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let hero = temp_dir.path().join("Org/Hero");
        std::fs::create_dir_all(&hero).unwrap();
        std::os::unix::fs::symlink(&hero, temp_dir.path().join("Org/Alt")).unwrap();

        assert!(StdFs.same_path(&hero, &temp_dir.path().join("Org/Alt")));
        assert!(StdFs.same_path(&hero, &temp_dir.path().join("Org/./Hero")));
        assert!(!StdFs.same_path(&hero, &temp_dir.path().join("Org")));
    }

    #[test]
    fn test_same_path_missing_falls_back_to_lexical() {
        assert!(StdFs.same_path(Path::new("/no/such/a/../b"), Path::new("/no/such/b")));
        assert!(!StdFs.same_path(Path::new("/no/such/a"), Path::new("/no/such/b")));
    }

    #[test]
    fn test_read_dir_missing() {
        let result = StdFs.read_dir(Path::new("/nonexistent/wtf-sync/dir"));
        assert!(result.is_err());
    }
}
