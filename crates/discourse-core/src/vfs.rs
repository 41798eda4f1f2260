use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Abstract interface for file system operations.
pub trait FileSystem: Send + Sync {
    /// Read the entire contents of a file into a string.
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;

    /// Replace the contents of a file, creating it (and missing parents) if needed.
    fn write(&self, path: &Path, content: &str) -> std::io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// List all files with the given extension under the root directory.
    /// This should be a recursive search; directories named in `skip_dirs` are not entered.
    fn list_files(&self, root: &Path, extension: &str, skip_dirs: &[String]) -> Vec<PathBuf>;
}

/// Standard implementation of FileSystem using std::fs and walkdir.
pub struct PhysicalFileSystem;

impl FileSystem for PhysicalFileSystem {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn list_files(&self, root: &Path, extension: &str, skip_dirs: &[String]) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !skip_dirs
                        .iter()
                        .any(|skip| entry.file_name().to_string_lossy() == skip.as_str())
            });

        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext == extension {
                        files.push(path.to_path_buf());
                    }
                }
            }
        }

        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_files_skips_ignored_directories() {
        let temp_dir = TempDir::new().unwrap();
        let fs = PhysicalFileSystem;

        fs.write(&temp_dir.path().join("a.md"), "a").unwrap();
        fs.write(&temp_dir.path().join("nested/b.md"), "b").unwrap();
        fs.write(&temp_dir.path().join(".obsidian/c.md"), "c").unwrap();
        fs.write(&temp_dir.path().join("nested/d.txt"), "d").unwrap();

        let files = fs.list_files(temp_dir.path(), "md", &[".obsidian".to_string()]);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(temp_dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(names, vec![PathBuf::from("a.md"), PathBuf::from("nested/b.md")]);
    }
}
