//! Filesystem helpers. Paths handed to the pure crates are relative and
//! `/`-separated regardless of platform.

use std::path::{Path, PathBuf};

use crate::error::{Result, SiteError};

/// Every file under `root`, as `(relative path, absolute path)`, sorted by
/// relative path. A missing `root` yields nothing.
pub(crate) fn collect_files(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    if root.is_dir() {
        walk(root, root, &mut files)?;
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

fn walk(root: &Path, dir: &Path, files: &mut Vec<(String, PathBuf)>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| SiteError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| SiteError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| SiteError::io(&path, e))?;
        if file_type.is_dir() {
            walk(root, &path, files)?;
        } else if file_type.is_file() {
            if let Ok(relative) = path.strip_prefix(root) {
                let relative = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                files.push((relative, path));
            }
        }
    }
    Ok(())
}

/// Immediate subdirectories of `root`, by name. A missing `root` yields
/// nothing.
pub(crate) fn subdirectories(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    if !root.is_dir() {
        return Ok(dirs);
    }
    for entry in std::fs::read_dir(root).map_err(|e| SiteError::io(root, e))? {
        let entry = entry.map_err(|e| SiteError::io(root, e))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
    }
    dirs.sort();
    Ok(dirs)
}

pub(crate) fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| SiteError::io(path, e))
}

/// Write `contents` to `out_dir/relative`, creating parent directories.
pub(crate) async fn write_output(out_dir: &Path, relative: &str, contents: &[u8]) -> Result<PathBuf> {
    let path = out_dir.join(relative);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SiteError::io(parent, e))?;
    }
    tokio::fs::write(&path, contents)
        .await
        .map_err(|e| SiteError::io(&path, e))?;
    Ok(path)
}

/// Copy every file under `from` into `to`. Returns the number of files.
pub(crate) async fn copy_dir(from: &Path, to: &Path) -> Result<usize> {
    let files = collect_files(from)?;
    for (relative, source) in &files {
        let target = to.join(relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SiteError::io(parent, e))?;
        }
        tokio::fs::copy(source, &target)
            .await
            .map_err(|e| SiteError::io(source, e))?;
    }
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_files_is_sorted_and_relative() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("blog")).unwrap();
        std::fs::write(dir.path().join("index.html"), "").unwrap();
        std::fs::write(dir.path().join("blog/[slug].html"), "").unwrap();

        let files: Vec<_> = collect_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|(rel, _)| rel)
            .collect();
        assert_eq!(files, vec!["blog/[slug].html", "index.html"]);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_files(&dir.path().join("nope")).unwrap().is_empty());
        assert!(subdirectories(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_copy_dir() {
        let from = tempfile::tempdir().unwrap();
        let to = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(from.path().join("islands")).unwrap();
        std::fs::write(from.path().join("islands/Heart.js"), "export default 1").unwrap();
        std::fs::write(from.path().join("favicon.svg"), "<svg/>").unwrap();

        assert_eq!(copy_dir(from.path(), to.path()).await.unwrap(), 2);
        assert_eq!(
            std::fs::read_to_string(to.path().join("islands/Heart.js")).unwrap(),
            "export default 1"
        );
    }
}
