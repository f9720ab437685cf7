//! Python source file discovery.
//!
//! Explicit file arguments are taken as-is. Directory arguments are walked
//! recursively for `.py` files, skipping hidden directories, `__pycache__`,
//! and anything matching the configured exclude patterns (matched against the
//! path relative to the walked directory).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use tracing::trace;
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::SlotinferError;

/// Collect Python source files from files and directories.
///
/// The result is sorted and duplicate-free.
pub fn collect_python_files(
    paths: &[PathBuf],
    config: &Config,
) -> Result<Vec<PathBuf>, SlotinferError> {
    let excludes = config.exclude_set()?;
    let mut files = BTreeSet::new();

    for path in paths {
        if path.is_file() {
            files.insert(path.clone());
        } else if path.is_dir() {
            walk_directory(path, config.follow_symlinks, &excludes, &mut files)?;
        } else {
            return Err(SlotinferError::file_not_found(path.display().to_string()));
        }
    }

    Ok(files.into_iter().collect())
}

fn walk_directory(
    root: &Path,
    follow_symlinks: bool,
    excludes: &GlobSet,
    files: &mut BTreeSet<PathBuf>,
) -> Result<(), SlotinferError> {
    let walker = WalkDir::new(root)
        .follow_links(follow_symlinks)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e) && !is_excluded(root, e.path(), excludes));

    for entry in walker {
        let entry = entry.map_err(|e| {
            SlotinferError::internal(format!("failed to walk {}: {}", root.display(), e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) == Some("py") {
            trace!(path = %entry.path().display(), "found python file");
            files.insert(entry.into_path());
        }
    }
    Ok(())
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "__pycache__"
}

fn is_excluded(root: &Path, path: &Path, excludes: &GlobSet) -> bool {
    if excludes.is_empty() {
        return false;
    }
    let relative = path.strip_prefix(root).unwrap_or(path);
    !relative.as_os_str().is_empty() && excludes.is_match(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    #[test]
    fn walks_directories_for_python_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.py"));
        touch(&dir.path().join("pkg/b.py"));
        touch(&dir.path().join("pkg/readme.txt"));
        touch(&dir.path().join("pkg/__pycache__/b.cpython-312.py"));
        touch(&dir.path().join(".venv/lib/c.py"));

        let files = collect_python_files(&[dir.path().to_path_buf()], &Config::default()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("a.py"), PathBuf::from("pkg/b.py")]);
    }

    #[test]
    fn exclude_patterns_apply_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("keep.py"));
        touch(&dir.path().join("build/gen.py"));

        let config = Config {
            exclude: vec!["build".to_string()],
            ..Config::default()
        };
        let files = collect_python_files(&[dir.path().to_path_buf()], &config).unwrap();
        assert_eq!(files, vec![dir.path().join("keep.py")]);
    }

    #[test]
    fn explicit_files_are_kept_and_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("script");
        touch(&script);

        let files =
            collect_python_files(&[script.clone(), script.clone()], &Config::default()).unwrap();
        assert_eq!(files, vec![script]);
    }

    #[test]
    fn missing_path_is_file_not_found() {
        let err = collect_python_files(
            &[PathBuf::from("/definitely/not/here.py")],
            &Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SlotinferError::FileNotFound { .. }));
    }
}
