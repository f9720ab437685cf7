//! Configuration handling for slotinfer.
//!
//! Configuration comes from `slotinfer.toml` (top-level keys) or from the
//! `[tool.slotinfer]` table of `pyproject.toml`, found by searching upward
//! from the working directory. A `slotinfer.toml` wins over a
//! `pyproject.toml` in the same directory.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SlotinferError;

/// Dedicated configuration file name.
pub const CONFIG_FILE_NAME: &str = "slotinfer.toml";

/// Python project file that may carry a `[tool.slotinfer]` table.
pub const PYPROJECT_FILE_NAME: &str = "pyproject.toml";

/// slotinfer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Decorator names (plain or dotted) that mark an initializer for slot inference.
    #[serde(default = "default_decorators")]
    pub decorators: Vec<String>,

    /// Glob patterns of paths to skip during directory traversal.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Follow symbolic links during directory traversal.
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_decorators() -> Vec<String> {
    ["slots", "s", "slot.slots", "slot.s"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            decorators: default_decorators(),
            exclude: Vec::new(),
            follow_symlinks: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: Option<PyProjectTool>,
}

#[derive(Debug, Deserialize)]
struct PyProjectTool {
    #[serde(default)]
    slotinfer: Option<Config>,
}

impl Config {
    /// Parse the contents of a `slotinfer.toml` file.
    pub fn from_toml_str(content: &str) -> Result<Self, SlotinferError> {
        toml::from_str(content)
            .map_err(|e| SlotinferError::config(format!("failed to parse config: {}", e)))
    }

    /// Parse the `[tool.slotinfer]` table of a `pyproject.toml`, if present.
    pub fn from_pyproject_str(content: &str) -> Result<Option<Self>, SlotinferError> {
        let project: PyProject = toml::from_str(content)
            .map_err(|e| SlotinferError::config(format!("failed to parse pyproject: {}", e)))?;
        Ok(project.tool.and_then(|t| t.slotinfer))
    }

    /// Load configuration from a file.
    ///
    /// A file named `pyproject.toml` is read through its `[tool.slotinfer]`
    /// table (defaults if the table is absent); any other file is read as a
    /// `slotinfer.toml`.
    pub fn load(path: &Path) -> Result<Self, SlotinferError> {
        let content = fs::read_to_string(path).map_err(|e| {
            SlotinferError::config(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        if path.file_name().and_then(|n| n.to_str()) == Some(PYPROJECT_FILE_NAME) {
            Ok(Self::from_pyproject_str(&content)?.unwrap_or_default())
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Search upward from `start` for a configuration.
    ///
    /// Returns the path of the file used, or `None` with defaults when no
    /// configuration exists up to the filesystem root.
    pub fn discover(start: &Path) -> Result<(Option<PathBuf>, Self), SlotinferError> {
        let mut current = Some(start);
        while let Some(dir) = current {
            let dedicated = dir.join(CONFIG_FILE_NAME);
            if dedicated.is_file() {
                debug!(path = %dedicated.display(), "using config");
                return Ok((Some(dedicated.clone()), Self::load(&dedicated)?));
            }
            let pyproject = dir.join(PYPROJECT_FILE_NAME);
            if pyproject.is_file() {
                let content = fs::read_to_string(&pyproject).map_err(|e| {
                    SlotinferError::config(format!(
                        "failed to read {}: {}",
                        pyproject.display(),
                        e
                    ))
                })?;
                if let Some(config) = Self::from_pyproject_str(&content)? {
                    debug!(path = %pyproject.display(), "using [tool.slotinfer]");
                    return Ok((Some(pyproject), config));
                }
            }
            current = dir.parent();
        }
        Ok((None, Self::default()))
    }

    /// Compile the exclude patterns.
    pub fn exclude_set(&self) -> Result<GlobSet, SlotinferError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            let glob = Glob::new(pattern).map_err(|e| {
                SlotinferError::config(format!("invalid exclude pattern '{}': {}", pattern, e))
            })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|e| SlotinferError::config(format!("invalid exclude patterns: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_recognize_both_spellings() {
        let config = Config::default();
        assert!(config.decorators.contains(&"slots".to_string()));
        assert!(config.decorators.contains(&"slot.s".to_string()));
        assert!(!config.follow_symlinks);
    }

    #[test]
    fn dedicated_file_overrides_defaults() {
        let config = Config::from_toml_str(
            "decorators = [\"infer_slots\"]\nexclude = [\"build/**\"]\n",
        )
        .unwrap();
        assert_eq!(config.decorators, vec!["infer_slots".to_string()]);
        assert_eq!(config.exclude, vec!["build/**".to_string()]);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn pyproject_without_table_is_none() {
        let content = "[project]\nname = \"demo\"\n";
        assert_eq!(Config::from_pyproject_str(content).unwrap(), None);
    }

    #[test]
    fn pyproject_table_is_read() {
        let content = "[project]\nname = \"demo\"\n\n[tool.slotinfer]\nfollow_symlinks = true\n";
        let config = Config::from_pyproject_str(content).unwrap().unwrap();
        assert!(config.follow_symlinks);
        assert_eq!(config.decorators, default_decorators());
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = Config::from_toml_str("decorators = [").unwrap_err();
        assert!(matches!(err, SlotinferError::Config { .. }));
    }

    #[test]
    fn invalid_glob_is_config_error() {
        let config = Config {
            exclude: vec!["[".to_string()],
            ..Config::default()
        };
        assert!(config.exclude_set().is_err());
    }

    #[test]
    fn discover_walks_upward() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "decorators = [\"auto_slots\"]\n",
        )
        .unwrap();
        let nested = dir.path().join("pkg").join("sub");
        fs::create_dir_all(&nested).unwrap();

        let (path, config) = Config::discover(&nested).unwrap();
        assert_eq!(path.unwrap(), dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(config.decorators, vec!["auto_slots".to_string()]);
    }

    #[test]
    fn discover_skips_pyproject_without_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PYPROJECT_FILE_NAME), "[project]\nname = \"x\"\n").unwrap();
        let inner = dir.path().join("inner");
        fs::create_dir_all(&inner).unwrap();
        fs::write(
            inner.join(PYPROJECT_FILE_NAME),
            "[tool.slotinfer]\nexclude = [\"gen/*\"]\n",
        )
        .unwrap();

        let (path, config) = Config::discover(&inner).unwrap();
        assert_eq!(path.unwrap(), inner.join(PYPROJECT_FILE_NAME));
        assert_eq!(config.exclude, vec!["gen/*".to_string()]);
    }
}
