//! Resolved reference to the script being run.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Absolute path to a script plus the file name used inside the sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptReference {
    path: PathBuf,
    name: String,
}

impl ScriptReference {
    /// Resolves `path` to an absolute path and checks that it is a regular file.
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        // Canonicalize follows symlinks so the mount points at the real file.
        let resolved = absolute
            .canonicalize()
            .map_err(|_| ConfigError::ScriptNotFound(absolute.clone()))?;
        if !resolved.is_file() {
            return Err(ConfigError::NotAFile(resolved));
        }
        Ok(Self::from_path(resolved))
    }

    /// Wraps an already-resolved path without touching the filesystem.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "script".to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the script, used as the mount leaf inside the sandbox.
    pub fn name(&self) -> &str {
        &self.name
    }
}
