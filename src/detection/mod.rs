//! Runtime detection for scripts.
//!
//! Resolution order, first success wins:
//! 1. explicit `--language` override (aliases resolved, never validated here)
//! 2. file extension
//! 3. shebang line

pub mod extension;
pub mod shebang;

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::config::canonical_language;
use crate::error::DetectionError;

pub use extension::detect_by_extension;
pub use shebang::{detect_by_shebang, language_from_shebang};

/// Which strategy resolved the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    Override,
    Extension,
    Shebang,
}

impl fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionSource::Override => write!(f, "override"),
            DetectionSource::Extension => write!(f, "extension"),
            DetectionSource::Shebang => write!(f, "shebang"),
        }
    }
}

/// Canonical language a script runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeIdentity {
    name: String,
    source: DetectionSource,
}

impl RuntimeIdentity {
    pub fn new(name: impl Into<String>, source: DetectionSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> DetectionSource {
        self.source
    }
}

impl fmt::Display for RuntimeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Determines the runtime for `script`.
///
/// A non-blank `language_override` is returned unconditionally after alias
/// resolution, so unknown names only fail later when no image exists.
pub fn detect(
    script: &Path,
    language_override: Option<&str>,
) -> Result<RuntimeIdentity, DetectionError> {
    if let Some(lang) = language_override.filter(|l| !l.trim().is_empty()) {
        return Ok(RuntimeIdentity::new(
            canonical_language(lang),
            DetectionSource::Override,
        ));
    }

    if let Some(lang) = detect_by_extension(script) {
        debug!(script = %script.display(), language = lang, "Detected language by extension");
        return Ok(RuntimeIdentity::new(lang, DetectionSource::Extension));
    }

    if let Some(lang) = detect_by_shebang(script) {
        debug!(script = %script.display(), language = lang, "Detected language by shebang");
        return Ok(RuntimeIdentity::new(lang, DetectionSource::Shebang));
    }

    Err(DetectionError::Undetectable {
        script: script
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| script.display().to_string()),
    })
}
