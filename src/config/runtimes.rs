//! Runtime table and default limits.
//!
//! A single [`RuntimeSpec`] per language drives every lookup: extension
//! detection, shebang detection, image selection and the entrypoint used to
//! launch the script inside the sandbox.

use serde::Serialize;

/// Default memory limit passed to the container engine.
pub const DEFAULT_MEMORY: &str = "256m";
/// Default CPU share (number of cores).
pub const DEFAULT_CPUS: f64 = 1.0;
/// Default wall-clock budget in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Default maximum number of processes inside the sandbox.
pub const DEFAULT_PIDS_LIMIT: i64 = 64;

/// Directory inside the sandbox where the script is mounted.
pub const SANDBOX_DIR: &str = "/sandbox";

/// Label marking containers created by safebox.
pub const MANAGED_LABEL: &str = "safebox";
pub const MANAGED_LABEL_VALUE: &str = "true";
pub const LANGUAGE_LABEL: &str = "safebox.language";
pub const SCRIPT_LABEL: &str = "safebox.script";

/// Number of bytes read from a script when looking for a shebang.
pub const SHEBANG_READ_SIZE: usize = 512;

/// Exit code reported when a run exceeds its timeout.
pub const TIMEOUT_EXIT_CODE: i64 = 124;

/// Everything safebox knows about one language runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuntimeSpec {
    /// Canonical language name.
    pub name: &'static str,
    /// File extensions (with leading dot, lower-case).
    pub extensions: &'static [&'static str],
    /// Interpreter names recognised in a shebang line.
    pub shebang_names: &'static [&'static str],
    /// Default container image.
    pub image: &'static str,
    /// Command used to run the script inside the container.
    pub entrypoint: &'static str,
}

pub static RUNTIMES: &[RuntimeSpec] = &[
    RuntimeSpec {
        name: "python",
        extensions: &[".py", ".pyw"],
        shebang_names: &["python", "python3", "python2"],
        image: "python:3.12-slim",
        entrypoint: "python",
    },
    RuntimeSpec {
        name: "node",
        extensions: &[".js", ".mjs", ".cjs", ".ts"],
        shebang_names: &["node", "nodejs"],
        image: "node:20-slim",
        entrypoint: "node",
    },
    RuntimeSpec {
        name: "bash",
        extensions: &[".sh", ".bash", ".zsh"],
        shebang_names: &["bash", "sh", "zsh"],
        image: "bash:5",
        entrypoint: "bash",
    },
    RuntimeSpec {
        name: "ruby",
        extensions: &[".rb"],
        shebang_names: &["ruby"],
        image: "ruby:3.3-slim",
        entrypoint: "ruby",
    },
    RuntimeSpec {
        name: "go",
        extensions: &[".go"],
        shebang_names: &["go"],
        image: "golang:1.22",
        entrypoint: "go run",
    },
    RuntimeSpec {
        name: "perl",
        extensions: &[".pl", ".pm"],
        shebang_names: &["perl"],
        image: "perl:5.38-slim",
        entrypoint: "perl",
    },
];

/// Short names accepted for `--language` and their canonical form.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("js", "node"),
    ("javascript", "node"),
    ("sh", "bash"),
    ("shell", "bash"),
];

/// Looks up a runtime by its canonical name.
pub fn runtime(name: &str) -> Option<&'static RuntimeSpec> {
    RUNTIMES.iter().find(|r| r.name == name)
}

/// Looks up a runtime by file extension (`.py`, case-sensitive, lower-case expected).
pub fn runtime_for_extension(ext: &str) -> Option<&'static RuntimeSpec> {
    RUNTIMES.iter().find(|r| r.extensions.contains(&ext))
}

/// Looks up a runtime by interpreter name as written in a shebang.
pub fn runtime_for_interpreter(interpreter: &str) -> Option<&'static RuntimeSpec> {
    RUNTIMES
        .iter()
        .find(|r| r.shebang_names.contains(&interpreter))
}

/// Lower-cases and trims a language name and resolves aliases.
///
/// Unknown names are returned as-is.
pub fn canonical_language(value: &str) -> String {
    let lang = value.trim().to_lowercase();
    LANGUAGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lang)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(lang)
}

/// Default image for a language, if one is registered.
pub fn image_for(language: &str) -> Option<&'static str> {
    runtime(language).map(|r| r.image)
}

/// Entrypoint for a language. Unregistered languages use their own name.
pub fn entrypoint_for(language: &str) -> &str {
    runtime(language).map(|r| r.entrypoint).unwrap_or(language)
}

/// Sorted list of supported canonical language names.
pub fn supported_languages() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = RUNTIMES.iter().map(|r| r.name).collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_runtime_has_one_image_and_entrypoint() {
        for spec in RUNTIMES {
            assert_eq!(image_for(spec.name), Some(spec.image));
            assert_eq!(entrypoint_for(spec.name), spec.entrypoint);
            assert!(!spec.image.is_empty());
        }
    }

    #[test]
    fn test_extensions_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for spec in RUNTIMES {
            for ext in spec.extensions {
                assert!(ext.starts_with('.'), "{ext} must start with a dot");
                assert!(seen.insert(*ext), "duplicate extension {ext}");
            }
        }
    }

    #[test]
    fn test_shebang_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for spec in RUNTIMES {
            for name in spec.shebang_names {
                assert!(seen.insert(*name), "duplicate interpreter {name}");
            }
        }
    }

    #[test]
    fn test_lookups() {
        assert_eq!(runtime_for_extension(".py").map(|r| r.name), Some("python"));
        assert_eq!(runtime_for_extension(".mjs").map(|r| r.name), Some("node"));
        assert!(runtime_for_extension(".txt").is_none());
        assert_eq!(runtime_for_interpreter("zsh").map(|r| r.name), Some("bash"));
        assert!(runtime_for_interpreter("lua").is_none());
    }

    #[test]
    fn test_canonical_language_aliases() {
        assert_eq!(canonical_language("JS"), "node");
        assert_eq!(canonical_language(" shell "), "bash");
        assert_eq!(canonical_language("Python"), "python");
        assert_eq!(canonical_language("cobol"), "cobol");
    }

    #[test]
    fn test_unregistered_language_uses_own_name_as_entrypoint() {
        assert_eq!(entrypoint_for("lua"), "lua");
        assert_eq!(entrypoint_for("go"), "go run");
        assert!(image_for("lua").is_none());
    }

    #[test]
    fn test_supported_languages_sorted() {
        assert_eq!(
            supported_languages(),
            vec!["bash", "go", "node", "perl", "python", "ruby"]
        );
    }
}
