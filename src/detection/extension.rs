//! Detect the language of a script from its file extension.

use std::path::Path;

use crate::config::runtimes::runtime_for_extension;

/// Returns the canonical language for the extension of `script`, if known.
pub fn detect_by_extension(script: &Path) -> Option<&'static str> {
    let ext = script.extension()?.to_str()?.to_lowercase();
    runtime_for_extension(&format!(".{ext}")).map(|r| r.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(detect_by_extension(Path::new("hello.py")), Some("python"));
        assert_eq!(detect_by_extension(Path::new("app.ts")), Some("node"));
        assert_eq!(detect_by_extension(Path::new("build.sh")), Some("bash"));
        assert_eq!(detect_by_extension(Path::new("main.go")), Some("go"));
        assert_eq!(detect_by_extension(Path::new("lib/Foo.pm")), Some("perl"));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert_eq!(detect_by_extension(Path::new("HELLO.PY")), Some("python"));
        assert_eq!(detect_by_extension(Path::new("script.Rb")), Some("ruby"));
    }

    #[test]
    fn test_unknown_or_missing_extension() {
        assert_eq!(detect_by_extension(Path::new("notes.txt")), None);
        assert_eq!(detect_by_extension(Path::new("runme")), None);
        assert_eq!(detect_by_extension(Path::new(".py")), None);
    }
}
