//! Detect the language of a script from its shebang (`#!`) line.
//!
//! Recognised forms include:
//!
//! ```text
//! #!/usr/bin/python3
//! #!/usr/bin/env python3
//! #!/usr/bin/env -S python3 -u
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::config::runtimes::{runtime_for_interpreter, SHEBANG_READ_SIZE};

fn shebang_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^#!\s*",
            r"(?:(?:\S*/)?env\s+(?:-\S+\s+)*)?", // env indirection and its flags
            r"(?:\S*/)?",                        // directory prefix
            r"([A-Za-z_][A-Za-z0-9_.-]*)",       // interpreter
        ))
        .expect("shebang regex is valid")
    })
}

fn version_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\d.]+$").expect("version regex is valid"))
}

/// Reads the head of `script` and resolves its shebang to a language.
///
/// An unreadable file counts as having no shebang.
pub fn detect_by_shebang(script: &Path) -> Option<&'static str> {
    let head = match read_head(script, SHEBANG_READ_SIZE) {
        Ok(head) => head,
        Err(e) => {
            debug!(script = %script.display(), error = %e, "Could not read script for shebang detection");
            return None;
        }
    };
    let first_line = head.split(|b| *b == b'\n').next().unwrap_or_default();
    language_from_shebang(&String::from_utf8_lossy(first_line))
}

/// Resolves a single shebang line to a language.
pub fn language_from_shebang(line: &str) -> Option<&'static str> {
    let line = line.trim();
    if !line.starts_with("#!") {
        return None;
    }

    let interpreter = shebang_regex().captures(line)?.get(1)?.as_str().to_lowercase();

    // python3.12 -> python, node20 -> node
    let base = version_suffix_regex().replace(&interpreter, "");
    let base = if base.is_empty() { interpreter.as_str() } else { &base };

    runtime_for_interpreter(base)
        .or_else(|| runtime_for_interpreter(&interpreter))
        .map(|r| r.name)
}

fn read_head(path: &Path, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(limit);
    File::open(path)?.take(limit as u64).read_to_end(&mut buf)?;
    Ok(buf)
}
