//! Parsing of `KEY=VALUE` pairs and `.env`-style files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Parses a `KEY=VALUE` string. The value may be empty or contain `=`.
pub fn parse_env_pair(pair: &str) -> Result<(String, String), ConfigError> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidEnvPair(pair.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::EmptyEnvKey);
    }
    Ok((key.to_string(), value.to_string()))
}

/// Loads variables from a `.env`-style file.
///
/// Blank lines and `#` comments are skipped, an `export ` prefix is
/// tolerated and matching quotes around values are stripped.
pub fn load_env_file(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::EnvFileNotFound(path.to_path_buf()));
    }
    parse_env_content(&fs::read_to_string(path)?, path)
}

fn parse_env_content(content: &str, path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut env = BTreeMap::new();
    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::EnvFileSyntax {
            path: path.to_path_buf(),
            line: idx + 1,
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::EnvFileSyntax {
                path: path.to_path_buf(),
                line: idx + 1,
            });
        }
        env.insert(key.to_string(), unquote(value.trim()).to_string());
    }
    Ok(env)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_env_pair() {
        assert_eq!(
            parse_env_pair("FOO=bar").unwrap(),
            ("FOO".to_string(), "bar".to_string())
        );
        assert_eq!(
            parse_env_pair(" URL =a=b").unwrap(),
            ("URL".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_env_pair("EMPTY=").unwrap(),
            ("EMPTY".to_string(), String::new())
        );
    }

    #[test]
    fn test_parse_env_pair_errors() {
        assert!(matches!(
            parse_env_pair("NOVALUE"),
            Err(ConfigError::InvalidEnvPair(_))
        ));
        assert!(matches!(parse_env_pair("=x"), Err(ConfigError::EmptyEnvKey)));
    }

    #[test]
    fn test_load_env_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join(".env");
        fs::write(
            &path,
            "# comment\n\nFOO=bar\nexport TOKEN='secret value'\nQUOTED=\"x=1\"\n  SPACED = padded  \n",
        )
        .expect("write");

        let env = load_env_file(&path).expect("load");
        assert_eq!(env.len(), 4);
        assert_eq!(env["FOO"], "bar");
        assert_eq!(env["TOKEN"], "secret value");
        assert_eq!(env["QUOTED"], "x=1");
        assert_eq!(env["SPACED"], "padded");
    }

    #[test]
    fn test_load_env_file_reports_line() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join(".env");
        fs::write(&path, "A=1\n\nnot a pair\n").expect("write");

        match load_env_file(&path) {
            Err(ConfigError::EnvFileSyntax { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_env_file_missing() {
        let tmp = TempDir::new().expect("tempdir");
        assert!(matches!(
            load_env_file(&tmp.path().join("absent.env")),
            Err(ConfigError::EnvFileNotFound(_))
        ));
    }

    #[test]
    fn test_unquote_leaves_unbalanced_quotes() {
        assert_eq!(unquote("\"abc"), "\"abc");
        assert_eq!(unquote("'"), "'");
        assert_eq!(unquote("''"), "");
    }
}
