//! Plain-text rendering of run information.
//!
//! Every function returns the text instead of printing it so the console
//! sink and the tests share one implementation.

use std::time::Duration;

use crate::execution::resources::ExecutionLimits;
use crate::execution::result::ExecutionResult;

/// Renders a two-column block with a title line.
fn block(title: &str, rows: &[(&str, String)]) -> String {
    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let mut out = format!("── {title} ──\n");
    for (key, value) in rows {
        out.push_str(&format!("  {key:<width$}  {value}\n"));
    }
    out
}

/// Script, language and image chosen for a run.
pub fn detection_summary(script: &str, language: &str, image: &str) -> String {
    block(
        "Detection",
        &[
            ("Script", script.to_string()),
            ("Language", language.to_string()),
            ("Image", image.to_string()),
        ],
    )
}

/// Resource limits applied to a run.
pub fn resources_summary(limits: &ExecutionLimits, remove: bool) -> String {
    block(
        "Resources",
        &[
            ("Memory", limits.memory.to_string()),
            ("CPUs", limits.cpus.to_string()),
            ("Timeout", format!("{}s", limits.timeout_seconds)),
            ("PIDs limit", limits.pids_limit.to_string()),
            ("Auto-remove", remove.to_string()),
        ],
    )
}

/// Final status line of a run.
pub fn result_banner(result: &ExecutionResult) -> String {
    if result.timed_out {
        return format!("⏱  TIMED OUT after {:.1}s", result.duration.as_secs_f64());
    }
    if result.exit_code == 0 {
        format!("✓ PASSED  {:.2}s", result.duration.as_secs_f64())
    } else {
        format!(
            "✗ FAILED (exit code {})  {:.2}s",
            result.exit_code,
            result.duration.as_secs_f64()
        )
    }
}

/// Notice printed when the watchdog kills a container.
pub fn timeout_notice(limit: Duration) -> String {
    format!(
        "⏱  Timeout! Container exceeded {}s limit, killing…",
        limit.as_secs()
    )
}

/// One-line error message.
pub fn error_line(message: &str) -> String {
    format!("✗ Error: {message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exit_code: i64, timed_out: bool) -> ExecutionResult {
        ExecutionResult {
            exit_code,
            duration: Duration::from_millis(1234),
            timed_out,
            output: String::new(),
            language: "python".to_string(),
            image: "python:3.12-slim".to_string(),
        }
    }

    #[test]
    fn test_detection_summary() {
        let text = detection_summary("hello.py", "python", "python:3.12-slim");
        assert!(text.starts_with("── Detection ──"));
        assert!(text.contains("Script    hello.py"));
        assert!(text.contains("Language  python"));
        assert!(text.contains("Image     python:3.12-slim"));
    }

    #[test]
    fn test_resources_summary() {
        let limits = ExecutionLimits::default();
        let text = resources_summary(&limits, true);
        assert!(text.contains("256m"));
        assert!(text.contains("60s"));
        assert!(text.contains("Auto-remove  true"));
    }

    #[test]
    fn test_result_banners() {
        assert_eq!(result_banner(&result(0, false)), "✓ PASSED  1.23s");
        assert_eq!(
            result_banner(&result(2, false)),
            "✗ FAILED (exit code 2)  1.23s"
        );
        assert_eq!(result_banner(&result(124, true)), "⏱  TIMED OUT after 1.2s");
    }

    #[test]
    fn test_error_line() {
        assert_eq!(error_line("boom"), "✗ Error: boom");
    }
}
