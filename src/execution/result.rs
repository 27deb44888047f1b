//! Outcome of a sandboxed run.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::config::TIMEOUT_EXIT_CODE;

/// How the container finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The container exited on its own with this status code.
    Exited(i64),
    /// The watchdog killed the container.
    TimedOut,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exited(code) => write!(f, "exited with code {code}"),
            Termination::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Result of running one script. Produced once per run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    /// Container exit code, or 124 on timeout.
    pub exit_code: i64,
    /// Wall-clock time from container start to completion.
    pub duration: Duration,
    /// Whether the watchdog killed the container.
    pub timed_out: bool,
    /// Combined stdout and stderr captured during the run.
    pub output: String,
    /// Runtime the script ran under.
    pub language: String,
    /// Image the container ran from.
    pub image: String,
}

impl ExecutionResult {
    /// Result of a container that exited on its own.
    pub fn exited(
        exit_code: i64,
        duration: Duration,
        output: String,
        language: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            exit_code,
            duration,
            timed_out: false,
            output,
            language: language.into(),
            image: image.into(),
        }
    }

    /// Result of a container killed by the watchdog.
    pub fn timed_out(
        duration: Duration,
        output: String,
        language: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            exit_code: TIMEOUT_EXIT_CODE,
            duration,
            timed_out: true,
            output,
            language: language.into(),
            image: image.into(),
        }
    }

    pub fn termination(&self) -> Termination {
        if self.timed_out {
            Termination::TimedOut
        } else {
            Termination::Exited(self.exit_code)
        }
    }

    /// Returns true if the script exited with code 0 before the timeout.
    pub fn is_success(&self) -> bool {
        self.termination() == Termination::Exited(0)
    }

    /// Exit code for the safebox process itself.
    ///
    /// Codes outside 0..=255 cannot be reported by a process and map to 1.
    pub fn process_exit_code(&self) -> i32 {
        match self.termination() {
            Termination::TimedOut => TIMEOUT_EXIT_CODE as i32,
            Termination::Exited(code) if (0..=255).contains(&code) => code as i32,
            Termination::Exited(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exited_result() {
        let result = ExecutionResult::exited(3, Duration::from_secs(1), "x".into(), "bash", "bash:5");
        assert!(!result.timed_out);
        assert_eq!(result.termination(), Termination::Exited(3));
        assert!(!result.is_success());
        assert_eq!(result.process_exit_code(), 3);
    }

    #[test]
    fn test_timed_out_result_uses_sentinel() {
        let result = ExecutionResult::timed_out(Duration::from_secs(2), String::new(), "bash", "bash:5");
        assert_eq!(result.exit_code, 124);
        assert_eq!(result.termination(), Termination::TimedOut);
        assert_eq!(result.process_exit_code(), 124);
        assert_eq!(result.termination().to_string(), "timed out");
    }

    #[test]
    fn test_out_of_range_exit_codes() {
        let negative = ExecutionResult::exited(-1, Duration::ZERO, String::new(), "go", "golang");
        assert_eq!(negative.process_exit_code(), 1);
        let huge = ExecutionResult::exited(300, Duration::ZERO, String::new(), "go", "golang");
        assert_eq!(huge.process_exit_code(), 1);
    }

    #[test]
    fn test_success() {
        let ok = ExecutionResult::exited(0, Duration::ZERO, String::new(), "python", "python:3.12-slim");
        assert!(ok.is_success());
        assert_eq!(ok.termination().to_string(), "exited with code 0");
    }
}
