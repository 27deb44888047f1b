//! Console output for sandboxed runs.
//!
//! The executor reports progress through an [`OutputSink`]. [`Console`]
//! writes to the terminal; [`MemorySink`] records everything, which is what
//! the tests use.

pub mod display;

use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use crate::execution::resources::ExecutionLimits;
use crate::execution::result::ExecutionResult;

pub use display::{
    detection_summary, error_line, resources_summary, result_banner, timeout_notice,
};

/// Receiver of everything a run wants to show the user.
pub trait OutputSink: Send + Sync {
    /// The runtime and image were resolved.
    fn detection(&self, script: &str, language: &str, image: &str);

    /// The resource limits about to be applied.
    fn resources(&self, limits: &ExecutionLimits, remove: bool);

    /// An image pull is starting.
    fn pulling(&self, image: &str);

    /// An image pull finished.
    fn pulled(&self, image: &str);

    /// A chunk of live container output, forwarded as it arrives.
    fn chunk(&self, text: &str);

    /// The watchdog fired.
    fn timed_out(&self, limit: Duration);

    /// The run finished.
    fn result(&self, result: &ExecutionResult);
}

/// Terminal output. Container output goes to stdout, status to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct Console;

impl OutputSink for Console {
    fn detection(&self, script: &str, language: &str, image: &str) {
        eprint!("{}", detection_summary(script, language, image));
    }

    fn resources(&self, limits: &ExecutionLimits, remove: bool) {
        eprintln!("{}", resources_summary(limits, remove));
    }

    fn pulling(&self, image: &str) {
        eprintln!("  ↓ Pulling image {image}…");
    }

    fn pulled(&self, image: &str) {
        eprintln!("  ✓ Image {image} ready");
    }

    fn chunk(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout must not abort the run.
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn timed_out(&self, limit: Duration) {
        eprintln!("\n{}", timeout_notice(limit));
    }

    fn result(&self, result: &ExecutionResult) {
        eprintln!("\n{}", result_banner(result));
    }
}

/// Events recorded by [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    Detection {
        script: String,
        language: String,
        image: String,
    },
    Resources,
    Pulling(String),
    Pulled(String),
    Chunk(String),
    TimedOut(Duration),
    Result { exit_code: i64, timed_out: bool },
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<OutputEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<OutputEvent> {
        self.events.lock().expect("output sink lock poisoned").clone()
    }

    /// Concatenation of every output chunk received.
    pub fn output(&self) -> String {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OutputEvent::Chunk(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: OutputEvent) {
        self.events
            .lock()
            .expect("output sink lock poisoned")
            .push(event);
    }
}

impl OutputSink for MemorySink {
    fn detection(&self, script: &str, language: &str, image: &str) {
        self.push(OutputEvent::Detection {
            script: script.to_string(),
            language: language.to_string(),
            image: image.to_string(),
        });
    }

    fn resources(&self, _limits: &ExecutionLimits, _remove: bool) {
        self.push(OutputEvent::Resources);
    }

    fn pulling(&self, image: &str) {
        self.push(OutputEvent::Pulling(image.to_string()));
    }

    fn pulled(&self, image: &str) {
        self.push(OutputEvent::Pulled(image.to_string()));
    }

    fn chunk(&self, text: &str) {
        self.push(OutputEvent::Chunk(text.to_string()));
    }

    fn timed_out(&self, limit: Duration) {
        self.push(OutputEvent::TimedOut(limit));
    }

    fn result(&self, result: &ExecutionResult) {
        self.push(OutputEvent::Result {
            exit_code: result.exit_code,
            timed_out: result.timed_out,
        });
    }
}
