//! Static runtime configuration and the user-level settings directory.

pub mod runtimes;
pub mod settings;

pub use runtimes::{
    canonical_language, entrypoint_for, image_for, runtime, supported_languages, RuntimeSpec,
    DEFAULT_CPUS, DEFAULT_MEMORY, DEFAULT_PIDS_LIMIT, DEFAULT_TIMEOUT_SECS, RUNTIMES,
    SANDBOX_DIR, TIMEOUT_EXIT_CODE,
};
pub use settings::{ResourceDefaults, SafeboxHome, UserConfig};
