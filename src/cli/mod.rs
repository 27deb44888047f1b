//! Command-line interface for safebox.
//!
//! Provides the `run`, `languages` and `clean` commands.

mod commands;

pub use commands::{
    build_run_options, languages_table, parse_cli, prepare_run, run_with_cli, Cli, Commands,
    LanguagesArgs, RunArgs, INTERRUPTED_EXIT_CODE,
};
