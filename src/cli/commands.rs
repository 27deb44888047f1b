//! CLI command definitions for safebox.
//!
//! `run` executes one script in a throwaway container, `languages` lists the
//! runtime table and `clean` removes leftover safebox containers.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info, warn};

use crate::config::{
    canonical_language, ResourceDefaults, SafeboxHome, DEFAULT_CPUS, DEFAULT_MEMORY,
    DEFAULT_PIDS_LIMIT, DEFAULT_TIMEOUT_SECS, RUNTIMES,
};
use crate::detection::detect;
use crate::error::{ConfigError, ExecutionError};
use crate::execution::{resolve_image, DockerClient, ExecutionLimits, Executor, RunOptions};
use crate::output::error_line;
use crate::script::ScriptReference;
use crate::validation::{load_env_file, parse_env_pair, validate_language};

/// Exit code used when the user interrupts a run.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Default log filter when neither `RUST_LOG`, `--log-level` nor `--verbose` is given.
const DEFAULT_LOG_FILTER: &str = "warn";

/// Run untrusted scripts inside resource-limited Docker containers.
#[derive(Parser, Debug)]
#[command(name = "safebox")]
#[command(about = "Run scripts inside isolated, resource-limited Docker containers")]
#[command(version)]
#[command(
    long_about = "safebox runs a script inside a throwaway Docker container with a read-only mount, \
memory, CPU and process limits, and a wall-clock timeout.\n\nExample usage:\n  safebox run hello.py\n  safebox run job.sh --timeout 5 --memory 128m -- --verbose"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Shorthand for --log-level debug.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Log filter directive requested on the command line.
    pub fn log_filter(&self) -> String {
        match (&self.log_level, self.verbose) {
            (Some(level), _) => level.clone(),
            (None, true) => "debug".to_string(),
            (None, false) => DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Available CLI subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Run a script in a sandbox container.
    Run(RunArgs),

    /// List supported languages and their images.
    #[command(alias = "langs")]
    Languages(LanguagesArgs),

    /// Remove every container created by safebox.
    Clean,
}

/// Arguments for `safebox languages`.
#[derive(Parser, Debug)]
pub struct LanguagesArgs {
    /// Output the runtime table as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `safebox run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Script to execute.
    pub script: PathBuf,

    /// Language override (skips detection).
    #[arg(short, long)]
    pub language: Option<String>,

    /// Memory limit, e.g. 256m or 1g.
    #[arg(short, long)]
    pub memory: Option<String>,

    /// CPU share in cores.
    #[arg(long)]
    pub cpus: Option<f64>,

    /// Timeout in seconds.
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Maximum number of processes in the container.
    #[arg(long)]
    pub pids_limit: Option<i64>,

    /// Remove the container after the run (default).
    #[arg(long, overrides_with = "keep")]
    pub rm: bool,

    /// Keep the container after the run.
    #[arg(long, overrides_with = "rm")]
    pub keep: bool,

    /// Image override (allows languages without a built-in image).
    #[arg(long)]
    pub image: Option<String>,

    /// Pull the image even if it exists locally.
    #[arg(long)]
    pub pull: bool,

    /// Environment variable for the script, KEY=VALUE. Repeatable.
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// File of KEY=VALUE lines. Entries given with -e take precedence.
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Arguments passed to the script.
    #[arg(last = true)]
    pub args: Vec<String>,
}

/// Parses CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Runs the parsed command and returns the process exit code.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Run(args) => run_script_command(args).await,
        Commands::Languages(args) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(RUNTIMES)?);
            } else {
                print!("{}", languages_table());
            }
            Ok(0)
        }
        Commands::Clean => run_clean_command().await,
    }
}

async fn run_script_command(args: RunArgs) -> anyhow::Result<i32> {
    let (script, options) = prepare_run(&args, &load_defaults()?)?;

    let engine = Arc::new(DockerClient::connect().await?);
    let executor = Executor::new(engine);

    tokio::select! {
        result = executor.execute(&script, &options) => {
            let result = result?;
            info!(
                exit_code = result.exit_code,
                timed_out = result.timed_out,
                "Script finished"
            );
            Ok(result.process_exit_code())
        }
        _ = wait_for_interrupt() => {
            executor.abort_active().await;
            eprintln!("\n{}", error_line("Interrupted"));
            Ok(INTERRUPTED_EXIT_CODE)
        }
    }
}

async fn run_clean_command() -> anyhow::Result<i32> {
    let engine = Arc::new(DockerClient::connect().await?);
    let removed = Executor::new(engine).clean_managed().await?;
    println!("Removed {removed} container(s)");
    Ok(0)
}

/// Resolves when Ctrl-C is pressed. Never resolves if the handler cannot
/// be installed.
async fn wait_for_interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Bootstraps `~/.safebox` and reads its `defaults` section.
///
/// A missing home directory is not an error; built-in defaults apply.
fn load_defaults() -> Result<ResourceDefaults, ConfigError> {
    let Some(home) = SafeboxHome::locate() else {
        debug!("No home directory found, using built-in defaults");
        return Ok(ResourceDefaults::default());
    };
    home.ensure_dirs()?;
    let config = home.load_config()?;
    debug!(root = %home.root().display(), defaults = ?config.defaults, "Loaded user configuration");
    Ok(config.defaults)
}

/// Checks everything that does not need the container engine: options,
/// script path, runtime detection and image resolution.
pub fn prepare_run(
    args: &RunArgs,
    defaults: &ResourceDefaults,
) -> Result<(ScriptReference, RunOptions), ExecutionError> {
    let options = build_run_options(args, defaults)?;
    let script = ScriptReference::resolve(&args.script)?;
    let runtime = detect(script.path(), options.language.as_deref())?;
    resolve_image(&runtime, options.image.as_deref())?;
    Ok((script, options))
}

/// Merges flags, config-file defaults and built-in defaults, validating
/// every value.
pub fn build_run_options(
    args: &RunArgs,
    defaults: &ResourceDefaults,
) -> Result<RunOptions, ConfigError> {
    let limits = ExecutionLimits::new(
        args.memory
            .as_deref()
            .or(defaults.memory.as_deref())
            .unwrap_or(DEFAULT_MEMORY),
        args.cpus.or(defaults.cpus).unwrap_or(DEFAULT_CPUS),
        args.timeout
            .or(defaults.timeout)
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
        args.pids_limit
            .or(defaults.pids_limit)
            .unwrap_or(DEFAULT_PIDS_LIMIT),
    )?;

    let language = match (&args.language, &args.image) {
        (Some(lang), None) => Some(validate_language(lang)?),
        (Some(lang), Some(_)) => Some(canonical_language(lang)),
        (None, _) => None,
    };

    let remove = if args.keep {
        false
    } else if args.rm {
        true
    } else {
        defaults.remove.unwrap_or(true)
    };

    Ok(RunOptions {
        language,
        image: args.image.clone(),
        limits,
        remove,
        pull: args.pull,
        extra_args: args.args.clone(),
        environment: collect_environment(args)?,
    })
}

fn collect_environment(args: &RunArgs) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut env = match &args.env_file {
        Some(path) => load_env_file(path)?,
        None => BTreeMap::new(),
    };
    for pair in &args.env {
        let (key, value) = parse_env_pair(pair)?;
        env.insert(key, value);
    }
    Ok(env)
}

/// Table of supported runtimes.
pub fn languages_table() -> String {
    let mut rows: Vec<_> = RUNTIMES.iter().collect();
    rows.sort_by_key(|r| r.name);

    let mut out = format!(
        "{:<10} {:<28} {:<20} {}\n",
        "LANGUAGE", "EXTENSIONS", "IMAGE", "ENTRYPOINT"
    );
    for runtime in rows {
        out.push_str(&format!(
            "{:<10} {:<28} {:<20} {}\n",
            runtime.name,
            runtime.extensions.join(" "),
            runtime.image,
            runtime.entrypoint
        ));
    }
    out
}
