//! TokenStrip CLI
//!
//! CLI tool for sanitizing URLs, inspecting the denylist and simulating
//! page loads against a persisted redirect guard.

mod state;

use std::path::Path;
use std::sync::OnceLock;

use clap::{Parser, Subcommand};
use serde::Serialize;

use tts_core::error_log::read_error_log;
use tts_core::logger::{self, LogSink, StripLogger};
use tts_core::registry::{self, TokenCategory, TRACKING_TOKENS};
use tts_core::{
    default_token_set, sanitize_with, RecordingNavigator, RunOutcome, StripperConfig, SystemClock,
    TrackingTokenStripper,
};

use crate::state::JsonFileStore;

#[derive(Parser)]
#[command(name = "tts-cli")]
#[command(about = "TokenStrip tracking token remover and tools")]
struct Cli {
    /// Log every step to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Strip tracking parameters from URLs
    Sanitize {
        /// URLs to sanitize
        #[arg(required = true)]
        urls: Vec<String>,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// List the tracking parameter denylist
    Tokens {
        /// Only show this category
        #[arg(short, long)]
        category: Option<String>,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Simulate a page load, including the redirect guard
    Run {
        /// Current page URL
        url: String,

        /// JSON file standing in for the browser's storage
        #[arg(short, long, default_value = "tts-state.json")]
        state: String,

        /// Simulate a browser without history.replaceState
        #[arg(long)]
        no_history: bool,
    },

    /// Dump the persisted error log
    Errors {
        /// JSON state file
        #[arg(short, long, default_value = "tts-state.json")]
        state: String,
    },

    /// Print the effective configuration
    Config,
}

struct StderrSink;

impl LogSink for StderrSink {
    fn write_line(&self, _level: log::Level, line: &str) {
        eprintln!("{line}");
    }
}

static LOGGER: OnceLock<StripLogger<StderrSink, SystemClock>> = OnceLock::new();

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    let logger = LOGGER.get_or_init(|| StripLogger::new(StderrSink, SystemClock, level));
    if let Err(e) = logger::install(logger) {
        eprintln!("Warning: logging disabled: {e}");
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Sanitize { urls, json } => cmd_sanitize(&urls, json),
        Commands::Tokens { category, json } => cmd_tokens(category.as_deref(), json),
        Commands::Run {
            url,
            state,
            no_history,
        } => cmd_run(&url, &state, no_history),
        Commands::Errors { state } => cmd_errors(&state),
        Commands::Config => cmd_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("Failed to encode JSON: {}", e))
}

#[derive(Serialize)]
struct SanitizeLine<'a> {
    input: &'a str,
    sanitized: Option<&'a str>,
    removed: &'a [String],
}

fn cmd_sanitize(urls: &[String], json: bool) -> Result<(), String> {
    let tokens = default_token_set();
    let reports: Vec<_> = urls
        .iter()
        .map(|url| {
            sanitize_with(url, tokens)
                .map_err(|e| format!("Failed to sanitize '{}': {}", url, e))
        })
        .collect::<Result<_, _>>()?;

    let mut lines = Vec::with_capacity(urls.len());
    for (url, report) in urls.iter().zip(&reports) {
        lines.push(SanitizeLine {
            input: url,
            sanitized: report.as_ref().map(|r| r.sanitized.as_str()),
            removed: report.as_ref().map(|r| r.removed.as_slice()).unwrap_or(&[]),
        });
    }

    if json {
        println!("{}", to_json(&lines)?);
        return Ok(());
    }

    for line in &lines {
        match line.sanitized {
            Some(clean) => println!("{}  [removed: {}]", clean, line.removed.join(", ")),
            None => println!("{}  [unchanged]", line.input),
        }
    }

    Ok(())
}

fn cmd_tokens(category: Option<&str>, json: bool) -> Result<(), String> {
    let categories: Vec<&TokenCategory> = match category {
        Some(name) => vec![registry::category(name).ok_or_else(|| format!("Unknown category '{}'", name))?],
        None => TRACKING_TOKENS.iter().collect(),
    };

    if json {
        let map: Vec<_> = categories
            .iter()
            .map(|c| serde_json::json!({ "name": c.name, "tokens": c.tokens }))
            .collect();
        println!("{}", to_json(&map)?);
        return Ok(());
    }

    for c in &categories {
        println!("{} ({})", c.name, c.tokens.len());
        for token in c.tokens {
            println!("  {}", token);
        }
    }

    if category.is_none() {
        println!();
        println!("Categories: {}", categories.len());
        println!("Tokens:     {}", default_token_set().len());
    }

    Ok(())
}

fn cmd_run(url: &str, state_path: &str, no_history: bool) -> Result<(), String> {
    let store = JsonFileStore::open(Path::new(state_path))
        .map_err(|e| format!("Failed to open state '{}': {}", state_path, e))?;

    let mut navigator = if no_history {
        RecordingNavigator::without_history()
    } else {
        RecordingNavigator::new()
    };

    let user_agent = format!("tts-cli/{}", env!("CARGO_PKG_VERSION"));
    let mut stripper =
        TrackingTokenStripper::new(StripperConfig::default(), store, SystemClock).with_user_agent(user_agent);

    let outcome = stripper.run(url, &mut navigator);
    let status = stripper.guard_status();

    match &outcome {
        RunOutcome::Unchanged => println!("Unchanged: {}", url),
        RunOutcome::Redirected { url, method } => println!("Redirected ({}): {}", method.as_str(), url),
        RunOutcome::Refused { url } => println!("Refused (redirect limit reached): {}", url),
        RunOutcome::Failed { url, reason } => println!("Failed: {} ({})", url, reason),
    }
    println!("  Guard:   {:?}", status);
    println!("  State:   {}", state_path);

    Ok(())
}

fn cmd_errors(state_path: &str) -> Result<(), String> {
    let store = JsonFileStore::open(Path::new(state_path))
        .map_err(|e| format!("Failed to open state '{}': {}", state_path, e))?;
    let config = StripperConfig::default();
    let entries = read_error_log(&store, &config.storage_keys.error_log)
        .map_err(|e| format!("Invalid error log: {}", e))?;
    println!("{}", to_json(&entries)?);
    Ok(())
}

fn cmd_config() -> Result<(), String> {
    println!("{}", to_json(&StripperConfig::default())?);
    Ok(())
}
