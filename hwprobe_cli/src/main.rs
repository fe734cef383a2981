//! # hwprobe CLI
//!
//! Loads a probe config, evaluates it against the live system and prints
//! the JSON report. Exit codes distinguish config syntax errors from
//! probe-tree construction failures.

use clap::Parser;
use hwprobe_core::config::ConfigError;
use hwprobe_core::{Context, FunctionRegistry, ProbeConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const EXIT_SYNTAX_ERROR: u8 = 2;
const EXIT_BUILD_ERROR: u8 = 3;

#[derive(Parser)]
#[command(name = "hwprobe", version, about = "Evaluate hardware probe configs")]
struct Cli {
    /// Path to the probe config JSON file
    #[arg(long, short)]
    config: PathBuf,

    /// Only evaluate the given categories (default: all)
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let registry = Arc::new(FunctionRegistry::with_builtins());

    let config = match ProbeConfig::from_file(&cli.config, &registry) {
        Ok(config) => config,
        Err(e @ ConfigError::Io { .. }) | Err(e @ ConfigError::Syntax(_)) => {
            eprintln!("hwprobe: {}", e);
            return ExitCode::from(EXIT_SYNTAX_ERROR);
        }
        Err(e) => {
            eprintln!("hwprobe: {}", e);
            return ExitCode::from(EXIT_BUILD_ERROR);
        }
    };

    log::info!(
        "loaded probe config with categories: {:?}",
        config.category_names()
    );

    let ctx = Context::new(registry);
    let selected: Vec<&str> = cli.categories.iter().map(String::as_str).collect();
    let report = if selected.is_empty() {
        config.eval(&ctx, None)
    } else {
        config.eval(&ctx, Some(&selected))
    };

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string())
    } else {
        report.to_string()
    };
    println!("{}", rendered);

    ExitCode::SUCCESS
}
