//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - loads the reference dataset and model artifacts once
//! - dispatches to the CLI commands or the TUI

use std::path::Path;

use clap::Parser;

use crate::cli::{ChoiceKind, ChoicesArgs, Command, PredictArgs, RequestArgs};
use crate::domain::AppConfig;
use crate::error::AppError;

pub mod pipeline;

use pipeline::Services;

/// Log file used while the TUI owns the terminal.
const TUI_LOG_FILE: &str = "resale.log";

const SUBCOMMANDS: [&str; 5] = ["predict", "features", "choices", "tui", "help"];

/// Entry point for the `resale` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // We want `resale` and `resale --offline` to behave like `resale tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    let config = cli.common.to_config()?;

    match cli.command {
        Command::Predict(args) => {
            crate::logging::init_stderr();
            handle_predict(&config, args)
        }
        Command::Features(args) => {
            crate::logging::init_stderr();
            handle_features(&config, args)
        }
        Command::Choices(args) => {
            crate::logging::init_stderr();
            handle_choices(&config, args)
        }
        Command::Tui => {
            crate::logging::init_file(Path::new(TUI_LOG_FILE))?;
            handle_tui(&config)
        }
    }
}

fn handle_predict(config: &AppConfig, args: PredictArgs) -> Result<(), AppError> {
    let services = Services::from_config(config, true)?;
    let request = args.request.to_request();
    let output = services.predict(&request)?;

    if args.request.json {
        print_json(&output)?;
    } else {
        println!("{}", crate::report::format_prediction(&output));
    }

    if let Some(path) = &args.export {
        crate::io::export::append_prediction_csv(path, &output)?;
    }
    Ok(())
}

fn handle_features(config: &AppConfig, args: RequestArgs) -> Result<(), AppError> {
    let services = Services::from_config(config, false)?;
    let derivation = services.derive(&args.to_request())?;

    if args.json {
        print_json(&derivation)
    } else {
        println!("{}", crate::report::format_derivation(&derivation));
        Ok(())
    }
}

fn handle_choices(config: &AppConfig, args: ChoicesArgs) -> Result<(), AppError> {
    let store = crate::io::reference::ReferenceStore::load(&config.reference_csv)?;
    let values = match args.kind {
        ChoiceKind::Addresses => store.list_unique_addresses(),
        ChoiceKind::Blocks => store.list_unique_blocks(),
    };
    for v in values {
        println!("{v}");
    }
    Ok(())
}

fn handle_tui(config: &AppConfig) -> Result<(), AppError> {
    let services = Services::from_config(config, true)?;
    crate::tui::run(services)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::runtime(format!("Failed to serialize JSON output: {e}")))?;
    println!("{text}");
    Ok(())
}

/// Rewrite argv so `resale` defaults to `resale tui`.
///
/// Rules:
/// - `resale`                       -> `resale tui`
/// - `resale --offline ...`         -> `resale --offline ... tui`
/// - `resale --help/--version/-h`   -> unchanged (show top-level help/version)
/// - anything naming a subcommand   -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let rest = argv.iter().skip(1);
    let has_help_or_version = rest
        .clone()
        .any(|a| matches!(a.as_str(), "-h" | "--help" | "-V" | "--version"));
    let has_subcommand = rest.clone().any(|a| SUBCOMMANDS.contains(&a.as_str()));

    if !has_help_or_version && !has_subcommand {
        argv.push("tui".to_string());
    }
    argv
}
