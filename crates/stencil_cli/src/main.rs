//! Stencil CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or missing path
//! - 3: Invalid custom templates source
//! - 4: Template or render error
//! - 5: Network error

use std::process::ExitCode;

use clap::Parser;
use stencil_templates::TemplateError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const INVALID_SOURCE: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
    pub const NETWORK_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "stencil=debug"
    } else if cli.quiet {
        "stencil=error"
    } else {
        "stencil=info"
    };
    let mut filter = EnvFilter::from_default_env();
    for directive in [level, "warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let result = match cli.command {
        Commands::Generate(args) => commands::generate::execute(args, cli.config).await,
        Commands::Fetch(args) => commands::fetch::execute(args, cli.config).await,
        Commands::List(args) => commands::list::execute(args, cli.config).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

/// Map an error to its exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    let Some(err) = e.downcast_ref::<TemplateError>() else {
        return ExitCodes::GENERAL_ERROR;
    };
    match err {
        TemplateError::InvalidSource { .. } => ExitCodes::INVALID_SOURCE,
        TemplateError::NotFound(_) | TemplateError::MissingSubPath { .. } => {
            ExitCodes::INVALID_ARGS
        }
        TemplateError::TemplateNotFound { .. }
        | TemplateError::Render { .. }
        | TemplateError::Conflict(_)
        | TemplateError::DuplicateOutput(_) => ExitCodes::TEMPLATE_ERROR,
        err if err.is_network() => ExitCodes::NETWORK_ERROR,
        _ => ExitCodes::GENERAL_ERROR,
    }
}
