//! CLI command definitions.
//!
//! Each subcommand is a thin caller of the template engine.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stencil_templates::{EngineConfig, TemplateService};

pub mod fetch;
pub mod generate;
pub mod list;

/// Stencil - project and metadata file generator
#[derive(Parser)]
#[command(name = "stencil")]
#[command(version, about = "Stencil - project and metadata file generator")]
#[command(long_about = r#"
Stencil generates source files from template families, optionally overridden
by a custom template root on disk or in a remote repository.

COMMANDS:
  generate  → Render a template family into an output directory
  fetch     → Download a template repository into the local cache
  list      → List the available template families

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or missing path
  3 - Invalid custom templates source
  4 - Template or render error
  5 - Network error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Engine configuration file (YAML)
    #[arg(long, global = true, env = "STENCIL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate files from a template family
    Generate(generate::GenerateArgs),

    /// Fetch a template repository into the cache
    Fetch(fetch::FetchArgs),

    /// List template families
    List(list::ListArgs),
}

/// Engine configuration from a file, or from the environment.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path)),
        None => Ok(EngineConfig::from_env()),
    }
}

pub fn load_service(config: EngineConfig) -> Result<TemplateService> {
    TemplateService::new(config).context("Failed to initialize template service")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "stencil",
            "-v",
            "generate",
            "--template",
            "apextrigger",
            "--name",
            "AccountTrigger",
            "--var",
            "sobject=Account",
            "--var",
            "events=before insert",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Generate(_)));
    }

    #[test]
    fn test_parse_rejects_bad_var() {
        assert!(Cli::try_parse_from([
            "stencil", "generate", "-t", "apexclass", "-n", "A", "--var", "oops"
        ])
        .is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("stencil.yaml");
        std::fs::write(&path, "conflict_policy: fail\nrender_mode: best_effort\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.conflict_policy, stencil_templates::ConflictPolicy::Fail);
        assert!(load_config(Some(&temp.path().join("missing.yaml"))).is_err());
    }
}
