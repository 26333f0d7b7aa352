//! Fetch command - Populate the template cache from a repository.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use stencil_templates::TemplateSource;

#[derive(Args)]
pub struct FetchArgs {
    /// Repository URL, e.g. https://github.com/owner/repo/tree/main/templates
    url: String,

    /// Download again even if the repository is cached
    #[arg(short, long)]
    force: bool,
}

pub async fn execute(args: FetchArgs, config: Option<PathBuf>) -> Result<()> {
    let service = super::load_service(super::load_config(config.as_deref())?)?;
    info!("Fetching templates from {}", args.url);

    let dir = service
        .resolve(&TemplateSource::git(&args.url), args.force)
        .await
        .with_context(|| format!("Failed to fetch templates from {}", args.url))?;

    println!("{}", dir.display());
    Ok(())
}
