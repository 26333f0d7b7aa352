//! List command - Show the available template families.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stencil_templates::FamilyCatalog;

#[derive(Args)]
pub struct ListArgs {
    /// Custom templates: a local directory or a repository URL
    #[arg(long, env = "STENCIL_CUSTOM_TEMPLATES")]
    custom_templates: Option<String>,
}

pub async fn execute(args: ListArgs, config: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config.as_deref())?;
    let library = FamilyCatalog::new(&config.library_root).list();

    let service = super::load_service(config)?;
    let custom = match &args.custom_templates {
        Some(locator) => {
            let root = service
                .set_custom_templates(Some(locator), false)
                .await
                .context("Failed to set custom templates")?;
            root.map(|r| FamilyCatalog::new(r).list()).unwrap_or_default()
        }
        None => Vec::new(),
    };

    for family in &library {
        if custom.contains(family) {
            println!("{} (customized)", family);
        } else {
            println!("{}", family);
        }
    }
    for family in custom.iter().filter(|f| !library.contains(f)) {
        println!("{} (custom)", family);
    }
    Ok(())
}
