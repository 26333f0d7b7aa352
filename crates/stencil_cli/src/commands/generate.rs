//! Generate command - Render a template family into an output directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use stencil_templates::{ConflictPolicy, GenericFamily, RenderMode, TemplateOptions};

#[derive(Args)]
pub struct GenerateArgs {
    /// Template family, e.g. apexclass or project/standard
    #[arg(short, long)]
    template: String,

    /// Name of the generated artifact
    #[arg(short, long)]
    name: String,

    /// Output directory (defaults to the current directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// API version written into metadata files
    #[arg(long)]
    api_version: Option<String>,

    /// Custom templates: a local directory or a repository URL
    #[arg(long, env = "STENCIL_CUSTOM_TEMPLATES")]
    custom_templates: Option<String>,

    /// Download remote custom templates again
    #[arg(long)]
    refresh: bool,

    /// Extra template variable (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    vars: Vec<(String, String)>,

    /// Generate into a folder named after the artifact
    #[arg(long)]
    bundle: bool,

    /// Fail instead of overwriting files that differ
    #[arg(long)]
    no_force: bool,

    /// Copy templates that fail to render verbatim
    #[arg(long)]
    best_effort: bool,

    /// Print the run result as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: GenerateArgs, config: Option<PathBuf>) -> Result<()> {
    let mut config = super::load_config(config.as_deref())?;
    if args.no_force {
        config = config.conflict_policy(ConflictPolicy::Fail);
    }
    if args.best_effort {
        config = config.render_mode(RenderMode::BestEffort);
    }
    let service = super::load_service(config)?;

    if let Some(locator) = &args.custom_templates {
        service
            .set_custom_templates(Some(locator), args.refresh)
            .await
            .context("Failed to set custom templates")?;
    }

    let mut family = GenericFamily::new(&args.template)
        .name(&args.name)
        .bundle(args.bundle)
        .variable("pascal_name", to_pascal_case(&args.name));
    for (key, value) in args.vars {
        family = family.variable(key, value);
    }

    let mut options = TemplateOptions::new(family);
    if let Some(dir) = args.output_dir {
        options = options.output_dir(dir);
    }
    if let Some(version) = args.api_version {
        options = options.api_version(version);
    }

    info!("Generating {} '{}'", args.template, args.name);
    let result = service
        .generate(&options)
        .with_context(|| format!("Failed to generate {}", args.template))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", result.raw_output);
    }
    Ok(())
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Upper-cases the first letter of every word and drops the separators.
/// Inner capitals are kept, so `orderCard` becomes `OrderCard`.
fn to_pascal_case(name: &str) -> String {
    let mut pascal = String::with_capacity(name.len());
    let mut word_start = true;
    for c in name.chars() {
        if matches!(c, '_' | '-' | ' ') {
            word_start = true;
        } else if word_start {
            pascal.extend(c.to_uppercase());
            word_start = false;
        } else {
            pascal.push(c);
        }
    }
    pascal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var() {
        assert_eq!(
            parse_var("sobject=Account").unwrap(),
            ("sobject".to_string(), "Account".to_string())
        );
        assert_eq!(
            parse_var("events=before insert, after update").unwrap().1,
            "before insert, after update"
        );
        assert_eq!(parse_var("empty=").unwrap().1, "");
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=x").is_err());
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("orderCard"), "OrderCard");
        assert_eq!(to_pascal_case("order-card"), "OrderCard");
        assert_eq!(to_pascal_case("order_card list"), "OrderCardList");
        assert_eq!(to_pascal_case("--émile__x"), "ÉmileX");
        assert_eq!(to_pascal_case(""), "");
    }

    #[tokio::test]
    async fn test_generate_builtin_class() {
        let temp = tempfile::tempdir().unwrap();
        let out = temp.path().join("classes");
        let args = GenerateArgs {
            template: "apexclass".to_string(),
            name: "Invoice".to_string(),
            output_dir: Some(out.clone()),
            api_version: Some("60.0".to_string()),
            custom_templates: None,
            refresh: false,
            vars: vec![("sharing".to_string(), "without sharing".to_string())],
            bundle: false,
            no_force: false,
            best_effort: false,
            json: true,
        };

        execute(args, None).await.unwrap();

        let class = std::fs::read_to_string(out.join("Invoice.cls")).unwrap();
        assert!(class.starts_with("public without sharing class Invoice"));
        assert!(out.join("Invoice.cls-meta.xml").is_file());
    }
}
