//! Fetch a single resolved page in structured form.

use crate::DocFormat;
use anyhow::{Context, Result};
use docset_core::{Config, Site};
use std::path::Path;

pub async fn show_doc(config_path: &Path, slug: &str, format: DocFormat) -> Result<()> {
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    let site = Site::from_config(&config).context("Failed to load content collection")?;
    let doc = site
        .resolve_by_slug(slug.trim_matches('/'))
        .await
        .with_context(|| format!("Failed to resolve {:?}", slug))?;

    match format {
        DocFormat::Json => println!("{}", serde_json::to_string_pretty(&doc)?),
        DocFormat::Html => println!("{}", doc.content.html),
    }
    Ok(())
}
