//! Build command implementation.

use anyhow::{Context, Result};
use chrono::Datelike;
use docset_core::sidebar::sidebar_for_request;
use docset_core::{Config, LayoutData, ResolvedDoc, Site};
use docset_render::{render_doc_page, render_not_found, render_redirect, SiteChrome};
use include_dir::{include_dir, Dir};
use std::fs;
use std::path::{Path, PathBuf};

// Embed static assets (CSS) at compile time
pub(crate) static STATIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

/// Route static assets are mounted under
pub(crate) const STATIC_ROUTE: &str = "/static";

/// What a build wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub pages: usize,
    pub redirects: usize,
    pub output_dir: PathBuf,
}

/// Template values derived from the config
pub(crate) fn site_chrome(config: &Config) -> SiteChrome {
    SiteChrome {
        site_title: config.site.title.clone(),
        route_prefix: config.docs.route_prefix.clone(),
        css_path: format!("{}/docset.css", STATIC_ROUTE),
        year: chrono::Utc::now().year(),
    }
}

/// Absolute route of a page slug (`kit/routing` -> `/docs/kit/routing`)
pub(crate) fn page_route(config: &Config, slug: &str) -> String {
    format!("{}/{}", config.docs.route_prefix, slug)
}

/// Build the static site
pub async fn build_site(config_path: &Path) -> Result<BuildSummary> {
    tracing::info!("Loading config from {:?}", config_path);
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    build_site_with_config(&config).await
}

/// Build the site from an already loaded config
pub async fn build_site_with_config(config: &Config) -> Result<BuildSummary> {
    tracing::info!("Building site: {}", config.site.title);

    let site = Site::from_config(config).context("Failed to load content collection")?;
    let docs = site.resolve_all().await.context("Failed to render documents")?;
    let chrome = site_chrome(config);

    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

    let mut pages = 0;
    for entry in site.entries() {
        let Some(doc) = docs.iter().find(|d| d.metadata.path == entry.module_slug) else {
            tracing::warn!("No resolved document for {}", entry.module_slug);
            continue;
        };
        let route = page_route(config, &entry.slug);
        // Index pages are served at the bare section route, which lies
        // outside its own partition; lay them out from their module path
        let layout = layout_for(&site, &docs, &page_route(config, &doc.metadata.path));
        render_page(&output_dir, &route, &chrome, doc, &layout)?;
        pages += 1;
    }

    // Redirects are written last so they win over an index page on the same route
    for redirect in &config.docs.redirects {
        let html = render_redirect(&chrome, &redirect.to)?;
        write_route(&output_dir, &redirect.from, &html)?;
        tracing::debug!("Redirect {} -> {}", redirect.from, redirect.to);
    }

    let not_found = render_not_found(&chrome)?;
    fs::write(output_dir.join("404.html"), not_found).context("Failed to write 404.html")?;

    generate_sidebar_json(&site, &docs, &output_dir)?;
    extract_embedded_static(&output_dir.join(STATIC_ROUTE.trim_start_matches('/')))?;

    tracing::info!("✓ Built {} pages", pages);
    tracing::info!("✓ Output written to {:?}", output_dir);

    Ok(BuildSummary {
        pages,
        redirects: config.docs.redirects.len(),
        output_dir,
    })
}

fn layout_for(site: &Site, docs: &[ResolvedDoc], route: &str) -> LayoutData {
    let (sidebar_links, is_kit) =
        sidebar_for_request(docs.iter().map(|d| &d.metadata), site.partition(), route);
    LayoutData {
        sidebar_links,
        is_kit,
    }
}

fn render_page(
    output_dir: &Path,
    route: &str,
    chrome: &SiteChrome,
    doc: &ResolvedDoc,
    layout: &LayoutData,
) -> Result<()> {
    let html = render_doc_page(chrome, doc, layout)
        .with_context(|| format!("Failed to render {}", route))?;
    write_route(output_dir, route, &html)?;
    tracing::debug!("Rendered {}", route);
    Ok(())
}

/// Write `html` to `<output>/<route>/index.html`
fn write_route(output_dir: &Path, route: &str, html: &str) -> Result<()> {
    let dir = output_dir.join(route.trim_matches('/'));
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {:?}", dir))?;
    let target = dir.join("index.html");
    fs::write(&target, html).with_context(|| format!("Failed to write {:?}", target))?;
    Ok(())
}

/// Sidebar of both documentation variants, keyed by variant
fn generate_sidebar_json(site: &Site, docs: &[ResolvedDoc], output_dir: &Path) -> Result<()> {
    let partition = site.partition();
    let entries = || docs.iter().map(|d| &d.metadata);
    let default = docset_core::build_sidebar(entries(), |e| !partition.contains(e));
    let partitioned = docset_core::build_sidebar(entries(), |e| partition.contains(e));

    let mut sidebars = serde_json::Map::new();
    sidebars.insert("default".into(), serde_json::to_value(&default)?);
    sidebars.insert(partition.segment().to_string(), serde_json::to_value(&partitioned)?);

    let path = output_dir.join("sidebar.json");
    fs::write(&path, serde_json::to_string_pretty(&sidebars)?)
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

fn extract_embedded_static(dest: &Path) -> Result<()> {
    for entry in STATIC_ASSETS.entries() {
        extract_entry(entry, dest)?;
    }
    Ok(())
}

fn extract_entry(entry: &include_dir::DirEntry, dest: &Path) -> Result<()> {
    match entry {
        include_dir::DirEntry::Dir(dir) => {
            for sub_entry in dir.entries() {
                extract_entry(sub_entry, dest)?;
            }
        }
        include_dir::DirEntry::File(file) => {
            let target = dest.join(file.path());
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, file.contents())
                .with_context(|| format!("Failed to write embedded static file to {:?}", target))?;
        }
    }
    Ok(())
}
