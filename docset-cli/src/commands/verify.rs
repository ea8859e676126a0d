//! Verify the content collection and emit diagnostics.

use anyhow::{bail, Context, Result};
use docset_core::{
    build_sidebar, CollectionError, Config, ResolvedDoc, Site, SiteError, ValidationIssue,
};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub path: Option<String>,
    pub message: String,
}

#[derive(Serialize)]
struct VerificationSummary<'a> {
    docs: usize,
    errors: usize,
    warnings: usize,
    diagnostics: &'a [Diagnostic],
}

/// Load and render every page without writing output; fail on errors.
pub async fn verify_site(config_path: &Path, json: bool) -> Result<()> {
    let config = Config::from_file(config_path).context("Failed to load configuration")?;

    let (docs, diagnostics) = match Site::from_config(&config) {
        Ok(site) => {
            let docs = site
                .resolve_all()
                .await
                .context("Failed to render documents")?;
            let diagnostics = check_docs(&site, &docs);
            (docs.len(), diagnostics)
        }
        Err(SiteError::Collection(CollectionError::Validation { issues })) => {
            (0, issues.iter().map(schema_diagnostic).collect())
        }
        Err(err) => return Err(err).context("Failed to load content collection"),
    };

    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = diagnostics.len() - errors;

    let summary = VerificationSummary {
        docs,
        errors,
        warnings,
        diagnostics: &diagnostics,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Verification complete: {} docs, {} errors, {} warnings",
            summary.docs, errors, warnings
        );
        for diag in &diagnostics {
            let path = diag
                .path
                .as_deref()
                .map(|p| format!(" [{}]", p))
                .unwrap_or_default();
            println!("- {:?} {}{}: {}", diag.severity, diag.code, path, diag.message);
        }
    }

    if errors > 0 {
        bail!("{} error(s) found", errors);
    }
    Ok(())
}

fn schema_diagnostic(issue: &ValidationIssue) -> Diagnostic {
    Diagnostic {
        severity: Severity::Error,
        code: "schema",
        path: Some(issue.path.clone()),
        message: format!("`{}` {}", issue.field, issue.message),
    }
}

/// Cross-page checks on a valid collection
fn check_docs(site: &Site, docs: &[ResolvedDoc]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let paths: HashSet<&str> = docs.iter().map(|d| d.metadata.path.as_str()).collect();

    for doc in docs {
        let entry = &doc.metadata;
        for (field, link) in [("prevPath", &entry.prev_path), ("nextPath", &entry.next_path)] {
            if let Some(link) = link {
                if !paths.contains(link.target.trim_start_matches('/')) {
                    diagnostics.push(Diagnostic {
                        severity: Severity::Warning,
                        code: "broken-nav-link",
                        path: Some(entry.path.clone()),
                        message: format!("{} points to unknown page {:?}", field, link.target),
                    });
                }
            }
        }

        let anchors: HashSet<&str> = doc.content.headings.iter().map(|h| h.id.as_str()).collect();
        for link in &entry.links_on_this_page {
            if !anchors.contains(link.target.trim_start_matches('#')) {
                diagnostics.push(Diagnostic {
                    severity: Severity::Warning,
                    code: "missing-anchor",
                    path: Some(entry.path.clone()),
                    message: format!("no heading with id {:?} for {:?}", link.target, link.label),
                });
            }
        }
    }

    // Sidebar hrefs derive from titles only, so report collisions per variant
    let partition = site.partition();
    for in_partition in [false, true] {
        let sidebar = build_sidebar(docs.iter().map(|d| &d.metadata), |e| {
            partition.contains(e) == in_partition
        });
        let mut seen = HashSet::new();
        for link in sidebar.groups.iter().flat_map(|g| &g.links) {
            if !seen.insert(link.href.as_str()) {
                diagnostics.push(Diagnostic {
                    severity: Severity::Warning,
                    code: "href-collision",
                    path: None,
                    message: format!("sidebar href {:?} is shared by several pages", link.href),
                });
            }
        }
    }

    diagnostics
}
