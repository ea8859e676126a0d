//! # docset-render
//!
//! Template rendering library for docset.
//!
//! This crate handles HTML template rendering using Askama.

pub mod templates;

use askama::Template;
use docset_core::models::{LayoutData, ResolvedDoc};
use thiserror::Error;

pub use templates::{AnchorLink, DocPageTemplate, NotFoundTemplate, RedirectTemplate, SiteChrome};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to render {template}: {source}")]
    Template {
        template: &'static str,
        #[source]
        source: askama::Error,
    },
}

fn render<T: Template>(template: &'static str, page: &T) -> Result<String, RenderError> {
    page.render()
        .map_err(|source| RenderError::Template { template, source })
}

/// Full HTML of one documentation page
pub fn render_doc_page(
    chrome: &SiteChrome,
    doc: &ResolvedDoc,
    layout: &LayoutData,
) -> Result<String, RenderError> {
    render("doc.html", &DocPageTemplate::new(chrome, doc, layout))
}

/// Page forwarding the browser to `target`
pub fn render_redirect(chrome: &SiteChrome, target: &str) -> Result<String, RenderError> {
    render(
        "redirect.html",
        &RedirectTemplate {
            site_title: chrome.site_title.clone(),
            target: target.to_string(),
        },
    )
}

pub fn render_not_found(chrome: &SiteChrome) -> Result<String, RenderError> {
    render("404.html", &NotFoundTemplate::new(chrome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docset_core::markdown::MarkdownProcessor;
    use docset_core::models::{DocEntry, NamedLink, SidebarLink, SidebarLinks};
    use std::sync::Arc;

    fn chrome() -> SiteChrome {
        SiteChrome {
            site_title: "Docs".into(),
            route_prefix: "/docs".into(),
            css_path: "/static/docset.css".into(),
            year: 2026,
        }
    }

    fn resolved() -> ResolvedDoc {
        let content = MarkdownProcessor::new().render("## Setup\n\nRun <it>.\n");
        ResolvedDoc {
            content: Arc::new(content),
            title: "Routing".into(),
            metadata: DocEntry {
                title: "Routing".into(),
                description: "Pages & layouts".into(),
                category: "Core".into(),
                order: 1.0,
                path: "kit/routing".into(),
                prev_path: Some(NamedLink {
                    label: "Introduction".into(),
                    target: "kit/introduction".into(),
                }),
                next_path: None,
                links_on_this_page: vec![NamedLink {
                    label: "Layouts".into(),
                    target: "layouts".into(),
                }],
                slug: "routing".into(),
                slug_full: "/kit/routing".into(),
            },
        }
    }

    fn layout() -> LayoutData {
        let mut sidebar_links = SidebarLinks::default();
        sidebar_links.push(
            "Core",
            SidebarLink {
                title: "Routing".into(),
                href: "routing".into(),
            },
        );
        LayoutData {
            sidebar_links,
            is_kit: true,
        }
    }

    #[test]
    fn test_doc_page_contains_navigation() {
        let html = render_doc_page(&chrome(), &resolved(), &layout()).unwrap();

        assert!(html.contains("<title>Routing | Docs</title>"));
        assert!(html.contains("docs-layout--kit"));
        assert!(html.contains(r#"<a href="/docs/kit/routing" aria-current="page">Routing</a>"#));
        assert!(html.contains(r#"href="/docs/kit/introduction""#));
        assert!(html.contains(r##"<a href="#layouts">Layouts</a>"##));
        assert!(html.contains(r#"href="/static/docset.css""#));
    }

    #[test]
    fn test_doc_page_escapes_metadata_but_not_body() {
        let html = render_doc_page(&chrome(), &resolved(), &layout()).unwrap();
        assert!(html.contains("Pages &#38; layouts") || html.contains("Pages &amp; layouts"));
        assert!(html.contains(r#"<h2 id="setup">Setup</h2>"#));
    }

    #[test]
    fn test_redirect_page() {
        let html = render_redirect(&chrome(), "/docs/kit/introduction").unwrap();
        assert!(html.contains(r#"content="0; url=/docs/kit/introduction""#));
    }

    #[test]
    fn test_not_found_links_home() {
        let html = render_not_found(&chrome()).unwrap();
        assert!(html.contains(r#"<a href="/docs">"#));
        assert!(html.contains("2026"));
    }
}
