//! Askama template definitions.

use askama::Template;
use docset_core::markdown::Heading;
use docset_core::models::{LayoutData, NamedLink, ResolvedDoc, SidebarGroup};
use docset_core::sidebar::{breadcrumbs, page_navigation, Breadcrumb, PageLink};

/// Site-wide values shared by every page
#[derive(Debug, Clone)]
pub struct SiteChrome {
    pub site_title: String,
    /// Absolute prefix doc routes are mounted under (`/docs`)
    pub route_prefix: String,
    /// Absolute path of the stylesheet
    pub css_path: String,
    pub year: i32,
}

/// An in-page anchor ("On this page")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorLink {
    pub label: String,
    pub href: String,
}

impl From<&NamedLink> for AnchorLink {
    fn from(link: &NamedLink) -> Self {
        Self {
            label: link.label.clone(),
            href: format!("#{}", link.target.trim_start_matches('#')),
        }
    }
}

/// Documentation page template
#[derive(Template)]
#[template(path = "doc.html")]
pub struct DocPageTemplate {
    // Page metadata
    pub title: String,
    pub description: String,
    pub category: String,

    // Rendered body
    pub content: String,
    pub headings: Vec<Heading>,

    // Site metadata
    pub site_title: String,
    pub css_path: String,
    pub year: i32,

    // Navigation
    pub sidebar: Vec<SidebarGroup>,
    /// Route the sidebar hrefs are relative to (`/docs/kit`)
    pub sidebar_base: String,
    pub is_kit: bool,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub on_this_page: Vec<AnchorLink>,
    pub prev: Option<PageLink>,
    pub next: Option<PageLink>,
}

impl DocPageTemplate {
    pub fn new(chrome: &SiteChrome, doc: &ResolvedDoc, layout: &LayoutData) -> Self {
        let entry = &doc.metadata;
        let navigation = page_navigation(&chrome.route_prefix, entry);

        Self {
            title: doc.title.clone(),
            description: entry.description.clone(),
            category: entry.category.clone(),
            content: doc.content.html.clone(),
            headings: doc.content.headings.clone(),
            site_title: chrome.site_title.clone(),
            css_path: chrome.css_path.clone(),
            year: chrome.year,
            sidebar: layout.sidebar_links.groups.clone(),
            sidebar_base: format!("{}/{}", chrome.route_prefix, entry.section()),
            is_kit: layout.is_kit,
            breadcrumbs: breadcrumbs(&chrome.route_prefix, &entry.path),
            on_this_page: entry.links_on_this_page.iter().map(AnchorLink::from).collect(),
            prev: navigation.prev,
            next: navigation.next,
        }
    }
}

/// Static page that forwards to another route
#[derive(Template)]
#[template(path = "redirect.html")]
pub struct RedirectTemplate {
    pub site_title: String,
    pub target: String,
}

/// 404 error page template
#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {
    pub site_title: String,
    pub css_path: String,
    pub year: i32,
    /// Where "back to the docs" points
    pub home: String,
}

impl NotFoundTemplate {
    pub fn new(chrome: &SiteChrome) -> Self {
        Self {
            site_title: chrome.site_title.clone(),
            css_path: chrome.css_path.clone(),
            year: chrome.year,
            home: if chrome.route_prefix.is_empty() {
                "/".to_string()
            } else {
                chrome.route_prefix.clone()
            },
        }
    }
}
