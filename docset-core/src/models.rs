//! Content model structs for doc entries, resolved pages, and navigation.

use crate::markdown::RenderedDoc;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// A label and the path or anchor it points to.
///
/// Serializes as the single-entry map it was written as in frontmatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedLink {
    pub label: String,
    pub target: String,
}

impl Serialize for NamedLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.label, &self.target)?;
        map.end()
    }
}

fn serialize_link_map<S: Serializer>(links: &[NamedLink], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(links.iter().map(|l| (&l.label, &l.target)))
}

/// Validated metadata of one documentation page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocEntry {
    pub title: String,
    pub description: String,
    pub category: String,

    /// Sidebar position within the category
    pub order: f64,

    /// Content-relative path without extension; unique per entry
    pub path: String,

    pub prev_path: Option<NamedLink>,
    pub next_path: Option<NamedLink>,

    /// In-page anchors, in frontmatter order
    #[serde(serialize_with = "serialize_link_map")]
    pub links_on_this_page: Vec<NamedLink>,

    /// `path` without its first segment
    pub slug: String,

    /// `path` with a leading slash
    pub slug_full: String,
}

impl DocEntry {
    /// First path segment (the documentation variant the page belongs to)
    pub fn section(&self) -> &str {
        self.path.split('/').next().unwrap_or("")
    }
}

/// A page resolved from its slug: rendered body plus metadata
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedDoc {
    pub content: Arc<RenderedDoc>,
    pub metadata: DocEntry,
    pub title: String,
}

/// One sidebar entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarLink {
    pub title: String,
    pub href: String,
}

/// Sidebar links of one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarGroup {
    pub category: String,
    pub links: Vec<SidebarLink>,
}

/// Categories in first-seen order, each with its ordered links.
///
/// Serializes as a category -> links map in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SidebarLinks {
    pub groups: Vec<SidebarGroup>,
}

impl Serialize for SidebarLinks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.category, &group.links)?;
        }
        map.end()
    }
}

impl SidebarLinks {
    pub fn categories(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.category.as_str()).collect()
    }

    pub fn get(&self, category: &str) -> Option<&[SidebarLink]> {
        self.groups
            .iter()
            .find(|g| g.category == category)
            .map(|g| g.links.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Append a link to its category, creating the category on first sight
    pub fn push(&mut self, category: &str, link: SidebarLink) {
        match self.groups.iter_mut().find(|g| g.category == category) {
            Some(group) => group.links.push(link),
            None => self.groups.push(SidebarGroup {
                category: category.to_string(),
                links: vec![link],
            }),
        }
    }
}

/// Data backing the docs layout
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutData {
    pub sidebar_links: SidebarLinks,
    /// Whether the request targets the second documentation variant
    pub is_kit: bool,
}

/// A route to prerender and the module backing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrerenderEntry {
    pub slug: String,
    pub module_slug: String,
}
