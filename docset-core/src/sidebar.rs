//! Sidebar, breadcrumbs and page navigation derived from the collection.

use crate::config::DocsConfig;
use crate::models::{DocEntry, NamedLink, SidebarLink, SidebarLinks};
use crate::slug::{capitalize, capitalize_docs_title_link, convert_to_href};
use serde::Serialize;

/// Split of the documentation into two variants by first path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    route_prefix: String,
    segment: String,
}

impl Partition {
    pub fn new(route_prefix: impl Into<String>, segment: impl Into<String>) -> Self {
        Self {
            route_prefix: route_prefix.into(),
            segment: segment.into(),
        }
    }

    pub fn from_config(docs: &DocsConfig) -> Self {
        Self::new(docs.route_prefix.clone(), docs.partition_segment.clone())
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Whether a request path (`/docs/kit/routing`) targets the partition
    pub fn is_active_for(&self, request_path: &str) -> bool {
        let prefix = format!("{}/{}/", self.route_prefix, self.segment);
        request_path.starts_with(&prefix)
    }

    /// Whether a doc belongs to the partition
    pub fn contains(&self, entry: &DocEntry) -> bool {
        entry.slug_full.starts_with(&format!("/{}/", self.segment))
    }
}

/// Group the entries kept by `keep` into sidebar categories.
///
/// Entries are stable-sorted by `order` (ties keep input order), then
/// grouped by category in first-seen order.
pub fn build_sidebar<'a, I, P>(entries: I, keep: P) -> SidebarLinks
where
    I: IntoIterator<Item = &'a DocEntry>,
    P: Fn(&DocEntry) -> bool,
{
    let mut kept: Vec<&DocEntry> = entries.into_iter().filter(|e| keep(*e)).collect();
    kept.sort_by(|a, b| a.order.total_cmp(&b.order));

    let mut links = SidebarLinks::default();
    for entry in kept {
        links.push(
            &entry.category,
            SidebarLink {
                title: entry.title.clone(),
                href: convert_to_href(&entry.title),
            },
        );
    }
    links
}

/// Sidebar for a request path: only the partition the path falls in
pub fn sidebar_for_request<'a, I>(entries: I, partition: &Partition, request_path: &str) -> (SidebarLinks, bool)
where
    I: IntoIterator<Item = &'a DocEntry>,
{
    let is_kit = partition.is_active_for(request_path);
    let links = build_sidebar(entries, |e| partition.contains(e) == is_kit);
    (links, is_kit)
}

/// One step of the breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub text: String,
    pub href: String,
}

/// Breadcrumb trail for a doc path (`kit/advanced/hooks`)
pub fn breadcrumbs(route_prefix: &str, path: &str) -> Vec<Breadcrumb> {
    let mut href = route_prefix.to_string();
    let mut crumbs = Vec::new();
    for (i, segment) in path.split('/').filter(|s| !s.is_empty()).enumerate() {
        href.push('/');
        href.push_str(segment);
        let text = if i == 0 {
            capitalize(segment)
        } else {
            capitalize_docs_title_link(segment).text
        };
        crumbs.push(Breadcrumb {
            text,
            href: href.clone(),
        });
    }
    crumbs
}

/// Previous/next link resolved to an absolute route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub label: String,
    pub href: String,
}

impl PageLink {
    pub fn from_named(route_prefix: &str, link: &NamedLink) -> Self {
        Self {
            label: link.label.clone(),
            href: format!("{}/{}", route_prefix, link.target.trim_start_matches('/')),
        }
    }
}

/// Prev/next navigation of one entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageNavigation {
    pub prev: Option<PageLink>,
    pub next: Option<PageLink>,
}

pub fn page_navigation(route_prefix: &str, entry: &DocEntry) -> PageNavigation {
    PageNavigation {
        prev: entry
            .prev_path
            .as_ref()
            .map(|l| PageLink::from_named(route_prefix, l)),
        next: entry
            .next_path
            .as_ref()
            .map(|l| PageLink::from_named(route_prefix, l)),
    }
}
