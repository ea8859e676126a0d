//! # docset-core
//!
//! Content pipeline for docset documentation sites.
//!
//! This crate validates the frontmatter of a markdown content root into a
//! collection, renders page bodies through the markdown plugin chain, and
//! resolves pages, prerender entries and sidebars for the server and the
//! static build.

pub mod collection;
pub mod config;
pub mod frontmatter;
pub mod markdown;
pub mod models;
pub mod registry;
pub mod sidebar;
pub mod site;
pub mod slug;

pub use collection::{Collection, CollectionError, RawDoc, ValidationIssue};
pub use config::Config;
pub use markdown::{MarkdownProcessor, RenderContext, RenderedDoc};
pub use models::{
    DocEntry, LayoutData, NamedLink, PrerenderEntry, ResolvedDoc, SidebarGroup, SidebarLink,
    SidebarLinks,
};
pub use registry::ResolveError;
pub use sidebar::{build_sidebar, Partition};
pub use site::{Site, SiteError, SiteHandle};
pub use slug::{convert_to_href, slug_from_path, slugify};
