//! The published documentation site: collection, module registry and the
//! resolution operations the server and the static build run against.

use crate::collection::{Collection, CollectionError, RawDoc};
use crate::config::Config;
use crate::frontmatter::split_frontmatter;
use crate::markdown::{HighlightError, MarkdownProcessor};
use crate::models::{LayoutData, PrerenderEntry, ResolvedDoc};
use crate::registry::{discover_markdown_files, ModuleRegistry, ResolveError};
use crate::sidebar::{sidebar_for_request, Partition};
use crate::slug::{route_slug, slug_from_path};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Failed to discover content in {path:?}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Highlight(#[from] HighlightError),
}

/// Immutable snapshot of the content root
pub struct Site {
    content_dir: PathBuf,
    route_prefix: String,
    partition: Partition,
    collection: Collection,
    registry: ModuleRegistry,
    processor: Arc<MarkdownProcessor>,
}

impl Site {
    /// Load the site described by a config, building its own processor
    pub fn from_config(config: &Config) -> Result<Self, SiteError> {
        let processor = Arc::new(MarkdownProcessor::for_theme(&config.highlight.theme)?);
        Self::load(config, processor)
    }

    /// Discover and validate the content root.
    ///
    /// Every markdown file is read once for its frontmatter; bodies are
    /// rendered lazily on first resolution.
    pub fn load(config: &Config, processor: Arc<MarkdownProcessor>) -> Result<Self, SiteError> {
        let content_dir = config.content_dir();
        let files = discover_markdown_files(&content_dir).map_err(|source| SiteError::Discovery {
            path: content_dir.clone(),
            source,
        })?;

        let mut raw_docs = Vec::with_capacity(files.len());
        for file in &files {
            let path = slug_from_path(&file.key);
            let content =
                std::fs::read_to_string(&file.source).map_err(|source| CollectionError::Read {
                    path: path.clone(),
                    source,
                })?;
            let (record, _) = split_frontmatter(&content).map_err(|source| {
                CollectionError::Frontmatter {
                    path: path.clone(),
                    source,
                }
            })?;
            raw_docs.push(RawDoc { path, record });
        }

        let collection = Collection::build(raw_docs)?;
        let registry = ModuleRegistry::from_files(&files);
        tracing::info!(
            "Loaded {} docs from {}",
            registry.len(),
            content_dir.display()
        );

        Ok(Self {
            content_dir,
            route_prefix: config.docs.route_prefix.clone(),
            partition: Partition::from_config(&config.docs),
            collection,
            registry,
            processor,
        })
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    pub fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn processor(&self) -> &Arc<MarkdownProcessor> {
        &self.processor
    }

    /// Resolve one page by its normalized module path (`kit/routing`)
    pub async fn resolve_by_slug(&self, slug: &str) -> Result<ResolvedDoc, ResolveError> {
        let module = self
            .registry
            .find(slug)
            .ok_or_else(|| ResolveError::NotFound(slug.to_string()))?;
        let metadata = self
            .collection
            .find_by_path(slug)
            .ok_or_else(|| ResolveError::NotFound(slug.to_string()))?
            .clone();
        let content = module.load(&self.processor, &self.content_dir).await?;

        Ok(ResolvedDoc {
            content,
            title: metadata.title.clone(),
            metadata,
        })
    }

    /// Resolve every discovered module, in discovery order
    pub async fn resolve_all(&self) -> Result<Vec<ResolvedDoc>, ResolveError> {
        let mut docs = Vec::with_capacity(self.registry.len());
        for module in self.registry.modules() {
            docs.push(self.resolve_by_slug(&module.slug()).await?);
        }
        Ok(docs)
    }

    /// Routes to prerender, one per module
    pub fn entries(&self) -> Vec<PrerenderEntry> {
        self.registry
            .modules()
            .iter()
            .map(|m| PrerenderEntry {
                slug: route_slug(m.key()),
                module_slug: m.slug(),
            })
            .collect()
    }

    /// Sidebar and partition flag for a request path
    pub async fn layout_data(&self, request_path: &str) -> Result<LayoutData, ResolveError> {
        let docs = self.resolve_all().await?;
        let (sidebar_links, is_kit) =
            sidebar_for_request(docs.iter().map(|d| &d.metadata), &self.partition, request_path);
        Ok(LayoutData {
            sidebar_links,
            is_kit,
        })
    }
}

impl std::fmt::Debug for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Site")
            .field("content_dir", &self.content_dir)
            .field("docs", &self.registry.len())
            .finish()
    }
}

/// Shared handle to the currently published site
pub struct SiteHandle {
    current: RwLock<Arc<Site>>,
}

impl SiteHandle {
    pub fn new(site: Site) -> Self {
        Self {
            current: RwLock::new(Arc::new(site)),
        }
    }

    /// The site as of now; stays valid across later republishes
    pub fn snapshot(&self) -> Arc<Site> {
        self.current.read().clone()
    }

    /// Replace the published site atomically
    pub fn republish(&self, site: Site) {
        let docs = site.registry.len();
        *self.current.write() = Arc::new(site);
        tracing::info!("Republished site with {} docs", docs);
    }
}
