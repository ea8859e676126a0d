//! Discovery of content modules and their lazy, memoized rendering.

use crate::frontmatter::strip_frontmatter;
use crate::markdown::{MarkdownProcessor, RenderContext, RenderedDoc};
use crate::slug::{module_key, slug_from_path, MARKDOWN_EXTENSION};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("No document for slug {0:?}")]
    NotFound(String),

    #[error("Failed to load {path:?}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound(_))
    }
}

/// A markdown file found under the content root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Module key (`/content/svelte/introduction.md`)
    pub key: String,
    pub source: PathBuf,
}

/// Find every markdown file below `content_dir`, in file-name order
pub fn discover_markdown_files(content_dir: &Path) -> std::io::Result<Vec<DiscoveredFile>> {
    if !content_dir.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("content directory {:?} does not exist", content_dir),
        ));
    }

    let extension = MARKDOWN_EXTENSION.trim_start_matches('.');
    let mut files = Vec::new();

    for entry in WalkDir::new(content_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        if entry.path().extension().is_some_and(|ext| ext == extension) {
            let rel = entry
                .path()
                .strip_prefix(content_dir)
                .unwrap_or(entry.path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            tracing::debug!("Discovered {}", rel);
            files.push(DiscoveredFile {
                key: module_key(&rel),
                source: entry.path().to_path_buf(),
            });
        }
    }

    Ok(files)
}

/// A content module: its key plus a lazily rendered body
#[derive(Debug)]
pub struct DocModule {
    key: String,
    source: PathBuf,
    rendered: OnceCell<Arc<RenderedDoc>>,
}

impl DocModule {
    pub fn new(key: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            source: source.into(),
            rendered: OnceCell::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn slug(&self) -> String {
        slug_from_path(&self.key)
    }

    pub fn is_loaded(&self) -> bool {
        self.rendered.initialized()
    }

    /// Read and render the module on first use; later calls reuse the result.
    ///
    /// `content_dir` bounds the files its code blocks may import.
    pub async fn load(
        &self,
        processor: &MarkdownProcessor,
        content_dir: &Path,
    ) -> Result<Arc<RenderedDoc>, ResolveError> {
        self.rendered
            .get_or_try_init(|| async {
                let content = tokio::fs::read_to_string(&self.source)
                    .await
                    .map_err(|source| ResolveError::Load {
                        path: self.source.clone(),
                        source,
                    })?;
                tracing::debug!("Rendering {}", self.key);
                let ctx = RenderContext::for_document(&self.source, content_dir);
                Ok(Arc::new(processor.render_with(strip_frontmatter(&content), &ctx)))
            })
            .await
            .cloned()
    }
}

/// Every discovered module, in discovery order
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<DocModule>,
}

impl ModuleRegistry {
    pub fn from_files(files: &[DiscoveredFile]) -> Self {
        Self {
            modules: files
                .iter()
                .map(|f| DocModule::new(f.key.clone(), f.source.clone()))
                .collect(),
        }
    }

    /// First module whose normalized key equals `slug`
    pub fn find(&self, slug: &str) -> Option<&DocModule> {
        self.modules.iter().find(|m| slug_from_path(&m.key) == slug)
    }

    pub fn modules(&self) -> &[DocModule] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_discovery_is_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("svelte")).unwrap();
        fs::create_dir_all(dir.path().join("kit")).unwrap();
        fs::write(dir.path().join("svelte/b.md"), "").unwrap();
        fs::write(dir.path().join("svelte/a.md"), "").unwrap();
        fs::write(dir.path().join("kit/routing.md"), "").unwrap();
        fs::write(dir.path().join("kit/notes.txt"), "").unwrap();

        let files = discover_markdown_files(dir.path()).unwrap();
        let keys: Vec<_> = files.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "/content/kit/routing.md",
                "/content/svelte/a.md",
                "/content/svelte/b.md"
            ]
        );
    }

    #[test]
    fn test_missing_content_dir_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(discover_markdown_files(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_find_matches_normalized_key() {
        let registry = ModuleRegistry::from_files(&[DiscoveredFile {
            key: "/content/kit/routing.md".into(),
            source: PathBuf::from("routing.md"),
        }]);
        assert!(registry.find("kit/routing").is_some());
        assert!(registry.find("routing").is_none());
        assert!(registry.find("kit/routing.md").is_none());
    }

    #[tokio::test]
    async fn test_load_is_memoized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page.md");
        fs::write(&path, "---\ntitle: x\n---\n# Page\n").unwrap();

        let module = DocModule::new("/content/page.md", &path);
        let processor = MarkdownProcessor::new();
        assert!(!module.is_loaded());

        let first = module.load(&processor, dir.path()).await.unwrap();
        assert!(first.html.contains(r#"<h1 id="page">"#));
        assert!(!first.html.contains("title: x"));

        // The file is gone but the memoized render is still served
        fs::remove_file(&path).unwrap();
        let second = module.load(&processor, dir.path()).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let module = DocModule::new("/content/gone.md", "/definitely/not/here.md");
        let err = module.load(&MarkdownProcessor::new(), Path::new("/definitely")).await.unwrap_err();
        assert!(!err.is_not_found());
    }
}
