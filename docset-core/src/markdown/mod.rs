//! Markdown processing pipeline.
//!
//! Markdown is parsed with pulldown-cmark, headings receive ids, and the
//! event stream is lowered into a [`Tree`]. The tree then runs through the
//! plugin chain:
//!
//! 1. [`CodeImport`]
//! 2. [`RemoveIgnoreDirectives`]
//! 3. [`PreData`]
//! 4. [`PrettyCode`] with [`DocsHooks`]
//! 5. [`FigureMetadata`]
//!
//! before being serialized back to HTML.

pub mod code_import;
pub mod headings;
pub mod highlight;
pub mod plugins;
pub mod tree;

use pulldown_cmark::{Event, Options, Parser};
use serde::Serialize;

pub use code_import::CodeImport;
pub use headings::Heading;
pub use highlight::{DocsHooks, HighlightError, HighlightHooks, Highlighter, Language, PrettyCode};
pub use plugins::{FigureMetadata, PreData, RemoveIgnoreDirectives, RenderContext, TreePlugin};
pub use tree::{CodeAnnotation, Element, NodeId, Tree};

/// Output of rendering one markdown document
#[derive(Debug, Clone, Serialize)]
pub struct RenderedDoc {
    pub html: String,
    pub headings: Vec<Heading>,
}

/// Markdown processor with the documentation plugin chain
pub struct MarkdownProcessor {
    options: Options,
    plugins: Vec<Box<dyn TreePlugin>>,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        Self::with_highlighter(Highlighter::default())
    }

    pub fn with_highlighter(highlighter: Highlighter) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self {
            options,
            plugins: vec![
                Box::new(CodeImport),
                Box::new(RemoveIgnoreDirectives),
                Box::new(PreData),
                Box::new(PrettyCode::new(highlighter, DocsHooks)),
                Box::new(FigureMetadata),
            ],
        }
    }

    /// Build a processor for a theme name, failing on unknown themes
    pub fn for_theme(theme: &str) -> Result<Self, HighlightError> {
        Ok(Self::with_highlighter(Highlighter::with_theme(theme)?))
    }

    /// Names of the tree plugins in the order they run
    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Parse markdown into a tree without running any plugin
    pub fn parse(&self, markdown: &str) -> (Tree, Vec<Heading>) {
        let events: Vec<Event> = Parser::new_ext(markdown, self.options).collect();
        let (events, headings) = headings::assign_heading_ids(events);
        (Tree::from_events(events), headings)
    }

    /// Convert markdown to HTML with all plugins applied
    pub fn render(&self, markdown: &str) -> RenderedDoc {
        self.render_with(markdown, &RenderContext::default())
    }

    /// Render a document whose location is known, so code imports resolve
    pub fn render_with(&self, markdown: &str, ctx: &RenderContext) -> RenderedDoc {
        let (mut tree, headings) = self.parse(markdown);
        for plugin in &self.plugins {
            tracing::trace!(plugin = plugin.name(), "Applying tree plugin");
            plugin.transform(&mut tree, ctx);
        }

        RenderedDoc {
            html: tree.to_html(),
            headings,
        }
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}
