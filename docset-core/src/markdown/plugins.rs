//! Tree plugins applied to every rendered document.
//!
//! Each plugin scans the tree for one kind of node and rewrites only the
//! nodes that match. A node with an unexpected shape is skipped, never
//! reported: those are ordinary states of a document, not failures.

use super::code_import::SRC_PROPERTY;
use super::tree::{CodeAnnotation, NodeId, Tree};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Where the document being rendered lives
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    /// Directory of the source file; relative code imports resolve here
    pub source_dir: Option<PathBuf>,
    /// Content root; code imports may not escape it
    pub root_dir: Option<PathBuf>,
}

impl RenderContext {
    pub fn for_document(source: &Path, root: &Path) -> Self {
        Self {
            source_dir: source.parent().map(Path::to_path_buf),
            root_dir: Some(root.to_path_buf()),
        }
    }
}

/// A transform over the document tree
pub trait TreePlugin: Send + Sync {
    fn name(&self) -> &'static str;

    fn transform(&self, tree: &mut Tree, ctx: &RenderContext);
}

/// Property a host may set on a `pre` to style the code container
pub const STYLE_PROPERTY: &str = "__style__";

/// Marker lines that keep the formatter away from a code sample
pub const IGNORE_DIRECTIVES: [&str; 2] = ["<!-- prettier-ignore -->\n", "// prettier-ignore\n"];

/// Remove every ignore-directive line from code text.
///
/// Runs to a fixpoint so removing one marker can never leave another one
/// behind; applying it twice is the same as applying it once.
pub fn strip_ignore_directives(code: &str) -> String {
    let mut out = code.to_string();
    while IGNORE_DIRECTIVES.iter().any(|d| out.contains(d)) {
        for directive in IGNORE_DIRECTIVES {
            out = out.replace(directive, "");
        }
    }
    out
}

/// Strips ignore directives from the text of every `code` element
pub struct RemoveIgnoreDirectives;

impl TreePlugin for RemoveIgnoreDirectives {
    fn name(&self) -> &'static str {
        "remove-ignore-directives"
    }

    fn transform(&self, tree: &mut Tree, _ctx: &RenderContext) {
        for code in tree.find_elements("code") {
            let texts: Vec<NodeId> = tree
                .children(code)
                .iter()
                .copied()
                .filter(|c| tree.text(*c).is_some())
                .collect();
            for text_id in texts {
                if let Some(text) = tree.text_mut(text_id) {
                    let stripped = strip_ignore_directives(text);
                    *text = stripped;
                }
            }
        }
    }
}

static EVENT_REGEX: OnceLock<Regex> = OnceLock::new();

fn event_regex() -> &'static Regex {
    EVENT_REGEX.get_or_init(|| Regex::new(r#"event="([^"]*)""#).expect("event regex is valid"))
}

/// Lift an `event="..."` clause out of a fence meta string.
///
/// Returns the event value and the meta with the clause removed, or `None`
/// when the meta has no such clause.
pub fn extract_event(meta: &str) -> Option<(String, String)> {
    let captures = event_regex().captures(meta)?;
    let whole = captures.get(0)?;
    let value = captures.get(1).map_or("", |m| m.as_str()).to_string();
    let mut remaining = String::with_capacity(meta.len());
    remaining.push_str(&meta[..whole.start()]);
    remaining.push_str(&meta[whole.end()..]);
    Some((value, remaining))
}

/// Attaches a [`CodeAnnotation`] to every `pre` whose first child is `code`
pub struct PreData;

impl TreePlugin for PreData {
    fn name(&self) -> &'static str {
        "pre-data"
    }

    fn transform(&self, tree: &mut Tree, _ctx: &RenderContext) {
        for pre in tree.find_elements("pre") {
            annotate_pre(tree, pre);
        }
    }
}

fn annotate_pre(tree: &mut Tree, pre: NodeId) {
    let Some(&code) = tree.children(pre).first() else {
        return;
    };
    if tree.element_with_tag(code, "code").is_none() {
        return;
    }

    let mut annotation = CodeAnnotation::default();

    if let Some(code_el) = tree.element_mut(code) {
        if let Some(meta) = code_el.data.meta.as_deref() {
            if let Some((event, remaining)) = extract_event(meta) {
                annotation.event = Some(event);
                code_el.data.meta = Some(remaining);
            }
        }
    }

    annotation.raw_string = tree
        .children(code)
        .first()
        .and_then(|t| tree.text(*t))
        .map(str::to_string);

    if let Some(pre_el) = tree.element_mut(pre) {
        annotation.src = pre_el.remove_property(SRC_PROPERTY);
        annotation.style = pre_el.remove_property(STYLE_PROPERTY);
        pre_el.data.annotation = Some(annotation);
    }
}

/// Property set by the highlighter on every code figure it produces
pub const FIGURE_MARKER: &str = "data-rehype-pretty-code-figure";

/// Styling hook shared by a captioned figure and its code container
pub const METADATA_ATTRIBUTE: &str = "data-metadata";

/// Tags highlighted code figures that open with a caption.
///
/// Only figures whose last child is the `pre` container are touched; the
/// figure and that `pre` both receive [`METADATA_ATTRIBUTE`].
pub struct FigureMetadata;

impl TreePlugin for FigureMetadata {
    fn name(&self) -> &'static str {
        "figure-metadata"
    }

    fn transform(&self, tree: &mut Tree, _ctx: &RenderContext) {
        for figure in tree.find_elements("figure") {
            mark_captioned_figure(tree, figure);
        }
    }
}

fn mark_captioned_figure(tree: &mut Tree, figure: NodeId) {
    let is_code_figure = tree
        .element(figure)
        .is_some_and(|el| el.has_property(FIGURE_MARKER));
    if !is_code_figure {
        return;
    }

    let children = tree.children(figure);
    let (Some(&first), Some(&last)) = (children.first(), children.last()) else {
        return;
    };
    if tree.element_with_tag(last, "pre").is_none() {
        return;
    }
    if tree.element_with_tag(first, "figcaption").is_none() {
        return;
    }

    if let Some(el) = tree.element_mut(figure) {
        el.set_property(METADATA_ATTRIBUTE, "");
    }
    if let Some(el) = tree.element_mut(last) {
        el.set_property(METADATA_ATTRIBUTE, "");
    }
}
