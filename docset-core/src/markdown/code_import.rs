//! Fill code blocks from files named in the fence meta.
//!
//! ```` ```js file=./snippets/counter.js#L3-L6 ```` replaces the block's text
//! with lines 3 to 6 of `counter.js`, resolved against the directory of the
//! document being rendered. A path starting with `<rootDir>/` resolves
//! against the content root instead.

use super::plugins::{RenderContext, TreePlugin};
use super::tree::{NodeId, Tree};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Property carrying the imported file reference until [`super::PreData`] lifts it
pub const SRC_PROPERTY: &str = "__src__";

const ROOT_DIR_PREFIX: &str = "<rootDir>/";

/// A parsed `file=` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    /// The clause value as written, fragment included
    pub raw: String,
    pub path: String,
    /// First line to keep, 1-based
    pub from: Option<usize>,
    /// Last line to keep; `None` after `from` means through the end
    pub to: Option<usize>,
}

static FILE_REGEX: OnceLock<Regex> = OnceLock::new();
static RANGE_REGEX: OnceLock<Regex> = OnceLock::new();

fn file_regex() -> &'static Regex {
    FILE_REGEX.get_or_init(|| Regex::new(r"(?:^|\s)file=(\S+)").expect("file regex is valid"))
}

fn range_regex() -> &'static Regex {
    RANGE_REGEX.get_or_init(|| {
        Regex::new(r"^(.+?)(?:#L(\d+)(?:(-)(?:L(\d+))?)?)?$").expect("range regex is valid")
    })
}

impl FileReference {
    /// Parse the value of a `file=` clause (`path`, `path#L3`, `path#L3-`, `path#L3-L6`)
    pub fn parse(value: &str) -> Option<Self> {
        let caps = range_regex().captures(value)?;
        let path = caps.get(1)?.as_str().to_string();
        let from = caps.get(2).and_then(|m| m.as_str().parse().ok());
        let to = match (from, caps.get(3), caps.get(4)) {
            (Some(_), Some(_), Some(to)) => to.as_str().parse().ok(),
            (Some(_), Some(_), None) => None,
            (from, _, _) => from,
        };
        Some(Self {
            raw: value.to_string(),
            path,
            from,
            to,
        })
    }

    /// Absolute location of the referenced file, or `None` when it cannot be
    /// resolved from this context
    fn resolve(&self, ctx: &RenderContext) -> Option<PathBuf> {
        match self.path.strip_prefix(ROOT_DIR_PREFIX) {
            Some(rest) => ctx.root_dir.as_ref().map(|root| root.join(rest)),
            None => ctx.source_dir.as_ref().map(|dir| dir.join(&self.path)),
        }
    }
}

/// Split a `file=` clause out of a fence meta string.
///
/// Returns the reference and the meta with the clause removed.
pub fn extract_file_reference(meta: &str) -> Option<(FileReference, String)> {
    let caps = file_regex().captures(meta)?;
    let whole = caps.get(0)?;
    let reference = FileReference::parse(caps.get(1)?.as_str())?;
    let remaining = format!("{}{}", &meta[..whole.start()], &meta[whole.end()..]);
    Some((reference, remaining.trim().to_string()))
}

/// Keep lines `from..=to` (1-based, clamped) of `content`
pub fn extract_lines(content: &str, from: Option<usize>, to: Option<usize>) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = from.unwrap_or(1).max(1);
    let end = to.unwrap_or(lines.len()).min(lines.len());
    if start > end {
        return String::new();
    }
    let mut out = lines[start - 1..end].join("\n");
    out.push('\n');
    out
}

/// Replaces the text of code blocks that reference a file
pub struct CodeImport;

impl TreePlugin for CodeImport {
    fn name(&self) -> &'static str {
        "code-import"
    }

    fn transform(&self, tree: &mut Tree, ctx: &RenderContext) {
        for pre in tree.find_elements("pre") {
            import_into(tree, pre, ctx);
        }
    }
}

fn import_into(tree: &mut Tree, pre: NodeId, ctx: &RenderContext) {
    let Some(&code) = tree.children(pre).first() else {
        return;
    };
    let Some(code_el) = tree.element_with_tag(code, "code") else {
        return;
    };
    let Some((reference, remaining)) = code_el
        .data
        .meta
        .as_deref()
        .and_then(extract_file_reference)
    else {
        return;
    };

    let Some(path) = reference.resolve(ctx) else {
        tracing::warn!("Cannot resolve code import {:?} without a document path", reference.raw);
        return;
    };
    if !is_inside(&path, ctx.root_dir.as_deref()) {
        tracing::warn!("Code import {:?} points outside the content root", reference.raw);
        return;
    }
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!("Skipping code import {:?}: {}", reference.raw, err);
            return;
        }
    };

    tracing::debug!("Imported {} into code block", path.display());
    let text = extract_lines(&content, reference.from, reference.to);
    tree.clear_children(code);
    tree.append_text(code, text);

    if let Some(code_el) = tree.element_mut(code) {
        code_el.data.meta = (!remaining.is_empty()).then_some(remaining);
    }
    if let Some(pre_el) = tree.element_mut(pre) {
        pre_el.set_property(SRC_PROPERTY, reference.raw);
    }
}

fn is_inside(path: &Path, root: Option<&Path>) -> bool {
    let Some(root) = root else {
        return true;
    };
    match (path.canonicalize(), root.canonicalize()) {
        (Ok(path), Ok(root)) => path.starts_with(root),
        // Missing files are reported by the read that follows
        (Err(_), _) => true,
        (_, Err(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::tree::Element;
    use std::fs;
    use tempfile::tempdir;

    fn code_block(tree: &mut Tree, meta: &str, text: &str) -> (NodeId, NodeId) {
        let root = tree.root();
        let pre = tree.append_element(root, Element::new("pre"));
        let mut code_el = Element::new("code");
        code_el.data.lang = Some("js".into());
        code_el.data.meta = Some(meta.to_string());
        let code = tree.append_element(pre, code_el);
        tree.append_text(code, text);
        (pre, code)
    }

    #[test]
    fn test_parse_line_ranges() {
        let whole = FileReference::parse("./a.js").unwrap();
        assert_eq!((whole.path.as_str(), whole.from, whole.to), ("./a.js", None, None));

        let single = FileReference::parse("./a.js#L3").unwrap();
        assert_eq!((single.from, single.to), (Some(3), Some(3)));

        let open = FileReference::parse("./a.js#L3-").unwrap();
        assert_eq!((open.from, open.to), (Some(3), None));

        let closed = FileReference::parse("<rootDir>/a.js#L3-L6").unwrap();
        assert_eq!(closed.path, "<rootDir>/a.js");
        assert_eq!((closed.from, closed.to), (Some(3), Some(6)));
    }

    #[test]
    fn test_extract_file_reference_keeps_other_clauses() {
        let (reference, meta) =
            extract_file_reference(r#"title="a.js" file=./a.js#L2 {1}"#).unwrap();
        assert_eq!(reference.raw, "./a.js#L2");
        assert_eq!(meta, r#"title="a.js" {1}"#);
        assert!(extract_file_reference(r#"title="profile=x""#).is_none());
    }

    #[test]
    fn test_extract_lines_clamps() {
        let content = "one\ntwo\nthree\n";
        assert_eq!(extract_lines(content, None, None), "one\ntwo\nthree\n");
        assert_eq!(extract_lines(content, Some(2), Some(2)), "two\n");
        assert_eq!(extract_lines(content, Some(2), None), "two\nthree\n");
        assert_eq!(extract_lines(content, Some(2), Some(99)), "two\nthree\n");
        assert_eq!(extract_lines(content, Some(5), None), "");
    }

    #[test]
    fn test_import_relative_to_document() {
        let dir = tempdir().unwrap();
        let docs = dir.path().join("kit");
        fs::create_dir_all(docs.join("snippets")).unwrap();
        fs::write(docs.join("snippets/counter.js"), "// header\nlet a = 1;\nlet b = 2;\n").unwrap();

        let mut tree = Tree::new();
        let (pre, code) = code_block(&mut tree, "file=./snippets/counter.js#L2-L3 {1}", "");
        let ctx = RenderContext::for_document(&docs.join("page.md"), dir.path());
        CodeImport.transform(&mut tree, &ctx);

        assert_eq!(tree.text_content(code), "let a = 1;\nlet b = 2;\n");
        assert_eq!(tree.element(code).unwrap().data.meta.as_deref(), Some("{1}"));
        assert_eq!(
            tree.element(pre).unwrap().property(SRC_PROPERTY),
            Some("./snippets/counter.js#L2-L3")
        );
    }

    #[test]
    fn test_import_from_root_dir() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("shared.css"), "a { color: red; }\n").unwrap();
        fs::create_dir_all(dir.path().join("svelte")).unwrap();

        let mut tree = Tree::new();
        let (_, code) = code_block(&mut tree, "file=<rootDir>/shared.css", "");
        let ctx = RenderContext::for_document(&dir.path().join("svelte/page.md"), dir.path());
        CodeImport.transform(&mut tree, &ctx);

        assert_eq!(tree.text_content(code), "a { color: red; }\n");
        assert!(tree.element(code).unwrap().data.meta.is_none());
    }

    #[test]
    fn test_missing_file_leaves_block_untouched() {
        let dir = tempdir().unwrap();
        let mut tree = Tree::new();
        let (pre, code) = code_block(&mut tree, "file=./nope.js", "fallback\n");
        let ctx = RenderContext::for_document(&dir.path().join("page.md"), dir.path());
        CodeImport.transform(&mut tree, &ctx);

        assert_eq!(tree.text_content(code), "fallback\n");
        assert_eq!(tree.element(code).unwrap().data.meta.as_deref(), Some("file=./nope.js"));
        assert!(!tree.element(pre).unwrap().has_property(SRC_PROPERTY));
    }

    #[test]
    fn test_import_outside_root_is_skipped() {
        let outer = tempdir().unwrap();
        let root = outer.path().join("content");
        fs::create_dir_all(&root).unwrap();
        fs::write(outer.path().join("secret.txt"), "hidden\n").unwrap();

        let mut tree = Tree::new();
        let (_, code) = code_block(&mut tree, "file=../secret.txt", "");
        let ctx = RenderContext::for_document(&root.join("page.md"), &root);
        CodeImport.transform(&mut tree, &ctx);

        assert_eq!(tree.text_content(code), "");
    }

    #[test]
    fn test_without_document_path_is_skipped() {
        let mut tree = Tree::new();
        let (_, code) = code_block(&mut tree, "file=./a.js", "keep\n");
        CodeImport.transform(&mut tree, &RenderContext::default());
        assert_eq!(tree.text_content(code), "keep\n");
    }
}
