//! Code syntax highlighting using syntect.
//!
//! The highlighter knows a fixed set of languages and a single theme. It
//! turns each code block into a captioned figure of per-line spans; how
//! lines and highlighted ranges are decorated is left to [`HighlightHooks`].

use super::plugins::{RenderContext, TreePlugin, FIGURE_MARKER};
use super::tree::{Element, NodeId, Tree};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::{Range, RangeInclusive};
use std::sync::OnceLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use thiserror::Error;

pub const DEFAULT_THEME: &str = "base16-ocean.dark";

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("Unknown theme {name:?} (available: {available})")]
    UnknownTheme { name: String, available: String },
}

/// Languages the highlighter is preloaded with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Plaintext,
    JavaScript,
    TypeScript,
    Css,
    Svelte,
    ShellScript,
    Markdown,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::Plaintext,
        Language::JavaScript,
        Language::TypeScript,
        Language::Css,
        Language::Svelte,
        Language::ShellScript,
        Language::Markdown,
    ];

    /// Resolve a fence language token; unknown tokens get `None`
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "plaintext" | "text" | "txt" | "plain" => Some(Language::Plaintext),
            "javascript" | "js" | "mjs" | "cjs" => Some(Language::JavaScript),
            "typescript" | "ts" | "mts" | "cts" => Some(Language::TypeScript),
            "css" => Some(Language::Css),
            "svelte" => Some(Language::Svelte),
            "shellscript" | "shell" | "sh" | "bash" | "zsh" => Some(Language::ShellScript),
            "markdown" | "md" => Some(Language::Markdown),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Language::Plaintext => "plaintext",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Css => "css",
            Language::Svelte => "svelte",
            Language::ShellScript => "shellscript",
            Language::Markdown => "markdown",
        }
    }

    /// Bundled syntect grammar used for this language.
    ///
    /// The default syntax set ships no TypeScript or Svelte grammar, so those
    /// borrow the closest bundled one.
    fn syntax_name(&self) -> &'static str {
        match self {
            Language::Plaintext => "Plain Text",
            Language::JavaScript | Language::TypeScript => "JavaScript",
            Language::Css => "CSS",
            Language::Svelte => "HTML",
            Language::ShellScript => "Bourne Again Shell (bash)",
            Language::Markdown => "Markdown",
        }
    }

    fn syntax(&self) -> &'static SyntaxReference {
        SYNTAX_SET
            .find_syntax_by_name(self.syntax_name())
            .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text())
    }
}

/// Injection points for decorating highlighted output
pub trait HighlightHooks: Send + Sync {
    /// Called for every line span
    fn on_visit_line(&self, _tree: &mut Tree, _line: NodeId) {}

    /// Called for line spans selected by `{1,3-4}` meta ranges
    fn on_visit_highlighted_line(&self, _tree: &mut Tree, _line: NodeId) {}

    /// Called for the wrapper around each `/text/` meta match
    fn on_visit_highlighted_chars(&self, _tree: &mut Tree, _chars: NodeId) {}
}

/// Hooks used for documentation pages
pub struct DocsHooks;

impl HighlightHooks for DocsHooks {
    fn on_visit_line(&self, tree: &mut Tree, line: NodeId) {
        // Keep empty lines from collapsing in grid layouts and copyable
        if tree.children(line).is_empty() {
            tree.append_text(line, " ");
        }
    }

    fn on_visit_highlighted_line(&self, tree: &mut Tree, line: NodeId) {
        if let Some(el) = tree.element_mut(line) {
            el.set_property("class", "line--highlighted");
        }
    }

    fn on_visit_highlighted_chars(&self, tree: &mut Tree, chars: NodeId) {
        if let Some(el) = tree.element_mut(chars) {
            el.set_property("class", "chars--highlighted");
        }
    }
}

/// Rendering options read from a fence meta string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeMeta {
    pub title: Option<String>,
    pub highlighted_lines: Vec<RangeInclusive<usize>>,
    pub highlighted_chars: Vec<String>,
    pub show_line_numbers: bool,
}

static TITLE_REGEX: OnceLock<Regex> = OnceLock::new();
static LINES_REGEX: OnceLock<Regex> = OnceLock::new();
static CHARS_REGEX: OnceLock<Regex> = OnceLock::new();

impl CodeMeta {
    /// Whether 1-based line `number` falls in any `{...}` range
    pub fn is_line_highlighted(&self, number: usize) -> bool {
        self.highlighted_lines.iter().any(|r| r.contains(&number))
    }

    pub fn parse(meta: &str) -> Self {
        let title_re = TITLE_REGEX
            .get_or_init(|| Regex::new(r#"title="([^"]*)""#).expect("title regex is valid"));
        let lines_re = LINES_REGEX
            .get_or_init(|| Regex::new(r"\{([\d,\s-]+)\}").expect("lines regex is valid"));
        let chars_re = CHARS_REGEX
            .get_or_init(|| Regex::new(r"/([^/]+)/").expect("chars regex is valid"));

        let title = title_re
            .captures(meta)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());

        // Quoted values may contain braces or slashes; scan the rest only
        let unquoted = title_re.replace_all(meta, "");

        let mut highlighted_lines = Vec::new();
        for caps in lines_re.captures_iter(&unquoted) {
            let Some(list) = caps.get(1) else { continue };
            for part in list.as_str().split(',') {
                let part = part.trim();
                match part.split_once('-') {
                    Some((start, end)) => {
                        if let (Ok(start), Ok(end)) =
                            (start.trim().parse::<usize>(), end.trim().parse::<usize>())
                        {
                            highlighted_lines.push(start..=end);
                        }
                    }
                    None => {
                        if let Ok(n) = part.parse::<usize>() {
                            highlighted_lines.push(n..=n);
                        }
                    }
                }
            }
        }

        let highlighted_chars = chars_re
            .captures_iter(&unquoted)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect();

        let show_line_numbers = unquoted
            .split_whitespace()
            .any(|token| token == "showLineNumbers");

        Self {
            title,
            highlighted_lines,
            highlighted_chars,
            show_line_numbers,
        }
    }
}

/// A run of source text with its foreground colour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub color: Option<String>,
    pub text: String,
}

/// Syntax highlighter bound to a single theme
#[derive(Debug, Clone)]
pub struct Highlighter {
    theme_name: String,
}

impl Highlighter {
    pub fn with_theme(name: &str) -> Result<Self, HighlightError> {
        if THEME_SET.themes.contains_key(name) {
            Ok(Self {
                theme_name: name.to_string(),
            })
        } else {
            let mut names: Vec<&str> = THEME_SET.themes.keys().map(String::as_str).collect();
            names.sort_unstable();
            Err(HighlightError::UnknownTheme {
                name: name.to_string(),
                available: names.join(", "),
            })
        }
    }

    pub fn theme_name(&self) -> &str {
        &self.theme_name
    }

    fn theme(&self) -> Option<&'static Theme> {
        THEME_SET.themes.get(&self.theme_name)
    }

    /// Split code into lines of coloured tokens.
    ///
    /// One trailing newline is dropped so a fenced block does not end in an
    /// empty line. Backgrounds are never reported.
    pub fn highlight_lines(&self, code: &str, language: Language) -> Vec<Vec<Token>> {
        let code = code.strip_suffix('\n').unwrap_or(code);
        let plain = |line: &str| -> Vec<Token> {
            if line.is_empty() {
                Vec::new()
            } else {
                vec![Token {
                    color: None,
                    text: line.to_string(),
                }]
            }
        };

        let Some(theme) = self.theme() else {
            return code.split('\n').map(plain).collect();
        };

        let mut highlighter = HighlightLines::new(language.syntax(), theme);
        let mut lines = Vec::new();
        for line in code.split('\n') {
            let with_newline = format!("{}\n", line);
            match highlighter.highlight_line(&with_newline, &SYNTAX_SET) {
                Ok(regions) => {
                    let tokens = regions
                        .into_iter()
                        .filter_map(|(style, text)| {
                            let text = text.trim_end_matches('\n');
                            (!text.is_empty()).then(|| Token {
                                color: Some(hex_color(style.foreground)),
                                text: text.to_string(),
                            })
                        })
                        .collect();
                    lines.push(tokens);
                }
                Err(e) => {
                    tracing::debug!("Highlighting failed, emitting plain line: {}", e);
                    lines.push(plain(line));
                }
            }
        }
        lines
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self {
            theme_name: DEFAULT_THEME.to_string(),
        }
    }
}

fn hex_color(color: Color) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r, color.g, color.b)
}

/// Turns `pre > code` blocks into highlighted code figures
pub struct PrettyCode {
    highlighter: Highlighter,
    hooks: Box<dyn HighlightHooks>,
}

impl PrettyCode {
    pub fn new(highlighter: Highlighter, hooks: impl HighlightHooks + 'static) -> Self {
        Self {
            highlighter,
            hooks: Box::new(hooks),
        }
    }

    fn highlight_block(&self, tree: &mut Tree, pre: NodeId) {
        let Some(&code) = tree.children(pre).first() else {
            return;
        };
        let Some(code_el) = tree.element_with_tag(code, "code") else {
            return;
        };
        // Already rewritten into a figure
        if tree
            .parent(pre)
            .and_then(|p| tree.element_with_tag(p, "figure"))
            .is_some_and(|f| f.has_property(FIGURE_MARKER))
        {
            return;
        }

        let language = code_el
            .data
            .lang
            .as_deref()
            .and_then(Language::from_token)
            .unwrap_or(Language::Plaintext);
        let meta = CodeMeta::parse(code_el.data.meta.as_deref().unwrap_or(""));
        let source = tree.text_content(code);
        let theme = self.highlighter.theme_name().to_string();

        let figure = tree.create_element(Element::new("figure").with_property(FIGURE_MARKER, ""));
        tree.replace(pre, figure);

        if let Some(title) = &meta.title {
            let caption = tree.append_element(
                figure,
                Element::new("figcaption")
                    .with_property("data-rehype-pretty-code-title", "")
                    .with_property("data-language", language.id())
                    .with_property("data-theme", theme.as_str()),
            );
            tree.append_text(caption, title.as_str());
        }
        tree.append_child(figure, pre);

        if let Some(pre_el) = tree.element_mut(pre) {
            pre_el.set_property("tabindex", "0");
            pre_el.set_property("data-language", language.id());
            pre_el.set_property("data-theme", theme.as_str());
        }
        if let Some(code_el) = tree.element_mut(code) {
            code_el.remove_property("class");
            code_el.set_property("data-language", language.id());
            code_el.set_property("data-theme", theme.as_str());
            if meta.show_line_numbers {
                code_el.set_property("data-line-numbers", "");
            }
        }
        tree.clear_children(code);

        let lines = self.highlighter.highlight_lines(&source, language);
        let count = lines.len();
        for (idx, tokens) in lines.into_iter().enumerate() {
            let number = idx + 1;
            let line = tree.append_element(code, Element::new("span").with_property("data-line", ""));
            let marks = append_tokens(tree, line, &tokens, &meta.highlighted_chars);

            self.hooks.on_visit_line(tree, line);
            if meta.is_line_highlighted(number) {
                if let Some(el) = tree.element_mut(line) {
                    el.set_property("data-highlighted-line", "");
                }
                self.hooks.on_visit_highlighted_line(tree, line);
            }
            for mark in marks {
                self.hooks.on_visit_highlighted_chars(tree, mark);
            }
            if number < count {
                tree.append_text(code, "\n");
            }
        }
    }
}

impl TreePlugin for PrettyCode {
    fn name(&self) -> &'static str {
        "pretty-code"
    }

    fn transform(&self, tree: &mut Tree, _ctx: &RenderContext) {
        for pre in tree.find_elements("pre") {
            self.highlight_block(tree, pre);
        }
    }
}

/// Non-overlapping byte ranges of every pattern occurrence in `line`
fn char_ranges(line: &str, patterns: &[String]) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = patterns
        .iter()
        .filter(|p| !p.is_empty())
        .flat_map(|p| {
            line.match_indices(p.as_str())
                .map(|(start, m)| start..start + m.len())
        })
        .collect();
    ranges.sort_by_key(|r| (r.start, std::cmp::Reverse(r.end)));

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        if merged.last().is_some_and(|last| range.start < last.end) {
            continue;
        }
        merged.push(range);
    }
    merged
}

/// Append token spans to a line, wrapping highlighted ranges in `mark`s.
///
/// Returns the created `mark` nodes.
fn append_tokens(
    tree: &mut Tree,
    line: NodeId,
    tokens: &[Token],
    patterns: &[String],
) -> Vec<NodeId> {
    let text: String = tokens.iter().map(|t| t.text.as_str()).collect();
    let ranges = char_ranges(&text, patterns);
    let mut marks = Vec::new();
    let mut open_mark: Option<(usize, NodeId)> = None;
    let mut offset = 0;

    for token in tokens {
        let start = offset;
        let end = offset + token.text.len();
        offset = end;

        let mut cuts = vec![start, end];
        for r in &ranges {
            if r.start > start && r.start < end {
                cuts.push(r.start);
            }
            if r.end > start && r.end < end {
                cuts.push(r.end);
            }
        }
        cuts.sort_unstable();
        cuts.dedup();

        for window in cuts.windows(2) {
            let (piece_start, piece_end) = (window[0], window[1]);
            let piece = &token.text[piece_start - start..piece_end - start];
            let covering = ranges
                .iter()
                .position(|r| r.start <= piece_start && piece_start < r.end);

            let parent = match covering {
                Some(range_idx) => match open_mark {
                    Some((idx, mark)) if idx == range_idx => mark,
                    _ => {
                        let mark = tree.append_element(
                            line,
                            Element::new("mark").with_property("data-highlighted-chars", ""),
                        );
                        marks.push(mark);
                        open_mark = Some((range_idx, mark));
                        mark
                    }
                },
                None => {
                    open_mark = None;
                    line
                }
            };
            append_token_span(tree, parent, token.color.as_deref(), piece);
        }
    }

    marks
}

fn append_token_span(tree: &mut Tree, parent: NodeId, color: Option<&str>, text: &str) {
    let mut span = Element::new("span");
    if let Some(color) = color {
        span.set_property("style", format!("color:{}", color));
    }
    let id = tree.append_element(parent, span);
    tree.append_text(id, text);
}
