//! Slug generation and path normalization.

use regex::Regex;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

/// Virtual prefix under which content modules are keyed
pub const CONTENT_PREFIX: &str = "/content/";

/// Extension of content modules
pub const MARKDOWN_EXTENSION: &str = ".md";

static HYPHENS_REGEX: OnceLock<Regex> = OnceLock::new();

/// Convert a string to a URL-safe slug
///
/// Rules:
/// - Lowercase
/// - Replace whitespace with hyphens
/// - Remove special characters (except hyphens)
/// - Collapse multiple hyphens
/// - Trim leading/trailing hyphens
///
/// # Examples
///
/// ```
/// use docset_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// assert_eq!(slugify("C++ Programming"), "c-programming");
/// ```
pub fn slugify(input: &str) -> String {
    let lowercased = input.to_lowercase();

    let with_hyphens = lowercased
        .graphemes(true)
        .map(|g| match g {
            " " | "_" | "\t" | "\n" => "-",
            _ => g,
        })
        .collect::<String>();

    // Keep alphanumerics (unicode letters included) and hyphens
    let cleaned = with_hyphens
        .graphemes(true)
        .filter(|g| {
            g.chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c.is_alphabetic())
        })
        .collect::<String>();

    let re = HYPHENS_REGEX.get_or_init(|| Regex::new(r"-+").expect("hyphen regex is valid"));
    let collapsed = re.replace_all(&cleaned, "-");

    collapsed.trim_matches('-').to_string()
}

/// Slug of a content module key: the content prefix and the markdown
/// extension are removed.
///
/// ```
/// use docset_core::slug::slug_from_path;
///
/// assert_eq!(slug_from_path("/content/kit/routing.md"), "kit/routing");
/// ```
pub fn slug_from_path(path: &str) -> String {
    let without_prefix = path.strip_prefix(CONTENT_PREFIX).unwrap_or(path);
    without_prefix
        .strip_suffix(MARKDOWN_EXTENSION)
        .unwrap_or(without_prefix)
        .to_string()
}

/// Module key for a path relative to the content root
pub fn module_key(relative: &str) -> String {
    format!("{}{}", CONTENT_PREFIX, relative.trim_start_matches('/'))
}

/// Route slug used for prerendering: like [`slug_from_path`] with a
/// trailing `/index` dropped
pub fn route_slug(path: &str) -> String {
    let slug = slug_from_path(path);
    match slug.strip_suffix("/index") {
        Some(parent) => parent.to_string(),
        None => slug,
    }
}

/// Sidebar anchor key for a doc title.
///
/// Lowercases, turns spaces into hyphens and drops `.` and `?`. Distinct
/// titles that differ only in dropped characters map to the same key;
/// such collisions are not detected.
///
/// ```
/// use docset_core::slug::convert_to_href;
///
/// assert_eq!(convert_to_href("What's New?"), "what's-new");
/// assert_eq!(convert_to_href("Node.js Setup"), "nodejs-setup");
/// ```
pub fn convert_to_href(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            '.' | '?' => None,
            other => Some(other),
        })
        .collect()
}

/// Uppercase the first character
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Display text and link form of a slug segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleLink {
    pub text: String,
    pub link: String,
}

/// Split on whitespace and hyphens and capitalize each word.
///
/// ```
/// use docset_core::slug::capitalize_docs_title_link;
///
/// let title = capitalize_docs_title_link("getting-started");
/// assert_eq!(title.text, "Getting Started");
/// assert_eq!(title.link, "Getting-Started");
/// ```
pub fn capitalize_docs_title_link(input: &str) -> TitleLink {
    let words: Vec<String> = input
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect();

    TitleLink {
        text: words.join(" "),
        link: words.join("-"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Rust Programming"), "rust-programming");
    }

    #[test]
    fn test_special_characters() {
        assert_eq!(slugify("Rust & Safety"), "rust-safety");
        assert_eq!(slugify("Node.js Tips"), "nodejs-tips");
        assert_eq!(slugify("What's new?"), "whats-new");
    }

    #[test]
    fn test_unicode() {
        assert_eq!(slugify("Café"), "café");
        assert_eq!(slugify("naïve"), "naïve");
    }

    #[test]
    fn test_leading_trailing_hyphens() {
        assert_eq!(slugify("  Hello World  "), "hello-world");
        assert_eq!(slugify("-Leading Hyphen"), "leading-hyphen");
    }

    #[test]
    fn test_empty_and_special_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slug_from_path() {
        assert_eq!(slug_from_path("/content/svelte/introduction.md"), "svelte/introduction");
        assert_eq!(slug_from_path("/content/kit/index.md"), "kit/index");
        assert_eq!(slug_from_path("svelte/intro"), "svelte/intro");
        // Only the trailing extension is dropped
        assert_eq!(slug_from_path("/content/a.md-notes/b.md"), "a.md-notes/b");
    }

    #[test]
    fn test_module_key_round_trip() {
        let key = module_key("kit/routing.md");
        assert_eq!(key, "/content/kit/routing.md");
        assert_eq!(slug_from_path(&key), "kit/routing");
    }

    #[test]
    fn test_route_slug_drops_index() {
        assert_eq!(route_slug("/content/kit/index.md"), "kit");
        assert_eq!(route_slug("/content/kit/indexing.md"), "kit/indexing");
    }

    #[test]
    fn test_convert_to_href_is_deterministic() {
        assert_eq!(convert_to_href("Getting Started"), "getting-started");
        assert_eq!(convert_to_href("Getting Started"), convert_to_href("Getting Started"));
    }

    #[test]
    fn test_convert_to_href_collision_is_kept() {
        // Known limitation: titles differing only in dropped characters collide
        assert_eq!(convert_to_href("What's New?"), convert_to_href("What's New."));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("svelte"), "Svelte");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("écrire"), "Écrire");
    }

    #[test]
    fn test_capitalize_docs_title_link() {
        let title = capitalize_docs_title_link("state management");
        assert_eq!(title.text, "State Management");
        assert_eq!(title.link, "State-Management");
    }
}
