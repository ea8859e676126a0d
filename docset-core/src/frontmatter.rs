//! Frontmatter splitting for markdown files.

use regex::Regex;
use serde_yaml::Mapping;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Frontmatter must be a mapping")]
    NotAMapping,
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)^---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n(.*))?$")
            .expect("frontmatter regex is valid")
    })
}

/// Split a markdown file into its raw frontmatter record and body.
///
/// The record is left untyped; validating it against the doc schema is the
/// job of [`crate::collection`]. Files without a frontmatter block yield an
/// empty record and the full content as body.
///
/// # Example
///
/// ```
/// use docset_core::frontmatter::split_frontmatter;
///
/// let content = "---\ntitle: Introduction\norder: 1\n---\n# Hello\n";
/// let (record, body) = split_frontmatter(content).unwrap();
/// assert_eq!(record.get("title").and_then(|v| v.as_str()), Some("Introduction"));
/// assert_eq!(body, "# Hello\n");
/// ```
pub fn split_frontmatter(content: &str) -> Result<(Mapping, String), FrontmatterError> {
    let Some(captures) = frontmatter_regex().captures(content) else {
        return Ok((Mapping::new(), content.to_string()));
    };

    let yaml = captures.get(1).map_or("", |m| m.as_str());
    let body = captures.get(2).map_or("", |m| m.as_str());

    let record = if yaml.trim().is_empty() {
        Mapping::new()
    } else {
        match serde_yaml::from_str::<serde_yaml::Value>(yaml)? {
            serde_yaml::Value::Mapping(map) => map,
            serde_yaml::Value::Null => Mapping::new(),
            _ => return Err(FrontmatterError::NotAMapping),
        }
    };

    Ok((record, body.to_string()))
}

/// Strip the frontmatter block, returning only the markdown body
pub fn strip_frontmatter(content: &str) -> &str {
    frontmatter_regex()
        .captures(content)
        .map(|c| c.get(2).map_or("", |m| m.as_str()))
        .unwrap_or(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_valid_frontmatter() {
        let content = r#"---
title: Routing
description: Pages and layouts
category: Core concepts
order: 2
---

# Routing

Body text."#;

        let (record, body) = split_frontmatter(content).unwrap();
        assert_eq!(record.get("title").and_then(|v| v.as_str()), Some("Routing"));
        assert_eq!(record.get("order").and_then(|v| v.as_f64()), Some(2.0));
        assert!(body.contains("# Routing"));
        assert!(body.contains("Body text."));
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "# Just Content\n\nNo frontmatter here.";
        let (record, body) = split_frontmatter(content).unwrap();
        assert!(record.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_frontmatter_without_body() {
        let (record, body) = split_frontmatter("---\ntitle: Empty\n---").unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(body, "");
    }

    #[test]
    fn test_invalid_yaml() {
        let content = "---\ntitle: Test\ninvalid yaml: [unclosed\n---\n\nContent.";
        assert!(split_frontmatter(content).is_err());
    }

    #[test]
    fn test_scalar_frontmatter_rejected() {
        let content = "---\njust a string\n---\nBody";
        assert!(matches!(
            split_frontmatter(content),
            Err(FrontmatterError::NotAMapping)
        ));
    }

    #[test]
    fn test_strip_frontmatter() {
        assert_eq!(strip_frontmatter("---\na: 1\n---\nBody"), "Body");
        assert_eq!(strip_frontmatter("No block"), "No block");
    }
}
