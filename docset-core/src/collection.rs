//! Content collection: validation of frontmatter records into doc entries.
//!
//! The collection is built in one pass over every content file. A single
//! invalid file fails the whole build; there is no partial collection.

use crate::models::{DocEntry, NamedLink};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Frontmatter record of one content file, before validation
#[derive(Debug, Clone)]
pub struct RawDoc {
    /// Content-relative path without extension (`svelte/introduction`)
    pub path: String,
    pub record: Mapping,
}

/// One schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: `{}` {}", self.path, self.field, self.message)
    }
}

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("{} schema violation(s): {}", .issues.len(), summarize(.issues))]
    Validation { issues: Vec<ValidationIssue> },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse frontmatter of {path}: {source}")]
    Frontmatter {
        path: String,
        #[source]
        source: crate::frontmatter::FrontmatterError,
    },
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validated, immutable index of every doc entry
#[derive(Debug, Clone, Default)]
pub struct Collection {
    entries: Vec<DocEntry>,
}

impl Collection {
    /// Validate all records, failing on the first build with any issue
    pub fn build(raw_docs: Vec<RawDoc>) -> Result<Self, CollectionError> {
        let mut entries = Vec::with_capacity(raw_docs.len());
        let mut issues = Vec::new();
        let mut seen_paths = HashSet::new();

        for raw in raw_docs {
            if !seen_paths.insert(raw.path.clone()) {
                issues.push(ValidationIssue {
                    path: raw.path.clone(),
                    field: "path".into(),
                    message: "is not unique".into(),
                });
                continue;
            }
            match validate(&raw) {
                Ok(entry) => entries.push(entry),
                Err(mut doc_issues) => issues.append(&mut doc_issues),
            }
        }

        if !issues.is_empty() {
            tracing::error!("Collection rejected with {} issue(s)", issues.len());
            return Err(CollectionError::Validation { issues });
        }

        tracing::info!("Validated {} doc entries", entries.len());
        Ok(Self { entries })
    }

    /// Entry whose path equals `path` exactly
    pub fn find_by_path(&self, path: &str) -> Option<&DocEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn entries(&self) -> &[DocEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validate one record against the doc schema and derive slugs
pub fn validate(raw: &RawDoc) -> Result<DocEntry, Vec<ValidationIssue>> {
    let mut checker = Checker {
        path: &raw.path,
        record: &raw.record,
        issues: Vec::new(),
    };

    let title = checker.required_string("title");
    let description = checker.required_string("description");
    let category = checker.required_string("category");
    let order = checker.required_number("order");
    let prev_path = checker.optional_single_link("prevPath");
    let next_path = checker.optional_single_link("nextPath");
    let links_on_this_page = checker.optional_links("linksOnThisPage");

    if !checker.issues.is_empty() {
        return Err(checker.issues);
    }

    let path = raw.path.clone();
    Ok(DocEntry {
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
        category: category.unwrap_or_default(),
        order: order.unwrap_or_default(),
        slug: path.split('/').skip(1).collect::<Vec<_>>().join("/"),
        slug_full: format!("/{}", path),
        path,
        prev_path,
        next_path,
        links_on_this_page,
    })
}

struct Checker<'a> {
    path: &'a str,
    record: &'a Mapping,
    issues: Vec<ValidationIssue>,
}

impl Checker<'_> {
    fn issue(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: self.path.to_string(),
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn required_string(&mut self, field: &str) -> Option<String> {
        let record = self.record;
        match record.get(field) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.issue(field, format!("must be a string, got {}", kind(other)));
                None
            }
            None => {
                self.issue(field, "is required");
                None
            }
        }
    }

    fn required_number(&mut self, field: &str) -> Option<f64> {
        let record = self.record;
        match record.get(field) {
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v.is_finite() => Some(v),
                _ => {
                    self.issue(field, "must be a finite number");
                    None
                }
            },
            Some(other) => {
                self.issue(field, format!("must be a number, got {}", kind(other)));
                None
            }
            None => {
                self.issue(field, "is required");
                None
            }
        }
    }

    fn string_map(&mut self, field: &str) -> Option<Vec<NamedLink>> {
        let record = self.record;
        let value = record.get(field)?;
        let Value::Mapping(map) = value else {
            self.issue(field, format!("must be a mapping, got {}", kind(value)));
            return None;
        };

        let mut links = Vec::with_capacity(map.len());
        for (k, v) in map {
            match (k, v) {
                (Value::String(label), Value::String(target)) => links.push(NamedLink {
                    label: label.clone(),
                    target: target.clone(),
                }),
                _ => {
                    self.issue(field, "must map strings to strings");
                    return None;
                }
            }
        }
        Some(links)
    }

    fn optional_single_link(&mut self, field: &str) -> Option<NamedLink> {
        let mut links = self.string_map(field)?;
        if links.len() != 1 {
            self.issue(
                field,
                format!("must have exactly one entry, got {}", links.len()),
            );
            return None;
        }
        links.pop()
    }

    fn optional_links(&mut self, field: &str) -> Vec<NamedLink> {
        self.string_map(field).unwrap_or_default()
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(path: &str, yaml: &str) -> RawDoc {
        RawDoc {
            path: path.into(),
            record: serde_yaml::from_str(yaml).unwrap(),
        }
    }

    const VALID: &str = r#"
title: Introduction
description: What this is
category: Getting started
order: 1
nextPath:
  Installation: svelte/installation
linksOnThisPage:
  Overview: overview
  Usage: usage
"#;

    #[test]
    fn test_valid_record_derives_slugs() {
        let entry = validate(&raw("svelte/introduction", VALID)).unwrap();
        assert_eq!(entry.title, "Introduction");
        assert_eq!(entry.order, 1.0);
        assert_eq!(entry.slug, "introduction");
        assert_eq!(entry.slug_full, "/svelte/introduction");
        assert_eq!(entry.next_path.unwrap().target, "svelte/installation");
        assert!(entry.prev_path.is_none());
        let anchors: Vec<_> = entry
            .links_on_this_page
            .iter()
            .map(|l| l.label.as_str())
            .collect();
        assert_eq!(anchors, vec!["Overview", "Usage"]);
    }

    #[test]
    fn test_nested_slug_keeps_remaining_segments() {
        let entry = validate(&raw("kit/advanced/hooks", VALID)).unwrap();
        assert_eq!(entry.slug, "advanced/hooks");
        assert_eq!(entry.slug_full, "/kit/advanced/hooks");
    }

    #[test]
    fn test_missing_and_mistyped_fields_reported_together() {
        let issues = validate(&raw("svelte/bad", "title: 3\norder: first\n")).unwrap_err();
        let fields: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "description", "category", "order"]);
        assert!(issues[0].message.contains("must be a string"));
    }

    #[test]
    fn test_prev_path_must_have_one_entry() {
        let yaml = format!("{}prevPath:\n  A: a\n  B: b\n", VALID);
        let issues = validate(&raw("svelte/x", &yaml)).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "prevPath");
    }

    #[test]
    fn test_one_invalid_file_fails_whole_collection() {
        let docs = vec![
            raw("svelte/introduction", VALID),
            raw("svelte/broken", "title: Broken\n"),
        ];
        match Collection::build(docs) {
            Err(CollectionError::Validation { issues }) => {
                assert!(issues.iter().all(|i| i.path == "svelte/broken"));
            }
            other => panic!("expected validation failure, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_duplicate_paths_rejected() {
        let docs = vec![
            raw("svelte/introduction", VALID),
            raw("svelte/introduction", VALID),
        ];
        let err = Collection::build(docs).unwrap_err();
        assert!(err.to_string().contains("is not unique"));
    }

    #[test]
    fn test_find_by_path_is_exact() {
        let collection = Collection::build(vec![raw("svelte/introduction", VALID)]).unwrap();
        assert!(collection.find_by_path("svelte/introduction").is_some());
        assert!(collection.find_by_path("introduction").is_none());
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let yaml = format!("{}draft: true\n", VALID);
        assert!(validate(&raw("svelte/x", &yaml)).is_ok());
    }
}
