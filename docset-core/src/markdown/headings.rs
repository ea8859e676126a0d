//! Heading ids and the per-page outline.

use crate::slug::slugify;
use pulldown_cmark::{CowStr, Event, Tag, TagEnd};
use serde::Serialize;
use std::collections::HashMap;

/// A heading of the rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u32,
    pub title: String,
    pub id: String,
}

/// Give every heading an id and return the outline.
///
/// Explicit `{#id}` attributes are kept. Generated ids are slugs of the
/// heading text, suffixed with `-1`, `-2`, ... when a slug repeats.
pub fn assign_heading_ids(events: Vec<Event<'_>>) -> (Vec<Event<'static>>, Vec<Heading>) {
    let mut result = Vec::with_capacity(events.len());
    let mut headings = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    // Index of the pending Start(Heading) in `result` and its collected text
    let mut current: Option<(usize, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                current = Some((result.len(), String::new()));
                result.push(event.into_static());
            }
            Event::Text(ref text) | Event::Code(ref text) if current.is_some() => {
                if let Some((_, title)) = current.as_mut() {
                    title.push_str(text);
                }
                result.push(event.into_static());
            }
            Event::End(TagEnd::Heading(level)) => {
                if let Some((start, title)) = current.take() {
                    if let Event::Start(Tag::Heading { id, .. }) = &mut result[start] {
                        let final_id = match id {
                            Some(existing) => existing.to_string(),
                            None => {
                                let generated = unique_id(&mut seen, slugify(&title));
                                *id = Some(CowStr::Boxed(generated.clone().into_boxed_str()));
                                generated
                            }
                        };
                        headings.push(Heading {
                            level: level as u32,
                            title,
                            id: final_id,
                        });
                    }
                }
                result.push(Event::End(TagEnd::Heading(level)));
            }
            other => result.push(other.into_static()),
        }
    }

    (result, headings)
}

fn unique_id(seen: &mut HashMap<String, usize>, base: String) -> String {
    let count = seen.entry(base.clone()).or_insert(0);
    let id = if *count == 0 {
        base
    } else {
        format!("{}-{}", base, count)
    };
    *count += 1;
    id
}
