//! Arena-indexed document tree that the markup plugins operate on.
//!
//! Code blocks are lowered into `pre > code` element subtrees so plugins can
//! inspect and rewrite them; every other piece of markdown is rendered by
//! pulldown-cmark up front and carried as an opaque [`NodeKind::Raw`] node.

use pulldown_cmark::{html, CodeBlockKind, Event, Tag, TagEnd};

/// Index of a node inside its [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Render-only data attached to a code block's `pre` element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeAnnotation {
    /// Value of an `event="..."` clause lifted out of the fence meta
    pub event: Option<String>,
    /// Source text of the code block before highlighting
    pub raw_string: Option<String>,
    /// File a code import filled the block from
    pub src: Option<String>,
    pub style: Option<String>,
}

/// Non-attribute data carried by an element
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    /// Fence language token (`js` in ```` ```js title="a" ````)
    pub lang: Option<String>,
    /// Remainder of the fence info string after the language
    pub meta: Option<String>,
    pub annotation: Option<CodeAnnotation>,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    properties: Vec<(String, String)>,
    pub data: ElementData,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            properties: Vec::new(),
            data: ElementData::default(),
        }
    }

    pub fn with_property(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_property(name, value);
        self
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|(k, _)| k == name)
    }

    /// Insert or overwrite a property, keeping first-insertion order
    pub fn set_property(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.properties.push((name.to_string(), value)),
        }
    }

    pub fn remove_property(&mut self, name: &str) -> Option<String> {
        let idx = self.properties.iter().position(|(k, _)| k == name)?;
        Some(self.properties.remove(idx).1)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Root,
    Element(Element),
    Text(String),
    /// Pre-rendered HTML emitted verbatim
    Raw(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// Owned document tree; nodes are addressed by [`NodeId`]
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                children: Vec::new(),
                parent: None,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Lower a markdown event stream into a tree.
    ///
    /// Each code block becomes `pre > code > text`; runs of other events are
    /// rendered to HTML and kept as raw nodes between them.
    pub fn from_events<'a>(events: impl IntoIterator<Item = Event<'a>>) -> Self {
        let mut tree = Tree::new();
        let root = tree.root();
        let mut pending: Vec<Event<'a>> = Vec::new();
        let mut code: Option<(Option<String>, Option<String>, String)> = None;

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    tree.flush_raw(root, &mut pending);
                    let (lang, meta) = match kind {
                        CodeBlockKind::Fenced(info) => split_info_string(&info),
                        CodeBlockKind::Indented => (None, None),
                    };
                    code = Some((lang, meta, String::new()));
                }
                Event::Text(text) if code.is_some() => {
                    if let Some((_, _, buf)) = code.as_mut() {
                        buf.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, meta, text)) = code.take() {
                        let pre = tree.append_element(root, Element::new("pre"));
                        let mut code_el = Element::new("code");
                        if let Some(lang) = &lang {
                            code_el.set_property("class", format!("language-{}", lang));
                        }
                        code_el.data.lang = lang;
                        code_el.data.meta = meta;
                        let code_id = tree.append_element(pre, code_el);
                        tree.append_text(code_id, text);
                    }
                }
                other => pending.push(other),
            }
        }
        tree.flush_raw(root, &mut pending);

        tree
    }

    fn flush_raw(&mut self, parent: NodeId, pending: &mut Vec<Event<'_>>) {
        if pending.is_empty() {
            return;
        }
        let mut out = String::new();
        html::push_html(&mut out, pending.drain(..));
        self.append_raw(parent, out);
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Element with the given tag, or `None` for any other node
    pub fn element_with_tag(&self, id: NodeId, tag: &str) -> Option<&Element> {
        self.element(id).filter(|el| el.tag == tag)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            children: Vec::new(),
            parent: Some(parent),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn append_element(&mut self, parent: NodeId, element: Element) -> NodeId {
        self.push(parent, NodeKind::Element(element))
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.push(parent, NodeKind::Text(text.into()))
    }

    pub fn append_raw(&mut self, parent: NodeId, html: impl Into<String>) -> NodeId {
        self.push(parent, NodeKind::Raw(html.into()))
    }

    /// Create an element that is not attached anywhere yet
    pub fn create_element(&mut self, element: Element) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind: NodeKind::Element(element),
            children: Vec::new(),
            parent: None,
        });
        id
    }

    /// Put `replacement` at `target`'s position; `target` is left detached
    pub fn replace(&mut self, target: NodeId, replacement: NodeId) {
        let Some(parent) = self.nodes[target.0].parent else {
            return;
        };
        if let Some(slot) = self.nodes[parent.0]
            .children
            .iter_mut()
            .find(|c| **c == target)
        {
            *slot = replacement;
        }
        self.nodes[replacement.0].parent = Some(parent);
        self.nodes[target.0].parent = None;
    }

    /// Move `child` (detached or not) to the end of `parent`'s children
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old) = self.nodes[child.0].parent {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Detach all children of `id`
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Pre-order snapshot of every node reachable from `id`, `id` included
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        out
    }

    /// Reachable elements with the given tag, in document order
    pub fn find_elements(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| self.element_with_tag(*id, tag).is_some())
            .collect()
    }

    /// Concatenated text of all text nodes below `id`
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Serialize the tree to HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(self.root(), &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Root => {
                for child in &node.children {
                    self.write_html(*child, out);
                }
            }
            NodeKind::Text(text) => out.push_str(&html_escape(text)),
            NodeKind::Raw(html) => out.push_str(html),
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in el.properties() {
                    push_attribute(out, name, value);
                }
                if let Some(annotation) = &el.data.annotation {
                    if let Some(event) = &annotation.event {
                        push_attribute(out, "data-event", event);
                    }
                    if let Some(raw) = &annotation.raw_string {
                        push_attribute(out, "data-raw-string", raw);
                    }
                    if let Some(src) = &annotation.src {
                        push_attribute(out, "data-src", src);
                    }
                    if let Some(style) = &annotation.style {
                        push_attribute(out, "data-style", style);
                    }
                }
                out.push('>');
                for child in &node.children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a fence info string into language and meta
fn split_info_string(info: &str) -> (Option<String>, Option<String>) {
    let info = info.trim();
    if info.is_empty() {
        return (None, None);
    }
    match info.split_once(char::is_whitespace) {
        Some((lang, meta)) => {
            let meta = meta.trim();
            (
                Some(lang.to_string()),
                (!meta.is_empty()).then(|| meta.to_string()),
            )
        }
        None => (Some(info.to_string()), None),
    }
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&html_escape(value));
    out.push('"');
}

pub(crate) fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
