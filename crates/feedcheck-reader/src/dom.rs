//! Arena-backed element tree standing in for the reader's DOM.

use crate::error::{ReaderError, Result};
use core::fmt::{self, Display, Formatter};
use core::mem;
use core::str::FromStr;
use std::collections::BTreeSet;

/// Handle to an element of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl Display for NodeId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// A single-part selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `.name`
    Class(String),
    /// `name`
    Tag(String),
}

impl FromStr for Selector {
    type Err = ReaderError;

    fn from_str(selector: &str) -> Result<Self> {
        let trimmed = selector.trim();
        let is_name = |name: &str| {
            !name.is_empty()
                && name
                    .chars()
                    .all(|character| character.is_ascii_alphanumeric() || matches!(character, '-' | '_'))
        };

        if let Some(class) = trimmed.strip_prefix('.')
            && is_name(class)
        {
            return Ok(Self::Class(class.to_owned()));
        }
        if is_name(trimmed) {
            return Ok(Self::Tag(trimmed.to_ascii_lowercase()));
        }
        Err(ReaderError::UnsupportedSelector(selector.to_owned()))
    }
}

impl Selector {
    fn matches(&self, node: &Node) -> bool {
        match self {
            Self::Class(class) => node.classes.contains(class),
            Self::Tag(tag) => node.tag == *tag,
        }
    }
}

/// One element.
#[derive(Debug, Clone, Default)]
struct Node {
    /// Lower-case tag name
    tag: String,
    /// Class list
    classes: BTreeSet<String>,
    /// Text content preceding the children
    text: String,
    /// Child elements in document order
    children: Vec<NodeId>,
    /// Parent element, `None` for the root
    parent: Option<NodeId>,
    /// Horizontal offset relative to the viewport
    left: f64,
    /// Outer width
    width: f64,
}

/// Element tree rooted at `<body>`.
///
/// Removed subtrees leave empty slots behind so that stale [`NodeId`]s are
/// reported as [`ReaderError::UnknownNode`] instead of aliasing new elements.
#[derive(Debug, Clone)]
pub struct Document {
    /// Arena of elements, `None` once removed
    nodes: Vec<Option<Node>>,
    /// The `<body>` element
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document holding only `<body>`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node {
                tag: "body".to_owned(),
                ..Node::default()
            })],
            root: NodeId(0),
        }
    }

    /// The root `<body>` element.
    pub fn body(&self) -> NodeId {
        self.root
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Always false: the root is never removed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a new element under `parent`.
    ///
    /// # Errors
    /// Returns an error if `parent` is not part of the document.
    pub fn append(&mut self, parent: NodeId, tag: &str, classes: &[&str]) -> Result<NodeId> {
        self.node(parent)?;

        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            tag: tag.to_ascii_lowercase(),
            classes: classes.iter().map(|class| (*class).to_owned()).collect(),
            parent: Some(parent),
            ..Node::default()
        }));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Replace the text content of `node`.
    ///
    /// # Errors
    /// Returns an error if `node` is not part of the document.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> Result<()> {
        self.node_mut(node)?.text = text.into();
        Ok(())
    }

    /// Set the static layout box of `node`.
    ///
    /// # Errors
    /// Returns an error if `node` is not part of the document.
    pub fn set_layout(&mut self, node: NodeId, left: f64, width: f64) -> Result<()> {
        let target = self.node_mut(node)?;
        target.left = left;
        target.width = width;
        Ok(())
    }

    /// Remove every descendant of `node`.
    ///
    /// # Errors
    /// Returns an error if `node` is not part of the document.
    pub fn clear_children(&mut self, node: NodeId) -> Result<()> {
        let mut pending = mem::take(&mut self.node_mut(node)?.children);
        while let Some(child) = pending.pop() {
            if let Some(removed) = self.nodes.get_mut(child.0).and_then(Option::take) {
                pending.extend(removed.children);
            }
        }
        Ok(())
    }

    /// All elements matching `selector`, in document order, root included.
    pub fn query(&self, selector: &Selector) -> Vec<NodeId> {
        let mut matches = Vec::new();
        if self.node(self.body()).is_ok_and(|body| selector.matches(body)) {
            matches.push(self.body());
        }
        self.collect_descendants(self.body(), selector, &mut matches);
        matches
    }

    /// Descendants of `node` matching `selector`, in document order.
    ///
    /// # Errors
    /// Returns an error if `node` is not part of the document.
    pub fn find(&self, node: NodeId, selector: &Selector) -> Result<Vec<NodeId>> {
        self.node(node)?;
        let mut matches = Vec::new();
        self.collect_descendants(node, selector, &mut matches);
        Ok(matches)
    }

    /// Whether `node` is part of the document.
    pub fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_ok()
    }

    /// Parent of `node`, `None` for `<body>`.
    ///
    /// # Errors
    /// Returns an error if `node` is not part of the document.
    pub fn parent(&self, node: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(node)?.parent)
    }

    /// Whether `node` carries `class`.
    ///
    /// # Errors
    /// Returns an error if `node` is not part of the document.
    pub fn has_class(&self, node: NodeId, class: &str) -> Result<bool> {
        Ok(self.node(node)?.classes.contains(class))
    }

    /// Add or remove `class` depending on `present`.
    ///
    /// # Errors
    /// Returns an error if `node` is not part of the document.
    pub fn set_class(&mut self, node: NodeId, class: &str, present: bool) -> Result<()> {
        let classes = &mut self.node_mut(node)?.classes;
        if present {
            classes.insert(class.to_owned());
        } else {
            classes.remove(class);
        }
        Ok(())
    }

    /// Flip `class` on `node` and return whether it is now present.
    ///
    /// # Errors
    /// Returns an error if `node` is not part of the document.
    pub fn toggle_class(&mut self, node: NodeId, class: &str) -> Result<bool> {
        let present = !self.has_class(node, class)?;
        self.set_class(node, class, present)?;
        Ok(present)
    }

    /// Static horizontal offset of `node`.
    ///
    /// # Errors
    /// Returns an error if `node` is not part of the document.
    pub fn left(&self, node: NodeId) -> Result<f64> {
        Ok(self.node(node)?.left)
    }

    /// Outer width of `node`.
    ///
    /// # Errors
    /// Returns an error if `node` is not part of the document.
    pub fn width(&self, node: NodeId) -> Result<f64> {
        Ok(self.node(node)?.width)
    }

    /// Markup of the content of `node`: its text followed by its children.
    ///
    /// # Errors
    /// Returns an error if `node` is not part of the document.
    pub fn inner_html(&self, node: NodeId) -> Result<String> {
        let element = self.node(node)?;
        let mut html = escape(&element.text);
        for child in &element.children {
            html.push_str(&self.outer_html(*child)?);
        }
        Ok(html)
    }

    /// Markup of `node` including its own tag.
    ///
    /// # Errors
    /// Returns an error if `node` is not part of the document.
    pub fn outer_html(&self, node: NodeId) -> Result<String> {
        let element = self.node(node)?;
        let inner = self.inner_html(node)?;
        if element.classes.is_empty() {
            return Ok(format!("<{tag}>{inner}</{tag}>", tag = element.tag));
        }
        let classes: Vec<&str> = element.classes.iter().map(String::as_str).collect();
        Ok(format!(
            "<{tag} class=\"{}\">{inner}</{tag}>",
            classes.join(" "),
            tag = element.tag
        ))
    }

    fn collect_descendants(&self, node: NodeId, selector: &Selector, matches: &mut Vec<NodeId>) {
        let Ok(element) = self.node(node) else {
            return;
        };
        for child in &element.children {
            if let Ok(child_node) = self.node(*child) {
                if selector.matches(child_node) {
                    matches.push(*child);
                }
                self.collect_descendants(*child, selector, matches);
            }
        }
    }

    fn node(&self, node: NodeId) -> Result<&Node> {
        self.nodes
            .get(node.0)
            .and_then(Option::as_ref)
            .ok_or(ReaderError::UnknownNode(node))
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(node.0)
            .and_then(Option::as_mut)
            .ok_or(ReaderError::UnknownNode(node))
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
