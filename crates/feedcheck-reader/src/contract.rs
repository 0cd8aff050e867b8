//! What the feed-reader suite needs from the application under test.

use crate::dom::NodeId;
use crate::error::{ReaderError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Class on `<body>` while the menu is closed.
pub const MENU_HIDDEN_CLASS: &str = "menu-hidden";

/// One entry of the application's feed list.
///
/// `None` models a field the application left undefined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedDescriptor {
    /// Display name
    pub name: Option<String>,
    /// Feed location
    pub url: Option<String>,
}

/// Read access to the page plus simulated clicks.
///
/// Selectors are single `.class` or tag-name selectors.
pub trait QueryTree: Send + Sync {
    /// All elements matching `selector`, in document order.
    ///
    /// # Errors
    /// Returns an error if the selector is not supported.
    fn query(&self, selector: &str) -> Result<Vec<NodeId>>;

    /// Descendants of `node` matching `selector`.
    ///
    /// # Errors
    /// Returns an error if the selector is not supported or `node` is gone.
    fn find(&self, node: NodeId, selector: &str) -> Result<Vec<NodeId>>;

    /// Current horizontal offset of `node`.
    ///
    /// # Errors
    /// Returns an error if `node` is gone.
    fn offset_left(&self, node: NodeId) -> Result<f64>;

    /// Outer width of `node`.
    ///
    /// # Errors
    /// Returns an error if `node` is gone.
    fn outer_width(&self, node: NodeId) -> Result<f64>;

    /// Whether `node` carries `class`.
    ///
    /// # Errors
    /// Returns an error if `node` is gone.
    fn has_class(&self, node: NodeId, class: &str) -> Result<bool>;

    /// Markup of the content of `node`.
    ///
    /// # Errors
    /// Returns an error if `node` is gone.
    fn inner_html(&self, node: NodeId) -> Result<String>;

    /// Simulate a user click on `node`.
    ///
    /// # Errors
    /// Returns an error if `node` is gone.
    fn click(&self, node: NodeId) -> Result<()>;

    /// First element matching `selector`.
    ///
    /// # Errors
    /// Returns [`ReaderError::NoMatch`] if nothing matches.
    fn first(&self, selector: &str) -> Result<NodeId> {
        self.query(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| ReaderError::NoMatch(selector.to_owned()))
    }
}

/// The application's feed list and its asynchronous loader.
#[async_trait]
pub trait FeedLoader: Send + Sync {
    /// The configured feeds, in order.
    fn feeds(&self) -> Vec<FeedDescriptor>;

    /// Replace the visible entries with the content of feed `index`.
    ///
    /// Resolves once the page has been updated. Safe to call repeatedly; each
    /// call resolves on its own.
    ///
    /// # Errors
    /// Returns an error if `index` is out of range.
    async fn load_feed(&self, index: usize) -> Result<()>;
}

/// Everything the feed-reader suite exercises.
pub trait FeedReaderApp: QueryTree + FeedLoader {}

impl<App: QueryTree + FeedLoader> FeedReaderApp for App {}
