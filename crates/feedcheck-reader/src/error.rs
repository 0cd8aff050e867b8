use core::result::Result as CoreResult;

use feedcheck_harness::HarnessError;
use regex::Error as RegexError;
use thiserror::Error;

use crate::dom::NodeId;

/// Result type for reader operations.
pub type Result<T> = CoreResult<T, ReaderError>;

/// Errors raised by the page model and the feed-reader suite.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// The node was never created or has been removed from the tree.
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// Only `.class` and tag-name selectors are understood.
    #[error("Unsupported selector: '{0}'")]
    UnsupportedSelector(String),

    /// A lookup that needs at least one element found none.
    #[error("No element matches '{0}'")]
    NoMatch(String),

    /// `load_feed` was called with an index past the end of the feed list.
    #[error("Feed index {index} out of range ({len} feeds)")]
    FeedIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of configured feeds
        len: usize,
    },

    /// A thread panicked while holding the page state.
    #[error("Page state lock poisoned")]
    Poisoned,

    /// The feed URL pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] RegexError),

    /// Registering the suite with the harness failed.
    #[error("Suite registration failed: {0}")]
    Registration(#[from] HarnessError),
}
