//! Feed-reader contract, in-memory reader, and behavioral suite.
//!
//! The suite checks any application implementing [`QueryTree`] and
//! [`FeedLoader`]:
//! - the feed list has named feeds with well-formed urls
//! - the slide-out menu starts hidden and toggles on the menu icon
//! - loading a feed renders at least one entry
//! - switching feeds changes the header and the entries
//!
//! [`InMemoryReader`] is the bundled implementation the CLI runs against.

#![cfg_attr(
    test,
    allow(
        dead_code,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        clippy::print_stdout,
        clippy::print_stderr,
        reason = "Allow for tests"
    )
)]

/// Reader configuration and feed fixtures.
pub mod config;
/// Application contract.
pub mod contract;
/// Element tree.
pub mod dom;
/// Reader errors.
pub mod error;
/// In-memory application.
pub mod reader;
/// Feed-reader suite registration.
pub mod suite;

pub use config::{FeedFixture, ReaderConfig, default_feeds};
pub use contract::{FeedDescriptor, FeedLoader, FeedReaderApp, MENU_HIDDEN_CLASS, QueryTree};
pub use dom::{Document, NodeId, Selector};
pub use error::{ReaderError, Result};
pub use reader::InMemoryReader;
pub use suite::{URL_PATTERN, register_feedreader_suite};
