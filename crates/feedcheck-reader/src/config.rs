//! Configuration of the in-memory reader.

use crate::contract::FeedDescriptor;
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// One feed with the entry titles a load produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFixture {
    /// Display name, also used as the header after loading
    #[serde(default)]
    pub name: Option<String>,
    /// Feed location
    #[serde(default)]
    pub url: Option<String>,
    /// Entry titles rendered by `load_feed`
    #[serde(default)]
    pub entries: Vec<String>,
}

impl FeedFixture {
    /// Build a fixture from borrowed parts.
    pub fn new(name: &str, url: &str, entries: &[&str]) -> Self {
        Self {
            name: Some(name.to_owned()),
            url: Some(url.to_owned()),
            entries: entries.iter().map(|entry| (*entry).to_owned()).collect(),
        }
    }

    /// The descriptor the application exposes for this feed.
    pub fn descriptor(&self) -> FeedDescriptor {
        FeedDescriptor {
            name: self.name.clone(),
            url: self.url.clone(),
        }
    }
}

/// Behaviour of the in-memory reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Simulated network latency of `load_feed`
    pub latency_ms: u64,
    /// Width of the slide-out menu
    pub menu_width: f64,
    /// Duration of the menu slide transition
    pub menu_transition_ms: u64,
    /// Feed list in display order
    pub feeds: Vec<FeedFixture>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            latency_ms: 200,
            menu_width: 190.0,
            menu_transition_ms: 200,
            feeds: default_feeds(),
        }
    }
}

impl ReaderConfig {
    /// Latency as a [`Duration`].
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    /// Menu transition as a [`Duration`].
    pub fn menu_transition(&self) -> Duration {
        Duration::from_millis(self.menu_transition_ms)
    }
}

/// The four feeds the reader ships with.
pub fn default_feeds() -> Vec<FeedFixture> {
    vec![
        FeedFixture::new(
            "Udacity Blog",
            "http://blog.udacity.com/feed",
            &[
                "Project reviews now include line notes",
                "Five habits of successful online learners",
                "Meet the mentors",
            ],
        ),
        FeedFixture::new(
            "CSS Tricks",
            "http://feeds.feedburner.com/CssTricks",
            &[
                "A complete guide to flexbox",
                "Transitions on the transform property",
                "Styling scrollbars",
            ],
        ),
        FeedFixture::new(
            "HTML5 Rocks",
            "http://feeds.feedburner.com/html5rocks",
            &[
                "Offline first with service workers",
                "Async functions in practice",
            ],
        ),
        FeedFixture::new(
            "Linear Digressions",
            "http://feeds.feedburner.com/udacity-linear-digressions",
            &[
                "Decision trees, explained",
                "The bias-variance tradeoff",
            ],
        ),
    ]
}
