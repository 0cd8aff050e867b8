//! In-memory feed reader.
//!
//! Builds the page the suite inspects and simulates the two behaviours it
//! exercises: the slide-out menu toggled by the menu icon, and asynchronous
//! feed loading with a configured latency.

use crate::config::{FeedFixture, ReaderConfig};
use crate::contract::{FeedDescriptor, FeedLoader, MENU_HIDDEN_CLASS, QueryTree};
use crate::dom::{Document, NodeId, Selector};
use crate::error::{ReaderError, Result};
use async_trait::async_trait;
use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;
use std::sync::{Mutex, MutexGuard};
use tokio::time::{Instant, sleep};

/// Elements the reader updates after construction.
#[derive(Debug, Clone, Copy)]
struct Landmarks {
    /// `<body>`
    body: NodeId,
    /// `.slide-menu`
    menu: NodeId,
    /// `.menu-icon-link`
    menu_link: NodeId,
    /// `.header-title`
    header_title: NodeId,
    /// `.feed`
    feed: NodeId,
}

/// Horizontal slide of the menu between two offsets.
#[derive(Debug, Clone, Copy)]
struct Slide {
    /// Offset at the start of the transition
    from: f64,
    /// Offset once the transition finishes
    to: f64,
    /// When the transition started
    started: Instant,
    /// Transition length
    duration: Duration,
}

impl Slide {
    /// A finished slide resting at `offset`.
    fn resting(offset: f64) -> Self {
        Self {
            from: offset,
            to: offset,
            started: Instant::now(),
            duration: Duration::ZERO,
        }
    }

    /// Linear interpolation at `now`.
    fn position(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return self.to;
        }
        let progress = (now.saturating_duration_since(self.started).as_secs_f64()
            / self.duration.as_secs_f64())
        .clamp(0.0, 1.0);
        (self.to - self.from).mul_add(progress, self.from)
    }
}

/// Mutable page state.
#[derive(Debug)]
struct Page {
    /// Element tree
    document: Document,
    /// Fixed elements
    landmarks: Landmarks,
    /// Current menu slide
    slide: Slide,
}

/// A reader whose page lives in memory.
#[derive(Debug)]
pub struct InMemoryReader {
    /// Feeds and timing
    config: ReaderConfig,
    /// Page behind a lock, mutated by clicks and loads
    page: Mutex<Page>,
    /// Sequence number of the most recently started load
    generation: AtomicU64,
}

impl InMemoryReader {
    /// Build the initial page: menu closed, no feed loaded.
    ///
    /// # Errors
    /// Returns an error if the page cannot be assembled.
    pub fn new(config: ReaderConfig) -> Result<Self> {
        let mut document = Document::new();
        let body = document.body();
        document.set_class(body, MENU_HIDDEN_CLASS, true)?;

        let header = document.append(body, "header", &["header"])?;
        let menu_link = document.append(header, "a", &["menu-icon-link"])?;
        let header_title = document.append(header, "h1", &["header-title"])?;
        document.set_text(header_title, "Feeds")?;

        let menu = document.append(body, "div", &["slide-menu"])?;
        document.set_layout(menu, -config.menu_width, config.menu_width)?;
        let feed_list = document.append(menu, "ul", &["feed-list"])?;
        for fixture in &config.feeds {
            let item = document.append(feed_list, "li", &[])?;
            let link = document.append(item, "a", &[])?;
            document.set_text(link, fixture.name.clone().unwrap_or_default())?;
        }

        let feed = document.append(body, "div", &["feed"])?;

        tracing::debug!(
            "Built reader page with {} elements and {} feeds",
            document.len(),
            config.feeds.len()
        );

        Ok(Self {
            page: Mutex::new(Page {
                document,
                landmarks: Landmarks {
                    body,
                    menu,
                    menu_link,
                    header_title,
                    feed,
                },
                slide: Slide::resting(-config.menu_width),
            }),
            config,
            generation: AtomicU64::new(0),
        })
    }

    /// Reader configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, Page>> {
        self.page.lock().map_err(|_| ReaderError::Poisoned)
    }

    /// Render `fixture` unless a newer load has started since `generation`.
    fn render_if_current(&self, generation: u64, fixture: &FeedFixture) -> Result<bool> {
        let mut page = self.lock()?;
        if self.generation.load(Ordering::SeqCst) != generation {
            return Ok(false);
        }
        render_feed(&mut page, fixture)?;
        Ok(true)
    }

    fn toggle_menu(&self, page: &mut Page) -> Result<()> {
        let Landmarks { body, menu, .. } = page.landmarks;
        let hidden = page.document.toggle_class(body, MENU_HIDDEN_CLASS)?;
        let width = page.document.width(menu)?;
        let now = Instant::now();
        let target = if hidden { -width } else { 0.0 };

        page.slide = Slide {
            from: page.slide.position(now),
            to: target,
            started: now,
            duration: self.config.menu_transition(),
        };
        tracing::debug!("Menu {}", if hidden { "closing" } else { "opening" });
        Ok(())
    }
}

fn render_feed(page: &mut Page, fixture: &FeedFixture) -> Result<()> {
    let Landmarks {
        header_title, feed, ..
    } = page.landmarks;
    let document = &mut page.document;

    document.set_text(header_title, fixture.name.clone().unwrap_or_default())?;
    document.clear_children(feed)?;
    for title in &fixture.entries {
        let link = document.append(feed, "a", &["entry-link"])?;
        let entry = document.append(link, "article", &["entry"])?;
        let heading = document.append(entry, "h2", &[])?;
        document.set_text(heading, title.as_str())?;
    }
    Ok(())
}

impl QueryTree for InMemoryReader {
    fn query(&self, selector: &str) -> Result<Vec<NodeId>> {
        let parsed: Selector = selector.parse()?;
        Ok(self.lock()?.document.query(&parsed))
    }

    fn find(&self, node: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let parsed: Selector = selector.parse()?;
        self.lock()?.document.find(node, &parsed)
    }

    fn offset_left(&self, node: NodeId) -> Result<f64> {
        let page = self.lock()?;
        if node == page.landmarks.menu {
            return Ok(page.slide.position(Instant::now()));
        }
        page.document.left(node)
    }

    fn outer_width(&self, node: NodeId) -> Result<f64> {
        self.lock()?.document.width(node)
    }

    fn has_class(&self, node: NodeId, class: &str) -> Result<bool> {
        self.lock()?.document.has_class(node, class)
    }

    fn inner_html(&self, node: NodeId) -> Result<String> {
        self.lock()?.document.inner_html(node)
    }

    fn click(&self, node: NodeId) -> Result<()> {
        let mut page = self.lock()?;
        if !page.document.contains(node) {
            return Err(ReaderError::UnknownNode(node));
        }
        if node == page.landmarks.menu_link {
            self.toggle_menu(&mut page)?;
        }
        Ok(())
    }
}

#[async_trait]
impl FeedLoader for InMemoryReader {
    fn feeds(&self) -> Vec<FeedDescriptor> {
        self.config.feeds.iter().map(FeedFixture::descriptor).collect()
    }

    async fn load_feed(&self, index: usize) -> Result<()> {
        let fixture = self
            .config
            .feeds
            .get(index)
            .ok_or(ReaderError::FeedIndexOutOfRange {
                index,
                len: self.config.feeds.len(),
            })?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Loading feed {index} (load #{generation})");
        sleep(self.config.latency()).await;

        if !self.render_if_current(generation, fixture)? {
            tracing::debug!("Load #{generation} of feed {index} superseded");
            return Ok(());
        }
        tracing::debug!(
            "Loaded feed {index} with {} entries",
            fixture.entries.len()
        );
        Ok(())
    }
}
