//! The feed-reader behavioral suite.
//!
//! Four groups check the feed list, the slide-out menu, the initial feed load,
//! and switching between feeds. The suite only talks to the application through
//! [`FeedReaderApp`], so any implementation of the contract can be checked.

use crate::contract::{FeedReaderApp, MENU_HIDDEN_CLASS};
use crate::dom::NodeId;
use crate::error::Result;
use anyhow::anyhow;
use feedcheck_harness::{Done, Expect, SettleConfig, Suite, wait_until};
use regex::Regex;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shape every feed url must have.
pub const URL_PATTERN: &str = r"^(https?://)?([\da-z.-]+)\.([a-z.]{2,6})([/\w .-]*)*/?$";

/// Menu elements captured once per group.
#[derive(Debug, Clone, Copy)]
struct MenuHandles {
    /// `.slide-menu`
    menu: NodeId,
    /// `.menu-icon-link`
    link: NodeId,
}

/// Page state captured before switching feeds.
#[derive(Debug, Clone)]
struct Snapshot {
    /// Header markup of the first feed
    header: String,
    /// Title of the first entry of the first feed
    first_title: Option<String>,
}

/// State shared between the hooks and cases of one group.
type Shared<T> = Arc<Mutex<Option<T>>>;

fn lock<T>(slot: &Mutex<Option<T>>) -> anyhow::Result<MutexGuard<'_, Option<T>>> {
    slot.lock().map_err(|_| anyhow!("group state lock poisoned"))
}

fn captured<T: Clone>(slot: &Mutex<Option<T>>, what: &str) -> anyhow::Result<T> {
    lock(slot)?
        .clone()
        .ok_or_else(|| anyhow!("{what} was not captured by the setup hook"))
}

fn header_html<A: FeedReaderApp + ?Sized>(app: &A) -> anyhow::Result<String> {
    let title = app.first(".header-title")?;
    Ok(app.inner_html(title)?)
}

/// Markup of the first `h2` inside any `.entry`, `None` without entries.
fn first_entry_title<A: FeedReaderApp + ?Sized>(app: &A) -> anyhow::Result<Option<String>> {
    for entry in app.query(".entry")? {
        if let Some(heading) = app.find(entry, "h2")?.into_iter().next() {
            return Ok(Some(app.inner_html(heading)?));
        }
    }
    Ok(None)
}

/// Check a field that must be present and non-empty.
#[track_caller]
fn expect_present(expect: &Expect, value: Option<&String>) {
    if expect.defined(value)
        && let Some(text) = value
    {
        expect.not_equal(&text.len(), &0);
    }
}

/// Wait for the menu to settle; a ceiling hit is left to the assertions.
async fn settle_menu<F>(predicate: F, settle: SettleConfig, state: &str)
where
    F: FnMut() -> bool,
{
    match wait_until(predicate, settle).await {
        Ok(elapsed) => tracing::debug!("Menu {state} after {}ms", elapsed.as_millis()),
        Err(error) => tracing::debug!("Menu not {state}: {error}"),
    }
}

/// Register the four feed-reader groups on `suite`.
///
/// `settle` bounds how long the menu case waits for the slide transition.
///
/// # Errors
/// Returns an error if the url pattern fails to compile or a group is rejected.
pub fn register_feedreader_suite<A>(
    suite: &mut Suite,
    app: &Arc<A>,
    settle: SettleConfig,
) -> Result<()>
where
    A: FeedReaderApp + 'static,
{
    let url_pattern = Regex::new(URL_PATTERN)?;

    register_feed_list(suite, app, url_pattern)?;
    register_menu(suite, app, settle)?;
    register_initial_entries(suite, app)?;
    register_feed_selection(suite, app)?;

    tracing::debug!(
        "Registered feed-reader suite: {} groups, {} cases",
        suite.group_count(),
        suite.case_count()
    );
    Ok(())
}

fn register_feed_list<A>(suite: &mut Suite, target: &Arc<A>, url_pattern: Regex) -> Result<()>
where
    A: FeedReaderApp + 'static,
{
    let feeds_app = Arc::clone(target);
    let urls_app = Arc::clone(target);
    let valid_app = Arc::clone(target);
    let names_app = Arc::clone(target);

    suite.describe("RSS Feeds", move |group| {
        group
            .it("are defined", move |expect| {
                expect.not_equal(&feeds_app.feeds().len(), &0);
                Ok(())
            })
            .it("urls are defined", move |expect| {
                for feed in urls_app.feeds() {
                    expect_present(expect, feed.url.as_ref());
                }
                Ok(())
            })
            .it("urls are valid", move |expect| {
                for (index, feed) in valid_app.feeds().into_iter().enumerate() {
                    match feed.url {
                        Some(url) => {
                            expect.matches(&url, &url_pattern);
                        }
                        None => expect.fail(format!("Expected the url of feed {index} to be defined.")),
                    }
                }
                Ok(())
            })
            .it("names are defined", move |expect| {
                for feed in names_app.feeds() {
                    expect_present(expect, feed.name.as_ref());
                }
                Ok(())
            });
    })?;
    Ok(())
}

fn register_menu<A>(suite: &mut Suite, target: &Arc<A>, settle: SettleConfig) -> Result<()>
where
    A: FeedReaderApp + 'static,
{
    let handles: Shared<MenuHandles> = Arc::new(Mutex::new(None));

    let setup_app = Arc::clone(target);
    let setup_slot = Arc::clone(&handles);
    let hidden_app = Arc::clone(target);
    let hidden_slot = Arc::clone(&handles);
    let toggle_app = Arc::clone(target);
    let toggle_slot = handles;

    suite.describe("The menu", move |group| {
        group
            .before_all(move || {
                let captured_handles = MenuHandles {
                    menu: setup_app.first(".slide-menu")?,
                    link: setup_app.first(".menu-icon-link")?,
                };
                *lock(&setup_slot)? = Some(captured_handles);
                Ok(())
            })
            .it("menu is hidden", move |expect| {
                let MenuHandles { menu, .. } = captured(&hidden_slot, "menu")?;
                expect.less_than(&hidden_app.offset_left(menu)?, &0.0);
                Ok(())
            })
            .it_async(
                "menu changes visibility when icon clicked",
                move |expect: Expect, done: Done| {
                    let app = Arc::clone(&toggle_app);
                    let slot = Arc::clone(&toggle_slot);
                    async move {
                        let MenuHandles { menu, link } = captured(&slot, "menu")?;
                        let body = app.first("body")?;

                        app.click(link)?;
                        settle_menu(
                            || app.offset_left(menu).is_ok_and(|left| left >= 0.0),
                            settle,
                            "shown",
                        )
                        .await;
                        expect.not_less_than(&app.offset_left(menu)?, &0.0);
                        expect.is_false(app.has_class(body, MENU_HIDDEN_CLASS)?);

                        app.click(link)?;
                        let right_edge = || -> Result<f64> {
                            Ok(app.offset_left(menu)? + app.outer_width(menu)?)
                        };
                        settle_menu(
                            || right_edge().is_ok_and(|right| right <= 0.0),
                            settle,
                            "hidden",
                        )
                        .await;
                        expect.not_greater_than(&right_edge()?, &0.0);
                        expect.is_true(app.has_class(body, MENU_HIDDEN_CLASS)?);

                        done.complete();
                        Ok(())
                    }
                },
            );
    })?;
    Ok(())
}

fn register_initial_entries<A>(suite: &mut Suite, target: &Arc<A>) -> Result<()>
where
    A: FeedReaderApp + 'static,
{
    let setup_app = Arc::clone(target);
    let case_app = Arc::clone(target);

    suite.describe("Initial Entries", move |group| {
        group
            .before_each_async(move |done| {
                let app = Arc::clone(&setup_app);
                async move {
                    app.load_feed(0).await?;
                    done.complete();
                    Ok(())
                }
            })
            .it("there is at least one entry element in the container", move |expect| {
                let feed = case_app.first(".feed")?;
                let entries = case_app.find(feed, ".entry")?;
                expect.greater_than(&entries.len(), &0);
                Ok(())
            });
    })?;
    Ok(())
}

fn register_feed_selection<A>(suite: &mut Suite, target: &Arc<A>) -> Result<()>
where
    A: FeedReaderApp + 'static,
{
    let snapshot: Shared<Snapshot> = Arc::new(Mutex::new(None));

    let setup_app = Arc::clone(target);
    let setup_slot = Arc::clone(&snapshot);
    let header_app = Arc::clone(target);
    let header_slot = Arc::clone(&snapshot);
    let content_app = Arc::clone(target);
    let content_slot = snapshot;
    let restore_app = Arc::clone(target);

    suite.describe("New Feed Selection", move |group| {
        group
            .before_all_async(move |done| {
                let app = Arc::clone(&setup_app);
                let slot = Arc::clone(&setup_slot);
                async move {
                    app.load_feed(0).await?;
                    let first = Snapshot {
                        header: header_html(app.as_ref())?,
                        first_title: first_entry_title(app.as_ref())?,
                    };
                    *lock(&slot)? = Some(first);
                    app.load_feed(1).await?;
                    done.complete();
                    Ok(())
                }
            })
            .it("has a new header", move |expect| {
                let before = captured(&header_slot, "first feed")?;
                expect.not_equal(&header_html(header_app.as_ref())?, &before.header);
                Ok(())
            })
            .it("has new content", move |expect| {
                let before = captured(&content_slot, "first feed")?;
                expect.not_equal(&first_entry_title(content_app.as_ref())?, &before.first_title);
                Ok(())
            })
            .after_all_async(move |done| {
                let app = Arc::clone(&restore_app);
                async move {
                    app.load_feed(0).await?;
                    done.complete();
                    Ok(())
                }
            });
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReaderConfig;
    use crate::reader::InMemoryReader;

    #[test]
    fn test_url_pattern() {
        let pattern = Regex::new(URL_PATTERN).expect("pattern compiles");
        for url in [
            "http://blog.udacity.com/feed",
            "http://feeds.feedburner.com/CssTricks",
            "https://example.org",
            "example.co.uk/path/to feed",
        ] {
            assert!(pattern.is_match(url), "{url} should match");
        }
        for url in ["", "not a url", "ftp://example.com", "http://localhost"] {
            assert!(!pattern.is_match(url), "{url} should not match");
        }
    }

    #[test]
    fn test_registers_four_groups() {
        let app = Arc::new(InMemoryReader::new(ReaderConfig::default()).expect("page builds"));
        let mut suite = Suite::new();

        register_feedreader_suite(&mut suite, &app, SettleConfig::default()).expect("registers");

        assert_eq!(suite.group_count(), 4);
        assert_eq!(suite.case_count(), 9);
    }

    #[test]
    fn test_present_check_accumulates() {
        let expect = Expect::new();
        expect_present(&expect, Some(&"A".to_owned()));
        assert!(expect.failures().is_empty());

        expect_present(&expect, Some(&String::new()));
        expect_present(&expect, None);
        assert_eq!(expect.failures().len(), 2);
    }
}
