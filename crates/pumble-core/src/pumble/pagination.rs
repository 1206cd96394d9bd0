//! Cursor pagination over message listings.
//!
//! Pages are fetched strictly one after another: each request needs the
//! cursor from the previous response, and cursors are server-side state.

use async_trait::async_trait;

use crate::pumble::models::{Message, MessageCollection};
use crate::{CoreError, Result};

/// Something that can fetch one page of messages for a given cursor.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page starting at `cursor`, or the first page when `None`.
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<MessageCollection>;
}

/// Walk every page of `source` and return all messages in arrival order.
///
/// `has_more` alone decides whether another page is requested; the cursor on
/// a final page is ignored. Each follow-up request carries the cursor of the
/// page before it, or none when that page had no (or an empty) cursor.
///
/// At most `max_pages` requests are made (a value of zero is treated as one),
/// so a listing that never stops reporting more pages ends in an error rather
/// than a partial result.
///
/// # Errors
///
/// Propagates the first fetch failure, and returns
/// [`CoreError::PageLimitExceeded`] if the API still reports more pages after
/// `max_pages` requests.
pub async fn fetch_all<S>(source: &S, max_pages: usize) -> Result<Vec<Message>>
where
    S: PageSource + ?Sized,
{
    let max_pages = max_pages.max(1);
    let mut messages = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0_usize;

    loop {
        if pages == max_pages {
            return Err(CoreError::PageLimitExceeded { pages });
        }

        let page = source.fetch_page(cursor.as_deref()).await?;
        pages += 1;

        let has_more = page.has_more();
        let next_cursor = page
            .cursor()
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        log::debug!(
            "page {pages}: {} messages, has_more={has_more}",
            page.len()
        );
        messages.extend(page.into_messages());

        if !has_more {
            break;
        }
        if next_cursor.is_none() {
            log::warn!("page {pages} reports more results without a cursor; requesting next page without one");
        }
        cursor = next_cursor;
    }

    log::debug!("fetched {} messages over {pages} pages", messages.len());
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Serves pre-built pages and records the cursor of every request.
    struct ScriptedPages {
        pages: Mutex<VecDeque<MessageCollection>>,
        cursors: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedPages {
        fn new(pages: Vec<MessageCollection>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                cursors: Mutex::new(Vec::new()),
            }
        }

        fn cursors(&self) -> Vec<Option<String>> {
            self.cursors.lock().expect("cursor log").clone()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedPages {
        async fn fetch_page(&self, cursor: Option<&str>) -> Result<MessageCollection> {
            self.cursors
                .lock()
                .expect("cursor log")
                .push(cursor.map(str::to_string));
            self.pages
                .lock()
                .expect("page queue")
                .pop_front()
                .ok_or_else(|| CoreError::Http("no more scripted pages".to_string()))
        }
    }

    /// Always reports another page behind a fresh cursor.
    struct EndlessPages;

    #[async_trait]
    impl PageSource for EndlessPages {
        async fn fetch_page(&self, cursor: Option<&str>) -> Result<MessageCollection> {
            let next = cursor
                .map_or(1, |c| c.parse::<u32>().unwrap_or(0) + 1)
                .to_string();
            Ok(page(&["m"], Some(next.as_str()), Some(true)))
        }
    }

    fn message(id: &str) -> Message {
        Message {
            id: id.to_string(),
            ..Message::default()
        }
    }

    fn page(ids: &[&str], cursor: Option<&str>, has_more: Option<bool>) -> MessageCollection {
        MessageCollection::new(
            ids.iter().map(|id| message(id)).collect(),
            cursor.map(str::to_string),
            has_more,
        )
    }

    fn ids(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.id.as_str()).collect()
    }

    #[tokio::test]
    async fn two_pages_are_joined_in_order() {
        let source = ScriptedPages::new(vec![
            page(&["m1", "m2"], Some("A"), Some(true)),
            page(&["m3"], None, Some(false)),
        ]);

        let messages = fetch_all(&source, 10).await.expect("fetch all");

        assert_eq!(ids(&messages), ["m1", "m2", "m3"]);
        assert_eq!(source.cursors(), [None, Some("A".to_string())]);
    }

    #[tokio::test]
    async fn single_final_page_makes_one_request() {
        let source = ScriptedPages::new(vec![page(&["m1", "m2"], None, Some(false))]);

        let messages = fetch_all(&source, 10).await.expect("fetch all");

        assert_eq!(ids(&messages), ["m1", "m2"]);
        assert_eq!(source.cursors().len(), 1);
    }

    #[tokio::test]
    async fn empty_first_page_yields_nothing() {
        let source = ScriptedPages::new(vec![page(&[], None, Some(false))]);

        let messages = fetch_all(&source, 10).await.expect("fetch all");

        assert!(messages.is_empty());
        assert_eq!(source.cursors().len(), 1);
    }

    #[tokio::test]
    async fn request_count_is_ceiling_of_total_over_page_size() {
        // 7 messages, page size 3: pages of 3, 3, 1.
        let source = ScriptedPages::new(vec![
            page(&["m1", "m2", "m3"], Some("c1"), Some(true)),
            page(&["m4", "m5", "m6"], Some("c2"), Some(true)),
            page(&["m7"], None, Some(false)),
        ]);

        let messages = fetch_all(&source, 10).await.expect("fetch all");

        assert_eq!(messages.len(), 7);
        assert_eq!(source.cursors().len(), 3);
        assert_eq!(
            source.cursors(),
            [None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn has_more_false_wins_over_cursor() {
        let source = ScriptedPages::new(vec![
            page(&["m1"], Some("still-here"), Some(false)),
            page(&["never"], None, Some(false)),
        ]);

        let messages = fetch_all(&source, 10).await.expect("fetch all");

        assert_eq!(ids(&messages), ["m1"]);
        assert_eq!(source.cursors().len(), 1);
    }

    #[tokio::test]
    async fn absent_has_more_stops_the_walk() {
        let source = ScriptedPages::new(vec![
            page(&["m1"], Some("A"), None),
            page(&["never"], None, Some(false)),
        ]);

        let messages = fetch_all(&source, 10).await.expect("fetch all");

        assert_eq!(ids(&messages), ["m1"]);
    }

    #[tokio::test]
    async fn has_more_without_cursor_still_fetches_next_page() {
        let source = ScriptedPages::new(vec![
            page(&["m1"], None, Some(true)),
            page(&["m2"], None, Some(false)),
        ]);

        let messages = fetch_all(&source, 10).await.expect("fetch all");

        assert_eq!(ids(&messages), ["m1", "m2"]);
        assert_eq!(source.cursors(), [None, None]);
    }

    #[tokio::test]
    async fn empty_cursor_is_sent_as_no_cursor() {
        let source = ScriptedPages::new(vec![
            page(&["m1"], Some(""), Some(true)),
            page(&["m2"], Some("B"), Some(true)),
            page(&["m3"], None, Some(false)),
        ]);

        let messages = fetch_all(&source, 10).await.expect("fetch all");

        assert_eq!(ids(&messages), ["m1", "m2", "m3"]);
        assert_eq!(source.cursors(), [None, None, Some("B".to_string())]);
    }

    #[tokio::test]
    async fn cursorless_endless_listing_hits_the_cap() {
        let source = ScriptedPages::new(vec![page(&["m"], None, Some(true)); 3]);

        let err = fetch_all(&source, 3).await.expect_err("cap must trip");

        assert!(matches!(err, CoreError::PageLimitExceeded { pages: 3 }));
        assert_eq!(source.cursors().len(), 3);
    }

    #[tokio::test]
    async fn page_cap_bounds_an_endless_listing() {
        let err = fetch_all(&EndlessPages, 5).await.expect_err("cap must trip");
        assert!(matches!(err, CoreError::PageLimitExceeded { pages: 5 }));
    }

    #[tokio::test]
    async fn zero_cap_still_fetches_one_page() {
        let source = ScriptedPages::new(vec![page(&["m1"], None, Some(false))]);

        let messages = fetch_all(&source, 0).await.expect("fetch all");

        assert_eq!(ids(&messages), ["m1"]);
    }

    #[tokio::test]
    async fn fetch_errors_propagate() {
        let source = ScriptedPages::new(vec![page(&["m1"], Some("A"), Some(true))]);

        let err = fetch_all(&source, 10).await.expect_err("second page is missing");

        assert!(matches!(err, CoreError::Http(_)));
    }
}
