//! Cursor state machine over a lazy page source.

use tokio::sync::Mutex;

use crate::error::PaginationError;
use crate::pagination::{Page, PageSource};

struct PaginatorInner {
    source: Option<PageSource>,
    buffer: Vec<Page>,
    index: usize,
    /// False until the first page has been produced; `index` is only
    /// meaningful once primed.
    primed: bool,
    exhausted: bool,
}

/// Walks a forward-only page source with a buffered cursor.
///
/// Forward moves past the buffered end pull from the source (suspending
/// for asynchronous sources); backward moves only ever replay the buffer.
/// All cursor mutation runs under one internal lock, so two near-
/// simultaneous triggers on the same instance cannot lose an update.
///
/// Movement methods return [`None`] when the move was a no-op (already at
/// a boundary); callers must acknowledge without re-sending content.
pub struct Paginator {
    inner: Mutex<PaginatorInner>,
    unbounded: bool,
}

impl Paginator {
    pub fn new(source: PageSource) -> Self {
        Self {
            inner: Mutex::new(PaginatorInner {
                source: Some(source),
                buffer: Vec::new(),
                index: 0,
                primed: false,
                exhausted: false,
            }),
            unbounded: false,
        }
    }

    /// A paginator over a source known to never finish. Jump-to-last is
    /// rejected with [`PaginationError::UnsupportedOperation`].
    pub fn unbounded(source: PageSource) -> Self {
        Self {
            unbounded: true,
            ..Self::new(source)
        }
    }

    /// Advance to the next page.
    ///
    /// Replays the buffer when the cursor is behind it; otherwise pulls
    /// one page from the source. Returns [`None`] once the source is
    /// exhausted, leaving the cursor unchanged.
    pub async fn get_next_entry(&self) -> Option<Page> {
        let mut inner = self.inner.lock().await;
        if inner.primed && inner.index + 1 < inner.buffer.len() {
            inner.index += 1;
            return Some(inner.buffer[inner.index].clone());
        }
        Self::pull(&mut inner).await
    }

    /// Step back to the previous page; a no-op at the first page. Never
    /// touches the source.
    pub async fn get_previous_entry(&self) -> Option<Page> {
        let mut inner = self.inner.lock().await;
        if inner.primed && inner.index > 0 {
            inner.index -= 1;
            return Some(inner.buffer[inner.index].clone());
        }
        None
    }

    /// Jump to the first page; a no-op when already there.
    pub async fn get_first_entry(&self) -> Option<Page> {
        let mut inner = self.inner.lock().await;
        if !inner.primed {
            return Self::pull(&mut inner).await;
        }
        if inner.index == 0 {
            return None;
        }
        inner.index = 0;
        Some(inner.buffer[0].clone())
    }

    /// Drain the source and jump to the final page; a no-op when already
    /// there. Suspends until the source is exhausted, which is only safe
    /// for finite sources.
    pub async fn get_last_entry(&self) -> Result<Option<Page>, PaginationError> {
        if self.unbounded {
            return Err(PaginationError::UnsupportedOperation);
        }

        let mut inner = self.inner.lock().await;
        if let Some(mut source) = inner.source.take() {
            while let Some(page) = source.next_page().await {
                inner.buffer.push(page);
            }
            inner.exhausted = true;
        }

        if inner.buffer.is_empty() {
            return Ok(None);
        }

        let last = inner.buffer.len() - 1;
        if inner.primed && inner.index == last {
            return Ok(None);
        }
        inner.index = last;
        inner.primed = true;
        Ok(Some(inner.buffer[last].clone()))
    }

    /// The page the cursor currently points at, if any has been produced.
    pub async fn current_page(&self) -> Option<Page> {
        let inner = self.inner.lock().await;
        inner.primed.then(|| inner.buffer[inner.index].clone())
    }

    /// Drop the source, preventing any further forward pulls.
    pub async fn close_source(&self) {
        self.inner.lock().await.source = None;
    }

    /// Whether the source has signalled completion.
    pub async fn is_exhausted(&self) -> bool {
        self.inner.lock().await.exhausted
    }

    /// Number of pages produced so far.
    pub async fn buffered_len(&self) -> usize {
        self.inner.lock().await.buffer.len()
    }

    async fn pull(inner: &mut PaginatorInner) -> Option<Page> {
        let source = inner.source.as_mut()?;
        match source.next_page().await {
            Some(page) => {
                inner.buffer.push(page.clone());
                if inner.primed {
                    inner.index = inner.buffer.len() - 1;
                } else {
                    inner.index = 0;
                    inner.primed = true;
                }
                Some(page)
            }
            None => {
                inner.source = None;
                inner.exhausted = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(count: usize) -> Vec<Page> {
        (0..count)
            .map(|index| Page::from_content(format!("page-{index}")))
            .collect()
    }

    fn content(page: &Page) -> &str {
        page.content.as_deref().unwrap()
    }

    #[tokio::test]
    async fn test_forward_then_exhausted_noop() {
        let paginator = Paginator::new(PageSource::from_pages(pages(3)));

        assert_eq!(content(&paginator.get_next_entry().await.unwrap()), "page-0");
        assert_eq!(content(&paginator.get_next_entry().await.unwrap()), "page-1");
        assert_eq!(content(&paginator.get_next_entry().await.unwrap()), "page-2");

        // The fourth move is a no-op: exhausted, cursor unchanged.
        assert!(paginator.get_next_entry().await.is_none());
        assert!(paginator.is_exhausted().await);
        assert_eq!(content(&paginator.current_page().await.unwrap()), "page-2");
        assert!(paginator.get_next_entry().await.is_none());
    }

    #[tokio::test]
    async fn test_monotonic_buffering_and_reverse_replay() {
        let paginator = Paginator::new(PageSource::from_pages(pages(3)));
        for _ in 0..3 {
            paginator.get_next_entry().await.unwrap();
        }
        assert!(paginator.get_next_entry().await.is_none());
        assert_eq!(paginator.buffered_len().await, 3);

        // Backward replays buffered pages in exact reverse order.
        assert_eq!(content(&paginator.get_previous_entry().await.unwrap()), "page-1");
        assert_eq!(content(&paginator.get_previous_entry().await.unwrap()), "page-0");
        assert!(paginator.get_previous_entry().await.is_none());
        assert_eq!(content(&paginator.current_page().await.unwrap()), "page-0");
    }

    #[tokio::test]
    async fn test_previous_at_start_is_noop() {
        let paginator = Paginator::new(PageSource::from_pages(pages(2)));
        assert!(paginator.get_previous_entry().await.is_none());

        paginator.get_next_entry().await.unwrap();
        assert!(paginator.get_previous_entry().await.is_none());
        assert_eq!(content(&paginator.current_page().await.unwrap()), "page-0");
    }

    #[tokio::test]
    async fn test_backward_never_pulls_from_source() {
        let paginator = Paginator::new(PageSource::from_pages(pages(5)));
        paginator.get_next_entry().await.unwrap();
        paginator.get_next_entry().await.unwrap();

        paginator.get_previous_entry().await.unwrap();
        assert_eq!(paginator.buffered_len().await, 2);

        // Moving forward again replays the buffer before pulling.
        assert_eq!(content(&paginator.get_next_entry().await.unwrap()), "page-1");
        assert_eq!(paginator.buffered_len().await, 2);
        assert_eq!(content(&paginator.get_next_entry().await.unwrap()), "page-2");
        assert_eq!(paginator.buffered_len().await, 3);
    }

    #[tokio::test]
    async fn test_first_and_last_jumps() {
        let paginator = Paginator::new(PageSource::from_pages(pages(4)));

        // First on an unprimed paginator produces the first page.
        assert_eq!(content(&paginator.get_first_entry().await.unwrap()), "page-0");
        assert!(paginator.get_first_entry().await.is_none());

        let last = paginator.get_last_entry().await.unwrap().unwrap();
        assert_eq!(content(&last), "page-3");
        assert!(paginator.is_exhausted().await);
        assert!(paginator.get_last_entry().await.unwrap().is_none());

        assert_eq!(content(&paginator.get_first_entry().await.unwrap()), "page-0");
    }

    #[tokio::test]
    async fn test_unbounded_rejects_jump_to_last() {
        let paginator = Paginator::unbounded(PageSource::from_iter(
            (0..).map(|index| Page::from_content(format!("page-{index}"))),
        ));
        paginator.get_next_entry().await.unwrap();
        assert!(matches!(
            paginator.get_last_entry().await,
            Err(PaginationError::UnsupportedOperation)
        ));
    }

    #[tokio::test]
    async fn test_async_stream_source() {
        let paginator = Paginator::new(PageSource::from_stream(futures::stream::iter(pages(2))));
        assert_eq!(content(&paginator.get_next_entry().await.unwrap()), "page-0");
        assert_eq!(content(&paginator.get_next_entry().await.unwrap()), "page-1");
        assert!(paginator.get_next_entry().await.is_none());
        assert!(paginator.is_exhausted().await);
    }

    #[tokio::test]
    async fn test_closed_source_stops_forward_movement() {
        let paginator = Paginator::new(PageSource::from_pages(pages(3)));
        paginator.get_next_entry().await.unwrap();
        paginator.close_source().await;
        assert!(paginator.get_next_entry().await.is_none());
        assert_eq!(paginator.buffered_len().await, 1);
    }
}
