//! # Pagination
//!
//! A pagination engine over lazy page sources. [`Paginator`] walks a
//! forward-only [`PageSource`] while buffering produced pages so backward
//! movement never re-invokes the source; [`ComponentPaginator`] wraps the
//! engine in a component executor rendering navigation buttons. The
//! [`paginate_lines`] helpers chunk an iterator of lines into page-sized
//! strings for the common "paginate this wall of text" case.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::stream::{Stream, StreamExt};
use serde_json::Value;

use crate::platform::ResponseData;

pub mod components;
pub mod paginator;

pub use components::{ComponentPaginator, NavigationAction};
pub use paginator::Paginator;

/// Emoji used to jump back to the first entry.
pub const LEFT_DOUBLE_TRIANGLE: &str = "\u{23ee}\u{fe0f}";
/// Emoji used to go back an entry.
pub const LEFT_TRIANGLE: &str = "\u{25c0}\u{fe0f}";
/// Emoji used to close a paginated message.
pub const STOP_SQUARE: &str = "\u{23f9}\u{fe0f}";
/// Emoji used to continue to the next entry.
pub const RIGHT_TRIANGLE: &str = "\u{25b6}\u{fe0f}";
/// Emoji used to jump to the last entry.
pub const RIGHT_DOUBLE_TRIANGLE: &str = "\u{23ed}\u{fe0f}";
/// Alternative close emoji.
pub const BLACK_CROSS: &str = "\u{2716}\u{fe0f}";

/// One pre-rendered unit of paginated content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub content: Option<String>,
    pub embeds: Vec<Value>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: Vec::new(),
        }
    }

    pub fn from_embed(embed: Value) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn embed(mut self, embed: Value) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Convert into a response body, leaving components untouched.
    pub fn to_response_data(&self) -> ResponseData {
        ResponseData {
            content: self.content.clone(),
            embeds: self.embeds.clone(),
            ..ResponseData::default()
        }
    }
}

/// A lazy, forward-only sequence of pages; synchronous or asynchronous.
pub enum PageSource {
    Iter(Box<dyn Iterator<Item = Page> + Send>),
    Stream(Pin<Box<dyn Stream<Item = Page> + Send>>),
}

impl PageSource {
    /// Source over an already-materialised list of pages.
    pub fn from_pages(pages: Vec<Page>) -> Self {
        Self::Iter(Box::new(pages.into_iter()))
    }

    /// Source over a synchronous iterator.
    pub fn from_iter<I>(pages: I) -> Self
    where
        I: IntoIterator<Item = Page>,
        I::IntoIter: Send + 'static,
    {
        Self::Iter(Box::new(pages.into_iter()))
    }

    /// Source over an asynchronous stream. Pulling suspends the caller
    /// until the stream yields or completes.
    pub fn from_stream<S>(pages: S) -> Self
    where
        S: Stream<Item = Page> + Send + 'static,
    {
        Self::Stream(Box::pin(pages))
    }

    pub(crate) async fn next_page(&mut self) -> Option<Page> {
        match self {
            Self::Iter(iterator) => iterator.next(),
            Self::Stream(stream) => stream.next().await,
        }
    }
}

/// Limits applied while chunking lines into pages.
#[derive(Debug, Clone)]
pub struct LineLimits {
    /// Maximum characters per page.
    pub char_limit: usize,
    /// Maximum lines per page.
    pub line_limit: usize,
    /// Optional page wrapper containing a `{}` placeholder.
    pub wrapper: Option<String>,
}

impl Default for LineLimits {
    fn default() -> Self {
        Self {
            char_limit: 2000,
            line_limit: 25,
            wrapper: None,
        }
    }
}

struct LineChunker {
    char_limit: usize,
    line_limit: usize,
    wrapper: Option<String>,
    page: Vec<String>,
    page_size: usize,
}

impl LineChunker {
    fn new(limits: LineLimits) -> Self {
        let mut char_limit = limits.char_limit;
        if let Some(wrapper) = &limits.wrapper {
            char_limit = char_limit.saturating_sub(wrapper.len() + 2);
        }
        Self {
            char_limit,
            line_limit: limits.line_limit,
            wrapper: limits.wrapper,
            page: Vec::new(),
            page_size: 0,
        }
    }

    fn wrap(&self, page: String) -> String {
        match &self.wrapper {
            Some(wrapper) => wrapper.replacen("{}", &page, 1),
            None => page,
        }
    }

    fn take_page(&mut self) -> String {
        let page = self.page.join("\n");
        self.page.clear();
        self.page_size = 0;
        self.wrap(page)
    }

    /// Feed one line, returning any pages that became complete.
    fn feed(&mut self, line: &str) -> Vec<String> {
        let mut ready = Vec::new();
        let line_length = line.chars().count();

        // Emit the pending page once the next line would overflow it.
        if self.page.len() >= self.line_limit
            || (!self.page.is_empty() && self.page_size + line_length > self.char_limit)
        {
            ready.push(self.take_page());
        }

        if line_length >= self.char_limit {
            // Split an overlong line into full sub-pages; a short remainder
            // joins the next page to avoid terraced tiny pages.
            let characters: Vec<char> = line.chars().collect();
            let mut chunks: VecDeque<String> = characters
                .chunks(self.char_limit.max(1))
                .map(|chunk| chunk.iter().collect())
                .collect();

            if let Some(last) = chunks.pop_back() {
                if last.chars().count() < self.char_limit {
                    self.page_size += last.chars().count();
                    self.page.push(last);
                } else {
                    chunks.push_back(last);
                }
            }

            for chunk in chunks {
                ready.push(self.wrap(chunk));
            }
        } else {
            self.page_size += line_length;
            self.page.push(line.to_owned());
        }

        ready
    }

    fn finish(&mut self) -> Option<String> {
        if self.page.is_empty() {
            None
        } else {
            Some(self.take_page())
        }
    }
}

/// Lazily chunk an iterator of lines into page-sized strings.
pub fn paginate_lines<I>(lines: I, limits: LineLimits) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = String>,
{
    let mut lines = lines.into_iter();
    let mut chunker = LineChunker::new(limits);
    let mut ready: VecDeque<String> = VecDeque::new();
    let mut done = false;

    std::iter::from_fn(move || loop {
        if let Some(page) = ready.pop_front() {
            return Some(page);
        }
        if done {
            return None;
        }
        match lines.next() {
            Some(line) => ready.extend(chunker.feed(&line)),
            None => {
                done = true;
                ready.extend(chunker.finish());
            }
        }
    })
}

/// Lazily chunk a stream of lines into page-sized strings.
pub fn paginate_lines_stream<S>(lines: S, limits: LineLimits) -> impl Stream<Item = String> + Send
where
    S: Stream<Item = String> + Send + 'static,
{
    struct State<S> {
        lines: Pin<Box<S>>,
        chunker: LineChunker,
        ready: VecDeque<String>,
        done: bool,
    }

    let state = State {
        lines: Box::pin(lines),
        chunker: LineChunker::new(limits),
        ready: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(page) = state.ready.pop_front() {
                return Some((page, state));
            }
            if state.done {
                return None;
            }
            match state.lines.next().await {
                Some(line) => {
                    let pages = state.chunker.feed(&line);
                    state.ready.extend(pages);
                }
                None => {
                    state.done = true;
                    let page = state.chunker.finish();
                    state.ready.extend(page);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(char_limit: usize, line_limit: usize) -> LineLimits {
        LineLimits {
            char_limit,
            line_limit,
            wrapper: None,
        }
    }

    #[test]
    fn test_lines_chunk_by_line_limit() {
        let lines: Vec<String> = (0..5).map(|index| format!("line{index}")).collect();
        let pages: Vec<String> = paginate_lines(lines, limits(2000, 2)).collect();
        assert_eq!(pages, vec!["line0\nline1", "line2\nline3", "line4"]);
    }

    #[test]
    fn test_lines_chunk_by_char_limit() {
        let lines = vec!["aaaa".to_owned(), "bbbb".to_owned(), "cc".to_owned()];
        let pages: Vec<String> = paginate_lines(lines, limits(9, 25)).collect();
        assert_eq!(pages, vec!["aaaa\nbbbb", "cc"]);
    }

    #[test]
    fn test_overlong_line_is_split_and_remainder_carries_over() {
        let lines = vec!["x".repeat(25), "tail".to_owned()];
        let pages: Vec<String> = paginate_lines(lines, limits(10, 25)).collect();
        // Two full sub-pages; the 5-char remainder joins the next page.
        assert_eq!(pages[0], "x".repeat(10));
        assert_eq!(pages[1], "x".repeat(10));
        assert_eq!(pages[2], format!("{}\ntail", "x".repeat(5)));
    }

    #[test]
    fn test_wrapper_is_applied_per_page() {
        let lines = vec!["a".to_owned(), "b".to_owned()];
        let pages: Vec<String> = paginate_lines(
            lines,
            LineLimits {
                char_limit: 2000,
                line_limit: 1,
                wrapper: Some("```\n{}\n```".to_owned()),
            },
        )
        .collect();
        assert_eq!(pages, vec!["```\na\n```", "```\nb\n```"]);
    }

    #[test]
    fn test_empty_input_yields_no_pages() {
        let pages: Vec<String> = paginate_lines(Vec::<String>::new(), LineLimits::default()).collect();
        assert!(pages.is_empty());
    }

    #[tokio::test]
    async fn test_stream_chunking_matches_sync() {
        let lines: Vec<String> = (0..5).map(|index| format!("line{index}")).collect();
        let sync_pages: Vec<String> = paginate_lines(lines.clone(), limits(2000, 2)).collect();
        let stream_pages: Vec<String> =
            paginate_lines_stream(futures::stream::iter(lines), limits(2000, 2))
                .collect()
                .await;
        assert_eq!(sync_pages, stream_pages);
    }

    #[test]
    fn test_page_to_response_data() {
        let page = Page::from_content("hello").embed(serde_json::json!({"title": "t"}));
        let data = page.to_response_data();
        assert_eq!(data.content.as_deref(), Some("hello"));
        assert_eq!(data.embeds.len(), 1);
    }
}
