use anyhow::{bail, Result};
use futures::stream::{self, Stream, TryStreamExt};
use std::sync::Arc;

use crate::application::ports::RepositorySearch;
use crate::github::Repository;
use crate::infrastructure::logging::{BoundaryLogger, Timer};

/// Position of a crawl: the cursor to resume after and whether the
/// upstream reported more pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlState {
    pub cursor: Option<String>,
    pub has_more: bool,
}

impl CrawlState {
    pub fn initial() -> Self {
        Self {
            cursor: None,
            has_more: true,
        }
    }

    pub fn is_done(&self) -> bool {
        !self.has_more
    }
}

/// RepositoryCrawler - walks the paged repository search to exhaustion
///
/// Each step takes a `CrawlState` and returns the page's repositories with
/// the next state. Throttling is retried below this layer, so any error
/// that reaches the crawler ends the crawl.
pub struct RepositoryCrawler<S>
where
    S: RepositorySearch,
{
    search: Arc<S>,
    logger: Arc<BoundaryLogger>,
}

impl<S> RepositoryCrawler<S>
where
    S: RepositorySearch,
{
    pub fn new(search: Arc<S>, logger: Arc<BoundaryLogger>) -> Self {
        Self { search, logger }
    }

    /// Fetch the page for `state`. A finished state yields nothing and
    /// stays finished.
    pub async fn next_page(&self, trace_id: &str, state: CrawlState) -> Result<(Vec<Repository>, CrawlState)> {
        if state.is_done() {
            return Ok((Vec::new(), state));
        }

        self.logger.page_requested(trace_id, state.cursor.as_deref());
        let timer = Timer::start();
        let page = self.search.search_page(state.cursor.as_deref()).await?;

        let has_more = page.page_info.has_next_page;
        let cursor = page.page_info.end_cursor;
        if has_more && (cursor.is_none() || cursor == state.cursor) {
            bail!(
                "Repository search reported more pages but the cursor did not advance (cursor: {:?})",
                cursor
            );
        }

        self.logger.page_fetched(
            trace_id,
            page.repositories.len(),
            has_more,
            cursor.as_deref(),
            timer.elapsed_ms(),
        );

        Ok((page.repositories, CrawlState { cursor, has_more }))
    }

    /// Every repository of the search, page by page, in upstream order.
    /// The stream ends after the page reporting no next page, or with the
    /// first error.
    pub fn repositories<'a>(&'a self, trace_id: &'a str) -> impl Stream<Item = Result<Repository>> + 'a {
        stream::try_unfold(CrawlState::initial(), move |state| async move {
            if state.is_done() {
                return Ok::<_, anyhow::Error>(None);
            }
            let (repositories, next) = self.next_page(trace_id, state).await?;
            let page = stream::iter(repositories.into_iter().map(Ok::<Repository, anyhow::Error>));
            Ok(Some((page, next)))
        })
        .try_flatten()
    }
}
