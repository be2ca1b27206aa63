//! Paging state machine for a single collection.
//!
//! Every user action goes through [`PageQuery::transition`] and produces
//! exactly one request. Each request is stamped with a generation number;
//! a response is applied only while its generation is still the latest one,
//! so a slow earlier request can never overwrite a faster later result.
//! State is published through a `watch` channel so readers never block on
//! a fetch in flight.

use super::{FetchMode, Page, PageQuery, QueryChange};
use crate::api::ApiError;
use crate::utils::fmt_duration;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Where a controller gets its rows from.
#[async_trait]
pub trait CollectionSource<T>: Send + Sync {
    /// Fetch one server-side page for `query`.
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page<T>, ApiError>;

    /// Fetch the full, unpaged result list for a keyword search.
    async fn search(&self, keyword: &str) -> Result<Vec<T>, ApiError>;
}

/// Observable controller state.
#[derive(Debug)]
pub struct PageState<T> {
    /// Parameters of the most recently dispatched request.
    pub query: PageQuery,
    /// Generation of the most recently dispatched request.
    pub generation: u64,
    /// Last successfully applied page (empty until the first success).
    pub page: Arc<Page<T>>,
    pub loading: bool,
    /// Human-readable error of the latest failed fetch.
    pub error: Option<String>,
}

impl<T> Clone for PageState<T> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            generation: self.generation,
            page: Arc::clone(&self.page),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

/// What happened to the request issued by one controller operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response replaced the current page.
    Applied,
    /// The fetch failed; the previous page was kept and `error` set.
    Failed,
    /// A newer request was dispatched before this one completed.
    Superseded,
    /// The controller was torn down.
    Cancelled,
}

pub struct PageController<T, S> {
    source: S,
    state: watch::Sender<PageState<T>>,
    cancel: CancellationToken,
}

impl<T, S> PageController<T, S>
where
    T: Send + Sync + 'static,
    S: CollectionSource<T>,
{
    pub fn new(source: S, query: PageQuery) -> Self {
        let (state, _) = watch::channel(PageState {
            page: Arc::new(Page::empty(query.page_size)),
            query,
            generation: 0,
            loading: false,
            error: None,
        });
        Self {
            source,
            state,
            cancel: CancellationToken::new(),
        }
    }

    /// Tie this controller's lifetime to an outer cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn subscribe(&self) -> watch::Receiver<PageState<T>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> PageState<T> {
        self.state.borrow().clone()
    }

    pub fn page(&self) -> Arc<Page<T>> {
        Arc::clone(&self.state.borrow().page)
    }

    pub fn query(&self) -> PageQuery {
        self.state.borrow().query.clone()
    }

    /// Initial fetch with the construction parameters.
    pub async fn load(&self) -> FetchOutcome {
        self.apply(QueryChange::Refresh).await
    }

    pub async fn set_page(&self, index: i64) -> FetchOutcome {
        self.apply(QueryChange::Page(index)).await
    }

    pub async fn set_page_size(&self, size: u32) -> FetchOutcome {
        self.apply(QueryChange::PageSize(size)).await
    }

    pub async fn set_filter(&self, key: &str, value: Option<&str>) -> FetchOutcome {
        self.apply(QueryChange::Filter {
            key: key.to_owned(),
            value: value.map(str::to_owned),
        })
        .await
    }

    pub async fn set_sort(&self, field: &str) -> FetchOutcome {
        self.apply(QueryChange::Sort(field.to_owned())).await
    }

    pub async fn set_keyword(&self, keyword: Option<&str>) -> FetchOutcome {
        self.apply(QueryChange::Keyword(keyword.map(str::to_owned)))
            .await
    }

    /// Re-issue the current request. Call after any successful mutation.
    pub async fn refresh(&self) -> FetchOutcome {
        self.apply(QueryChange::Refresh).await
    }

    /// Stop applying results. In-flight requests finish but are ignored.
    pub fn teardown(&self) {
        self.cancel.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run one transition and the request it produces.
    pub async fn apply(&self, change: QueryChange) -> FetchOutcome {
        if self.cancel.is_cancelled() {
            return FetchOutcome::Cancelled;
        }

        let mut ticket = None;
        self.state.send_modify(|s| {
            s.query = s.query.transition(change, s.page.total_pages);
            s.generation += 1;
            s.loading = true;
            ticket = Some((s.generation, s.query.clone()));
        });
        let Some((generation, query)) = ticket else {
            return FetchOutcome::Cancelled;
        };

        self.dispatch(generation, query).await
    }

    async fn dispatch(&self, mut generation: u64, mut query: PageQuery) -> FetchOutcome {
        loop {
            let start = Instant::now();
            let result = self.fetch(&query).await;

            if self.cancel.is_cancelled() {
                debug!(generation, "controller torn down, dropping response");
                return FetchOutcome::Cancelled;
            }

            let mut outcome = FetchOutcome::Superseded;
            let mut reissue = None;
            self.state.send_if_modified(|s| {
                if s.generation != generation {
                    return false;
                }
                match result {
                    Ok(page) if page.total_pages > 0 && query.page_index >= page.total_pages => {
                        // The collection shrank since the index was chosen.
                        s.query.page_index = page.total_pages - 1;
                        s.generation += 1;
                        reissue = Some((s.generation, s.query.clone()));
                    }
                    Ok(mut page) => {
                        if page.total_pages == 0 {
                            // Empty collection: only page 0 exists.
                            page.page_index = 0;
                        }
                        debug!(
                            generation,
                            page_index = page.page_index,
                            items = page.items.len(),
                            total_pages = page.total_pages,
                            elapsed = fmt_duration(start.elapsed()),
                            "page applied"
                        );
                        s.query.page_index = page.page_index;
                        s.page = Arc::new(page);
                        s.error = None;
                        s.loading = false;
                        outcome = FetchOutcome::Applied;
                    }
                    Err(e) => {
                        warn!(generation, error = %e, "page fetch failed, keeping last page");
                        s.error = Some(e.user_message());
                        s.loading = false;
                        outcome = FetchOutcome::Failed;
                    }
                }
                true
            });

            match reissue {
                Some((next_generation, next_query)) => {
                    debug!(
                        page_index = next_query.page_index,
                        "requested page out of range, refetching last page"
                    );
                    generation = next_generation;
                    query = next_query;
                }
                None => {
                    if outcome == FetchOutcome::Superseded {
                        debug!(generation, "discarding stale page response");
                    }
                    return outcome;
                }
            }
        }
    }

    async fn fetch(&self, query: &PageQuery) -> Result<Page<T>, ApiError> {
        match query.mode() {
            FetchMode::Paged => self.source.fetch_page(query).await,
            FetchMode::Search(keyword) => {
                let all = self.source.search(keyword).await?;
                Ok(Page::from_full_list(all, query.page_index, query.page_size))
            }
        }
    }
}
