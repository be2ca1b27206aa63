//! A list view: one paged collection plus its resolved reference columns.

use crate::models::Listing;
use crate::paging::{
    CollectionSource, FetchOutcome, PageController, PageQuery, PageState, QueryChange,
};
use crate::resolve::{Chain, ReferenceLookup, ReferenceResolver, ResolveReport};
use crate::utils::{fmt_count, log_if_slow};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const SLOW_RESOLVE: Duration = Duration::from_secs(2);

/// One table column.
pub enum Column<T> {
    /// Rendered straight from the row.
    Field {
        header: &'static str,
        value: fn(&T) -> String,
    },
    /// A foreign key rendered as the referenced entity's name.
    Reference {
        header: &'static str,
        chain: Chain<T>,
    },
}

impl<T> Column<T> {
    pub fn field(header: &'static str, value: fn(&T) -> String) -> Self {
        Column::Field { header, value }
    }

    pub fn reference(header: &'static str, chain: Chain<T>) -> Self {
        Column::Reference { header, chain }
    }

    pub fn header(&self) -> &'static str {
        match self {
            Column::Field { header, .. } | Column::Reference { header, .. } => header,
        }
    }

    pub fn chain(&self) -> Option<&Chain<T>> {
        match self {
            Column::Reference { chain, .. } => Some(chain),
            Column::Field { .. } => None,
        }
    }
}

/// Paging controller and reference resolver wired together for one entity
/// kind. Every applied page triggers resolution of all reference columns;
/// dropping the view (or calling [`teardown`](Self::teardown)) stops every
/// further state and cache write.
pub struct ListView<T, S, L> {
    controller: PageController<T, S>,
    resolver: ReferenceResolver<L>,
    columns: Vec<Column<T>>,
    cancel: CancellationToken,
}

impl<T, S, L> ListView<T, S, L>
where
    T: Listing,
    S: CollectionSource<T>,
    L: ReferenceLookup,
{
    pub fn new(source: S, lookup: Arc<L>, page_size: u32) -> Self {
        Self::with_query(source, lookup, PageQuery::new(page_size, T::default_sort()))
    }

    pub fn with_query(source: S, lookup: Arc<L>, query: PageQuery) -> Self {
        let cancel = CancellationToken::new();
        let controller = PageController::new(source, query).with_cancellation(cancel.child_token());
        let resolver = ReferenceResolver::from_arc(lookup).with_cancellation(cancel.child_token());
        Self {
            controller,
            resolver,
            columns: T::columns(),
            cancel,
        }
    }

    pub fn controller(&self) -> &PageController<T, S> {
        &self.controller
    }

    pub fn resolver(&self) -> &ReferenceResolver<L> {
        &self.resolver
    }

    pub fn state(&self) -> PageState<T> {
        self.controller.snapshot()
    }

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

    /// Re-issue the current request; use after create/update/delete.
    pub async fn refresh(&self) -> FetchOutcome {
        self.apply(QueryChange::Refresh).await
    }

    /// Full reload: forget every resolved reference, then refetch.
    pub async fn reload(&self) -> FetchOutcome {
        self.resolver.clear();
        self.refresh().await
    }

    pub async fn apply(&self, change: QueryChange) -> FetchOutcome {
        let outcome = self.controller.apply(change).await;
        if outcome == FetchOutcome::Applied {
            self.resolve_current().await;
        }
        outcome
    }

    async fn resolve_current(&self) -> ResolveReport {
        let page = self.controller.page();
        let start = Instant::now();
        let passes = self
            .columns
            .iter()
            .filter_map(Column::chain)
            .map(|chain| self.resolver.resolve_chained(&page.items, chain));
        let mut total = ResolveReport::default();
        for report in join_all(passes).await {
            total += report;
        }
        log_if_slow(start, SLOW_RESOLVE, "reference resolution");
        total
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(Column::header).collect()
    }

    /// Display rows of the current page. Unresolved references show their
    /// raw ID.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let page = self.controller.page();
        page.items
            .iter()
            .map(|item| {
                self.columns
                    .iter()
                    .map(|column| match column {
                        Column::Field { value, .. } => value(item),
                        Column::Reference { chain, .. } => {
                            self.resolver.display_chain(item, chain)
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Inline error text of the latest failed fetch, if it is still current.
    pub fn error_banner(&self) -> Option<String> {
        self.controller.snapshot().error
    }

    pub fn status_line(&self) -> String {
        let state = self.controller.snapshot();
        let page = &state.page;
        let position = if page.total_pages == 0 {
            "no results".to_owned()
        } else {
            format!("page {}/{}", page.page_index + 1, page.total_pages)
        };
        let mut line = format!(
            "{} {} · {} rows · sorted by {} {}",
            T::KIND,
            position,
            fmt_count(page.total_elements),
            state.query.sort.field,
            state.query.sort.direction
        );
        if let Some(keyword) = &state.query.keyword {
            line.push_str(&format!(" · search \"{keyword}\""));
        }
        for (key, value) in state.query.filter.iter() {
            line.push_str(&format!(" · {key}={value}"));
        }
        line
    }

    pub fn teardown(&self) {
        self.cancel.cancel();
        self.resolver.teardown();
    }
}

impl<T, S, L> Drop for ListView<T, S, L> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
