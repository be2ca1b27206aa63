//! Server-side paging, sorting and filtering for one collection.

mod controller;
mod page;
mod query;

pub use controller::{CollectionSource, FetchOutcome, PageController, PageState};
pub use page::Page;
pub use query::{
    DEFAULT_PAGE_SIZE, FetchMode, FilterSpec, PageQuery, QueryChange, SortDirection, SortSpec,
    clamp_page,
};
