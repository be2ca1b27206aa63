//! Request parameters for one collection and the transition function that
//! maps every user-level change onto the next set of parameters.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Page size used when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Same field flips the direction; a different field starts ascending.
    pub fn select(&self, field: &str) -> Self {
        if self.field == field {
            Self {
                field: self.field.clone(),
                direction: self.direction.toggled(),
            }
        } else {
            Self::ascending(field)
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::ascending("id")
    }
}

/// Server-side filter constraints, kept in insertion order so the generated
/// query string is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec(IndexMap<String, String>);

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear a constraint. Empty values remove the key.
    /// Returns whether the filter changed.
    pub fn set(&mut self, key: &str, value: Option<&str>) -> bool {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => self.0.insert(key.to_owned(), v.to_owned()).as_deref() != Some(v),
            None => self.0.shift_remove(key).is_some(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterSpec {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut spec = FilterSpec::new();
        for (k, v) in iter {
            let (k, v): (String, String) = (k.into(), v.into());
            spec.set(&k, Some(v.as_str()));
        }
        spec
    }
}

/// Which endpoint a query is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode<'a> {
    /// Server-side paging via the collection endpoint.
    Paged,
    /// Full unpaged keyword search, sliced locally.
    Search(&'a str),
}

/// One logical user action against a list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryChange {
    Page(i64),
    PageSize(u32),
    Filter { key: String, value: Option<String> },
    Sort(String),
    Keyword(Option<String>),
    Refresh,
}

/// The complete parameter set of one collection request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page_index: u32,
    pub page_size: u32,
    pub sort: SortSpec,
    pub filter: FilterSpec,
    pub keyword: Option<String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortSpec::default(),
            filter: FilterSpec::new(),
            keyword: None,
        }
    }
}

impl PageQuery {
    pub fn new(page_size: u32, sort: SortSpec) -> Self {
        Self {
            page_size: page_size.max(1),
            sort,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> FetchMode<'_> {
        match self.keyword.as_deref() {
            Some(keyword) => FetchMode::Search(keyword),
            None => FetchMode::Paged,
        }
    }

    /// Compute the parameters that follow `change`, given the page count
    /// of the most recently applied page.
    pub fn transition(&self, change: QueryChange, total_pages: u32) -> PageQuery {
        let mut next = self.clone();
        match change {
            QueryChange::Page(index) => {
                next.page_index = clamp_page(index, total_pages);
            }
            QueryChange::PageSize(size) => {
                next.page_size = size.max(1);
                next.page_index = 0;
            }
            QueryChange::Filter { key, value } => {
                next.filter.set(&key, value.as_deref());
                next.page_index = 0;
            }
            QueryChange::Sort(field) => {
                next.sort = self.sort.select(&field);
            }
            QueryChange::Keyword(keyword) => {
                let keyword = keyword
                    .map(|k| k.trim().to_owned())
                    .filter(|k| !k.is_empty());
                if keyword != self.keyword {
                    next.page_index = 0;
                }
                next.keyword = keyword;
            }
            QueryChange::Refresh => {}
        }
        next
    }

    /// Query-string pairs for the paged collection endpoint.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_owned(), self.page_index.to_string()),
            ("size".to_owned(), self.page_size.to_string()),
            ("sortBy".to_owned(), self.sort.field.clone()),
            ("sortDir".to_owned(), self.sort.direction.to_string()),
        ];
        pairs.extend(self.filter.iter().map(|(k, v)| (k.to_owned(), v.to_owned())));
        pairs
    }
}

/// Clamp a requested index into `[0, total_pages - 1]`; only 0 is valid
/// while the page count is unknown or the collection is empty.
pub fn clamp_page(index: i64, total_pages: u32) -> u32 {
    if total_pages == 0 {
        return 0;
    }
    let last = i64::from(total_pages) - 1;
    index.clamp(0, last) as u32
}
