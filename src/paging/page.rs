use serde::{Deserialize, Serialize};

/// One page of a collection, in server order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_index: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn empty(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            page_index: 0,
            page_size: page_size.max(1),
            total_pages: 0,
            total_elements: 0,
        }
    }

    /// Build a virtual page out of an unpaged result list.
    ///
    /// `page_index` is clamped to the last page so a shrinking search result
    /// never yields an out-of-range page.
    pub fn from_full_list(all: Vec<T>, page_index: u32, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let total_elements = all.len() as u64;
        let total_pages = all.len().div_ceil(page_size as usize) as u32;
        let page_index = if total_pages == 0 {
            0
        } else {
            page_index.min(total_pages - 1)
        };

        let start = page_index as usize * page_size as usize;
        let items: Vec<T> = all.into_iter().skip(start).take(page_size as usize).collect();

        Self {
            items,
            page_index,
            page_size,
            total_pages,
            total_elements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page_index + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page_index > 0
    }
}
