//! Response envelopes wrapping every backend payload.

use super::ApiError;
use crate::paging::{Page, PageQuery};
use serde::Deserialize;

/// `{status, success, message, data}` as sent by the backend.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: i64,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_ok(&self) -> bool {
        self.status == 200 && self.success
    }

    /// Payload of a successful envelope, which may legitimately be empty
    /// (e.g. for deletes).
    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        if self.is_ok() {
            Ok(self.data)
        } else {
            Err(ApiError::Envelope {
                status: self.status,
                message: self.message,
            })
        }
    }

    /// Payload of a successful envelope that must carry data.
    pub fn into_data(self) -> Result<T, ApiError> {
        let status = self.status;
        self.into_result()?.ok_or(ApiError::Envelope {
            status,
            message: Some("response carried no data".to_owned()),
        })
    }
}

/// The `data` of a paged collection response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedContent<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
}

impl<T> PagedContent<T> {
    /// Attach the request's position; the server only reports totals.
    pub fn into_page(self, query: &PageQuery) -> Page<T> {
        let mut content = self.content;
        content.truncate(query.page_size.max(1) as usize);
        Page {
            items: content,
            page_index: query.page_index,
            page_size: query.page_size.max(1),
            total_pages: self.total_pages,
            total_elements: self.total_elements,
        }
    }
}
