//! Paged collection client for the student-management REST backend.
//!
//! A [`view::ListView`] pairs a [`paging::PageController`] (server-side
//! paging, sorting and filtering with stale-response suppression) with a
//! [`resolve::ReferenceResolver`] that turns foreign-key IDs into display
//! names through coalesced, cached lookups.

pub mod api;
pub mod cli;
pub mod config;
pub mod fmt;
pub mod logging;
pub mod models;
pub mod paging;
pub mod render;
pub mod resolve;
pub mod session;
pub mod utils;
pub mod view;
