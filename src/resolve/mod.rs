//! Foreign-key resolution for list views.

mod cache;
mod resolver;

pub use cache::{EntryStatus, RefKey, ReferenceCache, ResolvedRef};
pub use resolver::{Chain, Extractor, ReferenceLookup, ReferenceResolver, ResolveReport};
