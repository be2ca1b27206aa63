use super::cache::{Claim, InflightLookup, RefKey, ReferenceCache, ResolvedRef};
use crate::api::ApiError;
use crate::models::{EntityKind, raw_id};
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::join_all;
use indexmap::IndexSet;
use std::ops::AddAssign;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Fetches a single referenced entity by ID.
#[async_trait]
pub trait ReferenceLookup: Send + Sync + 'static {
    async fn lookup(&self, kind: EntityKind, id: i64) -> Result<ResolvedRef, ApiError>;
}

/// Pulls one foreign-key ID out of a row.
pub struct Extractor<T> {
    pub field: &'static str,
    pub kind: EntityKind,
    extract: fn(&T) -> Option<i64>,
}

impl<T> Clone for Extractor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Extractor<T> {}

impl<T> Extractor<T> {
    pub fn new(field: &'static str, kind: EntityKind, extract: fn(&T) -> Option<i64>) -> Self {
        Self {
            field,
            kind,
            extract,
        }
    }

    pub fn extract(&self, item: &T) -> Option<i64> {
        (self.extract)(item)
    }
}

/// A reference followed through further hops, e.g. class → major → academy.
/// Each hop reads the next ID from the previous hop's resolved links.
pub struct Chain<T> {
    pub root: Extractor<T>,
    pub hops: Vec<EntityKind>,
}

impl<T> Clone for Chain<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root,
            hops: self.hops.clone(),
        }
    }
}

impl<T> Chain<T> {
    pub fn single(root: Extractor<T>) -> Self {
        Self {
            root,
            hops: Vec::new(),
        }
    }

    pub fn then(mut self, kind: EntityKind) -> Self {
        self.hops.push(kind);
        self
    }

    /// Kind whose name this chain finally displays.
    pub fn target(&self) -> EntityKind {
        self.hops.last().copied().unwrap_or(self.root.kind)
    }
}

/// What one resolve pass did, mostly for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveReport {
    /// Distinct keys seen.
    pub requested: usize,
    /// New lookups issued.
    pub dispatched: usize,
    /// Keys already in flight from an earlier call.
    pub joined: usize,
    /// Keys already resolved or failed.
    pub cached: usize,
}

impl AddAssign for ResolveReport {
    fn add_assign(&mut self, rhs: Self) {
        self.requested += rhs.requested;
        self.dispatched += rhs.dispatched;
        self.joined += rhs.joined;
        self.cached += rhs.cached;
    }
}

/// Best-effort foreign-key → display-name resolution for one list view.
///
/// Failures are contained: a failed lookup marks its key `failed`, is never
/// retried until [`clear`](Self::clear), and renders as the raw ID.
pub struct ReferenceResolver<L> {
    lookup: Arc<L>,
    cache: ReferenceCache,
    cancel: CancellationToken,
}

impl<L: ReferenceLookup> ReferenceResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self::from_arc(Arc::new(lookup))
    }

    pub fn from_arc(lookup: Arc<L>) -> Self {
        Self {
            lookup,
            cache: ReferenceCache::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Tie cache writes to an outer cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    /// Resolve every ID the extractors find in `items`. Returns once all
    /// lookups this call depends on have settled.
    pub async fn resolve<T>(&self, items: &[T], extractors: &[Extractor<T>]) -> ResolveReport {
        // Collected before awaiting so the returned future stays Send.
        let keys: IndexSet<RefKey> = extractors
            .iter()
            .flat_map(|extractor| {
                items
                    .iter()
                    .filter_map(move |item| extractor.extract(item).map(|id| (extractor.kind, id)))
            })
            .collect();
        self.resolve_keys(keys).await
    }

    /// Resolve a multi-hop chain. A hop is attempted for an item only after
    /// its predecessor resolved; failed or missing predecessors end the chain.
    pub async fn resolve_chained<T>(&self, items: &[T], chain: &Chain<T>) -> ResolveReport {
        let mut frontier: Vec<Option<RefKey>> = items
            .iter()
            .map(|item| chain.root.extract(item).map(|id| (chain.root.kind, id)))
            .collect();
        let roots: Vec<RefKey> = frontier.iter().flatten().copied().collect();
        let mut report = self.resolve_keys(roots).await;

        for &hop in &chain.hops {
            frontier = frontier
                .into_iter()
                .map(|key| {
                    let (kind, id) = key?;
                    let resolved = self.cache.get(kind, id)?;
                    resolved.link(hop).map(|next| (hop, next))
                })
                .collect();
            let next: Vec<RefKey> = frontier.iter().flatten().copied().collect();
            report += self.resolve_keys(next).await;
        }
        report
    }

    /// Resolve an explicit set of keys, deduplicated, concurrently.
    pub async fn resolve_keys(&self, keys: impl IntoIterator<Item = RefKey>) -> ResolveReport {
        let keys: IndexSet<RefKey> = keys.into_iter().collect();
        let mut report = ResolveReport {
            requested: keys.len(),
            ..ResolveReport::default()
        };
        if keys.is_empty() || self.cancel.is_cancelled() {
            return report;
        }

        let mut waits = Vec::new();
        for key in keys {
            match self.cache.claim(key, |epoch| self.start_lookup(key, epoch)) {
                Claim::Dispatched(inflight) => {
                    report.dispatched += 1;
                    waits.push(inflight);
                }
                Claim::Joined(inflight) => {
                    report.joined += 1;
                    waits.push(inflight);
                }
                Claim::Settled => report.cached += 1,
            }
        }

        trace!(?report, "waiting on reference lookups");
        join_all(waits).await;
        debug!(
            requested = report.requested,
            dispatched = report.dispatched,
            joined = report.joined,
            cached = report.cached,
            "references resolved"
        );
        report
    }

    fn start_lookup(&self, key: RefKey, epoch: u64) -> InflightLookup {
        let lookup = Arc::clone(&self.lookup);
        let cache = self.cache.clone();
        let cancel = self.cancel.clone();
        async move {
            let (kind, id) = key;
            let outcome = match lookup.lookup(kind, id).await {
                Ok(resolved) => Some(Arc::new(resolved)),
                Err(e) => {
                    warn!(%kind, id, error = %e, "reference lookup failed, showing raw id");
                    None
                }
            };
            if cancel.is_cancelled() {
                debug!(%kind, id, "resolver torn down, dropping lookup result");
            } else {
                cache.settle(key, epoch, outcome.clone());
            }
            outcome
        }
        .boxed()
        .shared()
    }

    /// Pure read: the resolved value, or `None` while pending, after a
    /// failure, or for an ID never seen.
    pub fn get_display(&self, kind: EntityKind, id: i64) -> Option<Arc<ResolvedRef>> {
        self.cache.get(kind, id)
    }

    /// Display string for a single-hop reference: the name, else the raw ID.
    pub fn display<T>(&self, item: &T, extractor: &Extractor<T>) -> String {
        match extractor.extract(item) {
            Some(id) => self
                .get_display(extractor.kind, id)
                .map(|r| r.name.clone())
                .unwrap_or_else(|| id.to_string()),
            None => raw_id(None),
        }
    }

    /// Display string for a chain: the last hop's name when every hop
    /// resolved, `-` when a resolved hop has no outgoing link, otherwise the
    /// raw ID of the first hop.
    pub fn display_chain<T>(&self, item: &T, chain: &Chain<T>) -> String {
        let Some(first) = chain.root.extract(item) else {
            return raw_id(None);
        };
        let Some(mut current) = self.get_display(chain.root.kind, first) else {
            return first.to_string();
        };
        for &hop in &chain.hops {
            let Some(next_id) = current.link(hop) else {
                return raw_id(None);
            };
            match self.get_display(hop, next_id) {
                Some(next) => current = next,
                None => return first.to_string(),
            }
        }
        current.name.clone()
    }

    /// Forget everything (full reload). Lookups still in flight are ignored.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Stop applying results and drop the cache.
    pub fn teardown(&self) {
        self.cancel.cancel();
        self.cache.clear();
    }
}
