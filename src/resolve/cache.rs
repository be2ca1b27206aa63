//! Reference cache shared by every column of one list view.
//!
//! Keyed by `(kind, id)` so extractors pointing at the same kind share a
//! namespace. A pending entry holds the in-flight lookup itself; anyone
//! who needs the same key awaits that future instead of issuing another
//! request (singleflight per key). Entries are write-once per epoch:
//! `clear` bumps the epoch so lookups started earlier cannot repopulate it.

use crate::models::EntityKind;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, Shared};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub type RefKey = (EntityKind, i64);

pub(crate) type InflightLookup = Shared<BoxFuture<'static, Option<Arc<ResolvedRef>>>>;

/// Display data of a referenced entity plus the IDs it points at, which
/// feed the next hop of a chained resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
    pub kind: EntityKind,
    pub id: i64,
    pub name: String,
    links: Vec<(EntityKind, i64)>,
}

impl ResolvedRef {
    pub fn new(kind: EntityKind, id: i64, name: &str) -> Self {
        Self {
            kind,
            id,
            name: name.to_owned(),
            links: Vec::new(),
        }
    }

    /// Record an outgoing foreign key; `None` leaves the link absent.
    pub fn with_link(mut self, kind: EntityKind, id: Option<i64>) -> Self {
        if let Some(id) = id {
            self.links.push((kind, id));
        }
        self
    }

    pub fn link(&self, kind: EntityKind) -> Option<i64> {
        self.links
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, id)| *id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Pending,
    Resolved,
    Failed,
}

#[derive(Clone)]
enum Slot {
    Pending(InflightLookup),
    Resolved(Arc<ResolvedRef>),
    Failed,
}

impl Slot {
    fn status(&self) -> EntryStatus {
        match self {
            Slot::Pending(_) => EntryStatus::Pending,
            Slot::Resolved(_) => EntryStatus::Resolved,
            Slot::Failed => EntryStatus::Failed,
        }
    }
}

/// Result of asking the cache for a key.
pub(crate) enum Claim {
    /// No entry existed; the caller's lookup was registered as pending.
    Dispatched(InflightLookup),
    /// Another caller's lookup is already in flight.
    Joined(InflightLookup),
    /// Resolved or failed; nothing to do.
    Settled,
}

/// Clone-cheap handle; all clones share one map.
#[derive(Clone, Default)]
pub struct ReferenceCache {
    entries: Arc<DashMap<RefKey, Slot>>,
    epoch: Arc<AtomicU64>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, kind: EntityKind, id: i64) -> Option<EntryStatus> {
        self.entries.get(&(kind, id)).map(|slot| slot.status())
    }

    /// Resolved value, if any. Pending, failed and unseen keys yield `None`.
    pub fn get(&self, kind: EntityKind, id: i64) -> Option<Arc<ResolvedRef>> {
        match self.entries.get(&(kind, id))?.value() {
            Slot::Resolved(r) => Some(Arc::clone(r)),
            _ => None,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Register interest in `key`, starting a lookup via `start` only when
    /// nothing is cached or in flight. `start` receives the current epoch.
    pub(crate) fn claim(
        &self,
        key: RefKey,
        start: impl FnOnce(u64) -> InflightLookup,
    ) -> Claim {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => match entry.get() {
                Slot::Pending(inflight) => Claim::Joined(inflight.clone()),
                Slot::Resolved(_) | Slot::Failed => Claim::Settled,
            },
            Entry::Vacant(entry) => {
                let inflight = start(self.epoch());
                entry.insert(Slot::Pending(inflight.clone()));
                Claim::Dispatched(inflight)
            }
        }
    }

    /// Record a lookup result. Ignored when the cache was cleared after the
    /// lookup started. Returns whether the entry was written.
    pub(crate) fn settle(
        &self,
        key: RefKey,
        epoch: u64,
        outcome: Option<Arc<ResolvedRef>>,
    ) -> bool {
        if epoch != self.epoch() {
            return false;
        }
        let slot = match outcome {
            Some(resolved) => Slot::Resolved(resolved),
            None => Slot::Failed,
        };
        self.entries.insert(key, slot);
        true
    }

    /// Drop every entry (full reload or teardown).
    pub fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(pending, resolved, failed)` entry counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        self.entries
            .iter()
            .fold((0, 0, 0), |(p, r, f), entry| match entry.value().status() {
                EntryStatus::Pending => (p + 1, r, f),
                EntryStatus::Resolved => (p, r + 1, f),
                EntryStatus::Failed => (p, r, f + 1),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn ready(value: Option<Arc<ResolvedRef>>) -> InflightLookup {
        async move { value }.boxed().shared()
    }

    fn major(id: i64) -> Arc<ResolvedRef> {
        Arc::new(ResolvedRef::new(EntityKind::Major, id, "Software Engineering"))
    }

    #[test]
    fn test_claim_then_join() {
        let cache = ReferenceCache::new();
        let key = (EntityKind::Major, 10);
        assert!(matches!(cache.claim(key, |_| ready(None)), Claim::Dispatched(_)));
        assert!(matches!(
            cache.claim(key, |_| panic!("second lookup started")),
            Claim::Joined(_)
        ));
        assert_eq!(cache.status(EntityKind::Major, 10), Some(EntryStatus::Pending));
        assert!(cache.get(EntityKind::Major, 10).is_none());
    }

    #[test]
    fn test_settled_entries_are_not_reclaimed() {
        let cache = ReferenceCache::new();
        let key = (EntityKind::Major, 10);
        let _ = cache.claim(key, |_| ready(None));
        assert!(cache.settle(key, cache.epoch(), None));
        assert_eq!(cache.status(EntityKind::Major, 10), Some(EntryStatus::Failed));
        assert!(matches!(
            cache.claim(key, |_| panic!("failed entry retried")),
            Claim::Settled
        ));
    }

    #[test]
    fn test_clear_rejects_older_epoch() {
        let cache = ReferenceCache::new();
        let key = (EntityKind::Major, 10);
        let started = cache.epoch();
        let _ = cache.claim(key, |_| ready(None));
        cache.clear();
        assert!(!cache.settle(key, started, Some(major(10))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_counts() {
        let cache = ReferenceCache::new();
        let epoch = cache.epoch();
        let _ = cache.claim((EntityKind::Major, 1), |_| ready(None));
        cache.settle((EntityKind::Major, 2), epoch, Some(major(2)));
        cache.settle((EntityKind::Major, 3), epoch, None);
        assert_eq!(cache.counts(), (1, 1, 1));
        assert_eq!(
            cache.get(EntityKind::Major, 2).map(|r| r.name.clone()),
            Some("Software Engineering".to_owned())
        );
    }

    #[test]
    fn test_links() {
        let r = ResolvedRef::new(EntityKind::Class, 1, "1班")
            .with_link(EntityKind::Major, Some(10))
            .with_link(EntityKind::Teacher, None);
        assert_eq!(r.link(EntityKind::Major), Some(10));
        assert_eq!(r.link(EntityKind::Teacher), None);
    }
}
