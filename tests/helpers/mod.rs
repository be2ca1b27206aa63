#![allow(dead_code)]

pub mod mock_backend;

use async_trait::async_trait;
use roster::api::ApiError;
use roster::models::{EntityKind, Student};
use roster::paging::{CollectionSource, Page, PageQuery};
use roster::resolve::{RefKey, ReferenceLookup, ResolvedRef};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Semaphore, oneshot};

pub fn student(id: i64, name: &str, class_id: Option<i64>, major_id: Option<i64>) -> Student {
    Student {
        id,
        name: name.to_owned(),
        student_no: Some(format!("2024{id:04}")),
        gender: None,
        phone: None,
        class_id,
        major_id,
    }
}

/// `count` students with ids `1..=count`, all in major 10.
pub fn students(count: i64) -> Vec<Student> {
    (1..=count)
        .map(|id| student(id, &format!("student-{id}"), Some(1), Some(10)))
        .collect()
}

pub fn envelope_error(message: &str) -> ApiError {
    ApiError::Envelope {
        status: 500,
        message: Some(message.to_owned()),
    }
}

/// Poll `check` until it holds, failing the test after a few seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// In-memory collection paged the way the backend does: an out-of-range
/// page comes back empty with the real page count.
pub struct MemorySource<T> {
    rows: Mutex<Vec<T>>,
    failure: Mutex<Option<String>>,
    queries: Mutex<Vec<PageQuery>>,
    searches: Mutex<Vec<String>>,
    matcher: fn(&T, &str) -> bool,
}

impl<T: Clone> MemorySource<T> {
    pub fn new(rows: Vec<T>, matcher: fn(&T, &str) -> bool) -> Self {
        Self {
            rows: Mutex::new(rows),
            failure: Mutex::new(None),
            queries: Mutex::new(Vec::new()),
            searches: Mutex::new(Vec::new()),
            matcher,
        }
    }

    pub fn set_rows(&self, rows: Vec<T>) {
        *self.rows.lock().unwrap() = rows;
    }

    /// Make every following call fail with an envelope error; `None` heals.
    pub fn fail_with(&self, message: Option<&str>) {
        *self.failure.lock().unwrap() = message.map(str::to_owned);
    }

    pub fn queries(&self) -> Vec<PageQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn last_query(&self) -> PageQuery {
        self.queries().pop().expect("no page requested")
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    fn check_failure(&self) -> Result<(), ApiError> {
        match self.failure.lock().unwrap().as_deref() {
            Some(message) => Err(envelope_error(message)),
            None => Ok(()),
        }
    }
}

impl MemorySource<Student> {
    pub fn students(rows: Vec<Student>) -> Self {
        Self::new(rows, |s, keyword| s.name.contains(keyword))
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> CollectionSource<T> for MemorySource<T> {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page<T>, ApiError> {
        self.queries.lock().unwrap().push(query.clone());
        self.check_failure()?;

        let rows = self.rows.lock().unwrap().clone();
        let size = query.page_size as usize;
        let total_pages = rows.len().div_ceil(size) as u32;
        Ok(Page {
            items: rows
                .iter()
                .skip(query.page_index as usize * size)
                .take(size)
                .cloned()
                .collect(),
            page_index: query.page_index,
            page_size: query.page_size,
            total_pages,
            total_elements: rows.len() as u64,
        })
    }

    async fn search(&self, keyword: &str) -> Result<Vec<T>, ApiError> {
        self.searches.lock().unwrap().push(keyword.to_owned());
        self.check_failure()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|row| (self.matcher)(row, keyword))
            .cloned()
            .collect())
    }
}

type PageReply<T> = oneshot::Sender<Result<Page<T>, ApiError>>;

/// A source whose responses are released by the test, in any order.
pub struct ScriptedSource<T> {
    calls: Mutex<Vec<(PageQuery, Option<PageReply<T>>)>>,
}

impl<T> Default for ScriptedSource<T> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl<T> ScriptedSource<T> {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn query(&self, call: usize) -> PageQuery {
        self.calls.lock().unwrap()[call].0.clone()
    }

    /// Complete request number `call` (zero-based, in dispatch order).
    pub fn reply(&self, call: usize, result: Result<Page<T>, ApiError>) {
        let sender = self.calls.lock().unwrap()[call]
            .1
            .take()
            .expect("request already answered");
        let _ = sender.send(result);
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> CollectionSource<T> for ScriptedSource<T> {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page<T>, ApiError> {
        let (tx, rx) = oneshot::channel();
        self.calls.lock().unwrap().push((query.clone(), Some(tx)));
        rx.await
            .unwrap_or_else(|_| Err(envelope_error("scripted reply dropped")))
    }

    async fn search(&self, _keyword: &str) -> Result<Vec<T>, ApiError> {
        Ok(Vec::new())
    }
}

/// Page helper for scripted replies.
pub fn page_of<T>(items: Vec<T>, page_index: u32, total_pages: u32, total_elements: u64) -> Page<T> {
    Page {
        page_size: items.len().max(1) as u32,
        items,
        page_index,
        total_pages,
        total_elements,
    }
}

/// Reference lookup backed by a fixed table that records every call.
/// Optionally blocks each lookup until the test releases it.
#[derive(Default)]
pub struct CountingLookup {
    table: HashMap<RefKey, ResolvedRef>,
    failing: HashSet<RefKey>,
    calls: Mutex<Vec<RefKey>>,
    gate: Option<Arc<Semaphore>>,
}

impl CountingLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolved: ResolvedRef) -> Self {
        self.table.insert((resolved.kind, resolved.id), resolved);
        self
    }

    pub fn failing(mut self, kind: EntityKind, id: i64) -> Self {
        self.failing.insert((kind, id));
        self
    }

    /// Hold every lookup until [`release`](Self::release) is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn release(&self, lookups: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(lookups);
        }
    }

    pub fn calls(&self) -> Vec<RefKey> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, kind: EntityKind, id: i64) -> usize {
        self.calls()
            .iter()
            .filter(|&&key| key == (kind, id))
            .count()
    }

    /// A standard table: majors 10 and 20 in academies 1 and 2, classes 1-2.
    pub fn school() -> Self {
        Self::new()
            .with(ResolvedRef::new(EntityKind::Academy, 1, "School of Computing"))
            .with(ResolvedRef::new(EntityKind::Academy, 2, "School of Business"))
            .with(
                ResolvedRef::new(EntityKind::Major, 10, "Software Engineering")
                    .with_link(EntityKind::Academy, Some(1)),
            )
            .with(
                ResolvedRef::new(EntityKind::Major, 20, "Accounting")
                    .with_link(EntityKind::Academy, Some(2)),
            )
            .with(
                ResolvedRef::new(EntityKind::Class, 1, "SE 2024-1")
                    .with_link(EntityKind::Major, Some(10)),
            )
            .with(ResolvedRef::new(EntityKind::Class, 2, "AC 2024-1"))
    }
}

#[async_trait]
impl ReferenceLookup for CountingLookup {
    async fn lookup(&self, kind: EntityKind, id: i64) -> Result<ResolvedRef, ApiError> {
        self.calls.lock().unwrap().push((kind, id));
        if let Some(gate) = &self.gate
            && let Ok(permit) = gate.acquire().await
        {
            permit.forget();
        }
        // Give concurrent callers a chance to pile up on the same key.
        tokio::task::yield_now().await;

        if self.failing.contains(&(kind, id)) {
            return Err(ApiError::NotFound { kind, id });
        }
        self.table
            .get(&(kind, id))
            .cloned()
            .ok_or(ApiError::NotFound { kind, id })
    }
}
