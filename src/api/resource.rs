use super::{ApiClient, ApiError};
use crate::models::EntityKind;
use crate::paging::{CollectionSource, Page, PageQuery};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Typed view of one backend collection: paging, search and the thin
/// create/update/delete wrappers used by edit forms.
pub struct ResourceClient<T> {
    api: ApiClient,
    kind: EntityKind,
    _rows: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self::new(self.api.clone(), self.kind)
    }
}

impl<T> ResourceClient<T> {
    pub(super) fn new(api: ApiClient, kind: EntityKind) -> Self {
        Self {
            api,
            kind,
            _rows: PhantomData,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }
}

impl<T: DeserializeOwned> ResourceClient<T> {
    pub async fn get(&self, id: i64) -> Result<T, ApiError> {
        self.api.fetch_one(self.kind, id).await
    }

    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<Option<T>, ApiError> {
        self.api.create(self.kind, body).await
    }

    pub async fn update<B: Serialize + ?Sized>(
        &self,
        id: i64,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        self.api.update(self.kind, id, body).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(self.kind, id).await
    }
}

#[async_trait]
impl<T> CollectionSource<T> for ResourceClient<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page<T>, ApiError> {
        self.api.fetch_page(self.kind, query).await
    }

    async fn search(&self, keyword: &str) -> Result<Vec<T>, ApiError> {
        self.api.search(self.kind, keyword).await
    }
}
