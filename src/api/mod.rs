//! Client for the student-management REST backend.
//!
//! Every response arrives wrapped in an [`Envelope`]; a call only succeeds
//! when the HTTP status is 2xx and the envelope reports `status == 200`
//! with `success == true`.

pub mod envelope;
pub mod errors;
pub mod json;
pub mod middleware;
mod resource;

pub use envelope::{Envelope, PagedContent};
pub use errors::ApiError;
pub use resource::ResourceClient;

use crate::config::Config;
use crate::models::{
    Academy, ClassInfo, EntityKind, Major, Referent, Student, Teacher, TotalClass,
};
use crate::paging::{Page, PageQuery};
use crate::resolve::{ReferenceLookup, ResolvedRef};
use crate::session::Session;
use anyhow::Context;
use async_trait::async_trait;
use json::parse_json_with_context;
use middleware::{AuthMiddleware, TransactionLogMiddleware};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Clone)]
pub struct ApiClient {
    http: ClientWithMiddleware,
    base_url: Url,
    session: Session,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        slow_threshold: Duration,
        session: Session,
    ) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(base_url).context("Invalid API base URL")?;
        // `Url::join` drops the last segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let http = ClientBuilder::new(http)
            .with(TransactionLogMiddleware::new(slow_threshold))
            .with(AuthMiddleware::new(session.clone()))
            .build();

        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn from_config(config: &Config, session: Session) -> anyhow::Result<Self> {
        Self::new(
            &config.api_base_url,
            config.request_timeout,
            config.slow_request_threshold,
            session,
        )
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Typed handle on one collection.
    pub fn resource<T>(&self, kind: EntityKind) -> ResourceClient<T> {
        ResourceClient::new(self.clone(), kind)
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    /// `GET <kind>?page,size,sortBy,sortDir[,filters]`
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        query: &PageQuery,
    ) -> Result<Page<T>, ApiError> {
        let url = self.url(kind.path())?;
        let request = self.http.get(url).query(&query.to_query_pairs());
        let envelope: Envelope<PagedContent<T>> = self.execute(request).await?;
        Ok(envelope.into_data()?.into_page(query))
    }

    /// `GET <kind>/search?keyword` returning the full match list.
    pub async fn search<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        keyword: &str,
    ) -> Result<Vec<T>, ApiError> {
        let url = self.url(&format!("{}/search", kind.path()))?;
        let request = self.http.get(url).query(&[("keyword", keyword)]);
        let envelope: Envelope<Vec<T>> = self.execute(request).await?;
        Ok(envelope.into_result()?.unwrap_or_default())
    }

    /// `GET <kind>/{id}`. A 404 (HTTP or envelope) or an empty payload
    /// becomes [`ApiError::NotFound`].
    pub async fn fetch_one<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        id: i64,
    ) -> Result<T, ApiError> {
        let url = self.url(&format!("{}/{id}", kind.path()))?;
        let result = match self.execute::<T>(self.http.get(url)).await {
            Ok(envelope) => envelope.into_result(),
            Err(e) => Err(e),
        };
        match result {
            Ok(Some(entity)) => Ok(entity),
            Ok(None) => Err(ApiError::NotFound { kind, id }),
            Err(e) if e.status() == Some(404) => Err(ApiError::NotFound { kind, id }),
            Err(e) => Err(e),
        }
    }

    /// `POST <kind>`; returns the created entity when the server echoes it.
    pub async fn create<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        kind: EntityKind,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        let url = self.url(kind.path())?;
        let envelope: Envelope<T> = self.execute(self.http.post(url).json(body)).await?;
        envelope.into_result()
    }

    /// `PUT <kind>/{id}`
    pub async fn update<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        kind: EntityKind,
        id: i64,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        let url = self.url(&format!("{}/{id}", kind.path()))?;
        let envelope: Envelope<T> = self.execute(self.http.put(url).json(body)).await?;
        envelope.into_result()
    }

    /// `DELETE <kind>/{id}`
    pub async fn delete(&self, kind: EntityKind, id: i64) -> Result<(), ApiError> {
        let url = self.url(&format!("{}/{id}", kind.path()))?;
        let envelope: Envelope<serde_json::Value> =
            self.execute(self.http.delete(url)).await?;
        envelope.into_result()?;
        debug!(%kind, id, "entity deleted");
        Ok(())
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(http_error(status, url, &body));
        }

        parse_json_with_context(&body).map_err(|source| ApiError::ParseFailed {
            status: status.as_u16(),
            url,
            source,
        })
    }

    async fn fetch_ref<T: DeserializeOwned + Referent>(
        &self,
        kind: EntityKind,
        id: i64,
    ) -> Result<ResolvedRef, ApiError> {
        Ok(self.fetch_one::<T>(kind, id).await?.to_ref())
    }
}

/// Error for a non-2xx response, keeping the envelope message if the body
/// still carried one.
fn http_error(status: StatusCode, url: String, body: &str) -> ApiError {
    let message = serde_json::from_str::<Envelope<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.message);
    ApiError::Http {
        status: status.as_u16(),
        url,
        message,
    }
}

#[async_trait]
impl ReferenceLookup for ApiClient {
    async fn lookup(&self, kind: EntityKind, id: i64) -> Result<ResolvedRef, ApiError> {
        match kind {
            EntityKind::Student => self.fetch_ref::<Student>(kind, id).await,
            EntityKind::Teacher => self.fetch_ref::<Teacher>(kind, id).await,
            EntityKind::Class => self.fetch_ref::<ClassInfo>(kind, id).await,
            EntityKind::TotalClass => self.fetch_ref::<TotalClass>(kind, id).await,
            EntityKind::Major => self.fetch_ref::<Major>(kind, id).await,
            EntityKind::Academy => self.fetch_ref::<Academy>(kind, id).await,
            // Payments and scores carry no display name.
            EntityKind::Payment | EntityKind::Score => Err(ApiError::NotReferable(kind)),
        }
    }
}
