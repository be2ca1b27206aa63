//! HTTP middleware for the backend client.

use crate::session::Session;
use crate::utils::fmt_duration;
use http::Extensions;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Attaches the session's bearer token to every outgoing request.
pub struct AuthMiddleware {
    session: Session,
}

impl AuthMiddleware {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait::async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        if !req.headers().contains_key(AUTHORIZATION)
            && let Some(token) = self.session.token().await
        {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    req.headers_mut().insert(AUTHORIZATION, value);
                }
                Err(e) => warn!(error = %e, "session token is not a valid header value, sending unauthenticated"),
            }
        }
        next.run(req, extensions).await
    }
}

/// Logs every request/response pair, warning on slow round-trips.
pub struct TransactionLogMiddleware {
    slow_threshold: Duration,
}

impl TransactionLogMiddleware {
    pub fn new(slow_threshold: Duration) -> Self {
        Self { slow_threshold }
    }
}

#[async_trait::async_trait]
impl Middleware for TransactionLogMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let method = req.method().clone();
        let path = req.url().path().to_owned();
        let query = req.url().query().map(str::to_owned);
        trace!(%method, %path, ?query, "sending request");

        let start = Instant::now();
        let result = next.run(req, extensions).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(resp) => {
                let status = resp.status().as_u16();
                if elapsed > self.slow_threshold {
                    warn!(%method, %path, status, duration = fmt_duration(elapsed), "slow request");
                } else {
                    debug!(%method, %path, status, duration = fmt_duration(elapsed), "request completed");
                }
            }
            Err(e) => {
                warn!(%method, %path, error = %e, duration = fmt_duration(elapsed), "request failed");
            }
        }
        result
    }
}
