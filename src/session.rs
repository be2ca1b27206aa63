//! Authenticated session shared by every API call of one application run.
//!
//! The session is created once at startup and handed to the client
//! explicitly; `end` clears it on logout.

use crate::config::Config;
use custom_debug_derive::Debug as CustomDebug;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Clone, CustomDebug)]
struct Credentials {
    user: Option<String>,
    #[debug(with = "crate::fmt::redacted")]
    token: String,
}

/// Cheap-to-clone handle on the current login.
#[derive(Clone, Default, Debug)]
pub struct Session {
    inner: Arc<RwLock<Option<Credentials>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that starts out logged in with `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(Credentials {
                user: None,
                token: token.into(),
            }))),
        }
    }

    /// Log in with the configured credentials, if a token is configured.
    pub async fn from_config(config: &Config) -> Self {
        let session = Self::new();
        if let Some(token) = &config.api_token {
            session.begin(config.api_user.clone(), token.as_str()).await;
        }
        session
    }

    /// Store credentials after a successful login, replacing any previous ones.
    pub async fn begin(&self, user: Option<String>, token: impl Into<String>) {
        let credentials = Credentials {
            user,
            token: token.into(),
        };
        info!(user = ?credentials.user, "session started");
        *self.inner.write().await = Some(credentials);
    }

    /// Logout: forget the token. Subsequent requests go out unauthenticated.
    pub async fn end(&self) {
        if self.inner.write().await.take().is_some() {
            info!("session ended");
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.read().await.as_ref().map(|c| c.token.clone())
    }

    pub async fn user(&self) -> Option<String> {
        self.inner.read().await.as_ref().and_then(|c| c.user.clone())
    }

    pub async fn is_active(&self) -> bool {
        self.inner.read().await.is_some()
    }
}
