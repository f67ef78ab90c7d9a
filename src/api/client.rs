//! HTTP adapter for the GLIMPS backend
//!
//! Every outbound request goes through [`ApiClient::send`], which
//!
//! 1. refreshes the cached bearer token from the [`SessionSource`] when it is
//!    missing or inside the pre-expiry margin,
//! 2. attaches `Authorization: Bearer <token>` when a token is cached,
//! 3. maps `401` to [`AppError::Unauthorized`] after clearing the cache and
//!    notifying the login-redirect handler, and
//! 4. decodes `{"detail": ...}` error bodies for every other failure.

use crate::auth::SessionSource;
use crate::types::{ApiErrorBody, AppError, Result};
use parking_lot::Mutex;
use reqwest::{multipart::Form, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Called whenever the backend rejects the credential with `401`.
pub type UnauthorizedHandler = Arc<dyn Fn() + Send + Sync>;

/// Tunables for the HTTP adapter
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout (default: 30 seconds)
    pub timeout: Duration,
    /// How long a token fetched from the session is trusted (default: 15 minutes)
    pub token_ttl: Duration,
    /// Refresh this long before the validity window closes (default: 30 seconds)
    pub refresh_margin: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            token_ttl: Duration::from_secs(15 * 60),
            refresh_margin: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Bearer token cache with a fixed validity window.
///
/// The window starts when the token is read from the session, not when it was
/// issued; the session is the source of truth and the cache only avoids asking
/// it on every request.
#[derive(Debug)]
pub struct TokenCache {
    ttl: Duration,
    refresh_margin: Duration,
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(ttl: Duration, refresh_margin: Duration) -> Self {
        Self {
            ttl,
            refresh_margin,
            slot: Mutex::new(None),
        }
    }

    /// True when there is no token or `now` is within the refresh margin of expiry.
    pub fn needs_refresh(&self, now: Instant) -> bool {
        match self.slot.lock().as_ref() {
            None => true,
            Some(cached) => now + self.refresh_margin >= cached.expires_at,
        }
    }

    pub fn store(&self, token: String, now: Instant) {
        *self.slot.lock() = Some(CachedToken {
            token,
            expires_at: now + self.ttl,
        });
    }

    /// The cached token, even if it is inside the refresh margin.
    pub fn token(&self) -> Option<String> {
        self.slot.lock().as_ref().map(|c| c.token.clone())
    }

    pub fn clear(&self) {
        *self.slot.lock() = None;
    }
}

/// Client for the GLIMPS REST backend.
///
/// Cheap to clone; clones share the token cache.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionSource>,
    tokens: Arc<TokenCache>,
    on_unauthorized: Option<UnauthorizedHandler>,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8000`).
    pub fn new(
        base_url: impl Into<String>,
        session: Arc<dyn SessionSource>,
        options: ClientOptions,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            tokens: Arc::new(TokenCache::new(options.token_ttl, options.refresh_margin)),
            on_unauthorized: None,
        })
    }

    /// Register the login redirect invoked on `401` responses.
    pub fn with_unauthorized_handler(mut self, handler: UnauthorizedHandler) -> Self {
        self.on_unauthorized = Some(handler);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Drop the cached bearer token so the next request re-reads the session.
    pub fn clear_auth_cache(&self) {
        self.tokens.clear();
    }

    /// Token cache shared by this client and its clones.
    pub fn token_cache(&self) -> &TokenCache {
        &self.tokens
    }

    async fn bearer(&self) -> Option<String> {
        let now = Instant::now();
        if self.tokens.needs_refresh(now) {
            if let Some(token) = self.session.access_token().await {
                self.tokens.store(token, now);
            }
        }
        self.tokens.token()
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let builder = match self.bearer().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "api response");

        if status == StatusCode::UNAUTHORIZED {
            self.tokens.clear();
            if let Some(handler) = &self.on_unauthorized {
                handler();
            }
            return Err(AppError::Unauthorized(
                "session is missing or expired, sign in again".to_string(),
            ));
        }

        Self::check_status(response).await
    }

    /// Requests that must not carry or refresh a credential (login, register).
    async fn send_public(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let message = Self::error_message(response).await;
            return Err(AppError::Unauthorized(message));
        }
        Self::check_status(response).await
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let code = status.as_u16();
        let message = Self::error_message(response).await;
        warn!(status = code, %message, "api request failed");

        if status == StatusCode::NOT_FOUND {
            Err(AppError::NotFound(message))
        } else {
            Err(AppError::Api {
                status: code,
                message,
            })
        }
    }

    async fn error_message(response: Response) -> String {
        let status = response.status();
        match response.json::<ApiErrorBody>().await {
            Ok(body) => body.message(),
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let builder = self.http.get(self.url(path)).query(query);
        Ok(self.send(builder).await?.json::<T>().await?)
    }

    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let builder = self.http.get(self.url(path));
        Ok(self.send(builder).await?.bytes().await?.to_vec())
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.http.post(self.url(path)).json(body);
        Ok(self.send(builder).await?.json::<T>().await?)
    }

    /// POST without a body, parameters in the query string only.
    pub async fn post_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let builder = self.http.post(self.url(path)).query(query);
        Ok(self.send(builder).await?.json::<T>().await?)
    }

    pub async fn post_form<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        let builder = self.http.post(self.url(path)).multipart(form);
        Ok(self.send(builder).await?.json::<T>().await?)
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.http.patch(self.url(path)).json(body);
        Ok(self.send(builder).await?.json::<T>().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let builder = self.http.delete(self.url(path));
        self.send(builder).await?;
        Ok(())
    }

    /// POST JSON without attaching the session credential.
    pub async fn post_public<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.http.post(self.url(path)).json(body);
        Ok(self.send_public(builder).await?.json::<T>().await?)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_cache_empty_needs_refresh() {
        let cache = TokenCache::new(Duration::from_secs(900), Duration::from_secs(30));
        assert!(cache.needs_refresh(Instant::now()));
        assert!(cache.token().is_none());
    }

    #[test]
    fn test_token_cache_refresh_window() {
        let cache = TokenCache::new(Duration::from_secs(900), Duration::from_secs(30));
        let start = Instant::now();
        cache.store("abc".to_string(), start);

        assert!(!cache.needs_refresh(start));
        assert!(!cache.needs_refresh(start + Duration::from_secs(869)));
        // Inside the 30 second margin before the 15 minute window closes
        assert!(cache.needs_refresh(start + Duration::from_secs(870)));
        assert!(cache.needs_refresh(start + Duration::from_secs(901)));

        // A stale token is still handed out until it is replaced or cleared
        assert_eq!(cache.token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_token_cache_clear() {
        let cache = TokenCache::new(Duration::from_secs(900), Duration::from_secs(30));
        cache.store("abc".to_string(), Instant::now());
        cache.clear();
        assert!(cache.token().is_none());
        assert!(cache.needs_refresh(Instant::now()));
    }

    #[test]
    fn test_default_options() {
        let options = ClientOptions::default();
        assert_eq!(options.token_ttl, Duration::from_secs(900));
        assert_eq!(options.refresh_margin, Duration::from_secs(30));
    }
}
