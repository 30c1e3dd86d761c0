use std::future::Future;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::Form;
use reqwest::{Client, Method, Request, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::envelope::{parse_body, unwrap_body};
use crate::config::{AppConfig, ConfigError};
use crate::error::ApiError;
use crate::session::SessionContext;

pub type ApiResult<T> = Result<T, ApiError>;

/// Identity endpoint
pub const CURRENT_USER_PATH: &str = "/auth/me";
/// Identity endpoint from before the auth routes moved, tried once as a fallback
pub const LEGACY_CURRENT_USER_PATH: &str = "/admin/me";

/// Event handed to the host when the backend rejects the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionExpired {
    /// Where the host should send the user
    pub login_route: String,
    /// Message of the request that triggered the teardown
    pub message: String,
}

pub type SessionExpiredHook = Arc<dyn Fn(&SessionExpired) + Send + Sync>;

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// A 2xx response, passed through as-is
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl ApiResponse {
    /// Payload with any `{ data: ... }` envelope removed
    pub fn into_payload(self) -> Value {
        unwrap_body(self.body)
    }

    pub fn json<T: DeserializeOwned>(self) -> ApiResult<T> {
        let status = self.status;
        serde_json::from_value(self.into_payload()).map_err(|e| {
            ApiError::payload(Some(status), format!("Unexpected response shape: {}", e))
        })
    }
}

/// Authenticated client for the admin backend.
///
/// Every request gets the session's bearer token attached right before it is
/// executed, and every failure comes back as an [`ApiError`]. A 401 clears
/// the session and notifies the host through the session-expired hook.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionContext,
    login_route: String,
    log_requests: bool,
    on_session_expired: Option<SessionExpiredHook>,
}

impl ApiClient {
    pub fn new(config: &AppConfig, session: SessionContext) -> Result<Self, ClientBuildError> {
        config.validate()?;

        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            session,
            login_route: config.session.login_route.clone(),
            log_requests: config.api.enable_request_logging,
            on_session_expired: None,
        })
    }

    /// Register the callback fired when a 401 tears the session down
    pub fn on_session_expired<F>(mut self, hook: F) -> Self
    where
        F: Fn(&SessionExpired) + Send + Sync + 'static,
    {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a resource path against the base URL. Absolute URLs are kept.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request; finish it with [`send`](Self::send)
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    pub async fn get(&self, path: &str) -> ApiResult<ApiResponse> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn get_with_query<Q>(&self, path: &str, query: &Q) -> ApiResult<ApiResponse>
    where
        Q: Serialize + ?Sized,
    {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    pub async fn post<B>(&self, path: &str, body: &B) -> ApiResult<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<B>(&self, path: &str, body: &B) -> ApiResult<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn patch<B>(&self, path: &str, body: &B) -> ApiResult<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::PATCH, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<ApiResponse> {
        self.send(self.request(Method::DELETE, path)).await
    }

    /// Multipart submission; reqwest sets the boundary content type
    pub async fn post_multipart(&self, path: &str, form: Form) -> ApiResult<ApiResponse> {
        self.send(self.request(Method::POST, path).multipart(form)).await
    }

    pub async fn put_multipart(&self, path: &str, form: Form) -> ApiResult<ApiResponse> {
        self.send(self.request(Method::PUT, path).multipart(form)).await
    }

    /// Run a prepared request through the auth and error interceptors
    pub async fn send(&self, builder: RequestBuilder) -> ApiResult<ApiResponse> {
        let mut request = match builder.build() {
            Ok(request) => request,
            Err(e) => return Err(self.reject(ApiError::invalid_request(e.to_string()))),
        };

        self.authorize(&mut request);

        let method = request.method().clone();
        let url = request.url().to_string();

        match self.execute(request).await {
            Ok(response) => {
                if self.log_requests {
                    tracing::debug!("{} {} -> {}", method, url, response.status);
                }
                Ok(response)
            }
            Err(err) => {
                if self.log_requests {
                    tracing::debug!(
                        "{} {} failed (status: {:?}): {}",
                        method,
                        url,
                        err.status(),
                        err.user_message()
                    );
                }
                Err(self.reject(err))
            }
        }
    }

    /// Attach `Authorization: Bearer <token>` when the session holds a token
    fn authorize(&self, request: &mut Request) {
        let Some(token) = self.session.token() else {
            return;
        };

        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::warn!("Stored session token is not a valid header value, sending request without it");
            }
        }
    }

    async fn execute(&self, request: Request) -> ApiResult<ApiResponse> {
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| ApiError::transport(None, e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::transport(Some(status), e))?;
        let body = parse_body(&bytes);

        if !status.is_success() {
            return Err(ApiError::upstream(status, body));
        }

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    /// Last stop for every failure before it reaches the caller
    fn reject(&self, err: ApiError) -> ApiError {
        if err.is_unauthorized() {
            self.expire_session(&err);
        }
        err
    }

    fn expire_session(&self, err: &ApiError) {
        // Storage is cleared before the hook runs and before the caller resumes
        let first = self.session.expire();
        if !first {
            tracing::debug!("Session already torn down, skipping expiry notification");
            return;
        }

        tracing::warn!("Session expired: {}", err.user_message());
        if let Some(hook) = &self.on_session_expired {
            hook(&SessionExpired {
                login_route: self.login_route.clone(),
                message: err.user_message().to_string(),
            });
        }
    }

    /// Identity of the signed-in admin, or `None` when neither the current nor
    /// the legacy endpoint answers.
    pub async fn current_user(&self) -> Option<Value> {
        let user = match unwrap(self.get(CURRENT_USER_PATH)).await {
            Ok(user) => Ok(user),
            Err(err) => {
                tracing::debug!(
                    "{} failed ({}), trying {}",
                    CURRENT_USER_PATH,
                    err.user_message(),
                    LEGACY_CURRENT_USER_PATH
                );
                unwrap(self.get(LEGACY_CURRENT_USER_PATH)).await
            }
        };

        match user {
            Ok(Value::Null) => None,
            Ok(user) => Some(user),
            Err(err) => {
                tracing::debug!("Current user lookup failed: {}", err.user_message());
                None
            }
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .field("login_route", &self.login_route)
            .field("has_session_expired_hook", &self.on_session_expired.is_some())
            .finish()
    }
}

/// Resolve a pending request to its payload instead of the response envelope
pub async fn unwrap<F>(pending: F) -> ApiResult<Value>
where
    F: Future<Output = ApiResult<ApiResponse>>,
{
    Ok(pending.await?.into_payload())
}

/// [`unwrap`], then deserialize the payload
pub async fn unwrap_as<T, F>(pending: F) -> ApiResult<T>
where
    T: DeserializeOwned,
    F: Future<Output = ApiResult<ApiResponse>>,
{
    pending.await?.json()
}
