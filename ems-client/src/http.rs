//! HTTP client for the EMS backend
//!
//! One configured `reqwest::Client` shared by every service. Each request
//! picks up the bearer token from storage at send time, and every 401
//! response goes through the single authorization-failure handler here.

use std::sync::Arc;

use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::ErrorBody;

use crate::cache::QueryClient;
use crate::history::{self, History};
use crate::session::SessionState;
use crate::storage::{Storage, StorageKey};
use crate::{ClientConfig, ClientError, ClientResult};

/// HTTP client for making requests to the EMS backend
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiInner>,
}

struct ApiInner {
    client: Client,
    base_url: String,
    storage: Storage,
    session: SessionState,
    history: Arc<dyn History>,
    /// 会话结束时整体清空
    queries: QueryClient,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new HTTP client from configuration
    pub fn new(
        config: &ClientConfig,
        storage: Storage,
        session: SessionState,
        history: Arc<dyn History>,
        queries: QueryClient,
    ) -> ClientResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                storage,
                session,
                history,
                queries,
            }),
        })
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    pub fn session_state(&self) -> &SessionState {
        &self.inner.session
    }

    pub fn history(&self) -> &Arc<dyn History> {
        &self.inner.history
    }

    /// Query cache scoped to the current session
    pub fn queries(&self) -> &QueryClient {
        &self.inner.queries
    }

    /// Build authorization header value from the stored token
    fn auth_header(&self) -> Option<String> {
        self.inner
            .storage
            .get::<String>(StorageKey::AuthToken)
            .filter(|t| !t.is_empty())
            .map(|t| format!("Bearer {}", t))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'));
        let mut request = self.inner.client.request(method, url);
        if let Some(auth) = self.auth_header() {
            request = request.header(header::AUTHORIZATION, auth);
        }
        request
    }

    // ========== Verbs ==========

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(Method::GET, path)).await
    }

    /// Make a GET request with query parameters
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ClientResult<T> {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    /// Make a POST request without body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(Method::POST, path)).await
    }

    /// Make a POST request with a multipart form
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> ClientResult<T> {
        self.send(self.request(Method::POST, path).multipart(form)).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    /// Make a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(Method::DELETE, path)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        tracing::debug!(
            url = %response.url(),
            status = response.status().as_u16(),
            "API response"
        );
        self.handle_response(response).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            // 尝试解析后端 message
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .map(|body| body.message);

            if status == StatusCode::UNAUTHORIZED {
                self.on_unauthorized();
                return Err(ClientError::Unauthorized(message));
            }
            if let Some(message) = message {
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
            return match status {
                StatusCode::FORBIDDEN => Err(ClientError::Forbidden(text)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(text)),
                _ => Err(ClientError::Internal(text)),
            };
        }

        let bytes = response.bytes().await?;
        // 204 / 空 body 视为 null
        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };
        serde_json::from_slice(body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Authorization failure: drop credentials and go to the login page
    fn on_unauthorized(&self) {
        tracing::info!("Authorization rejected, clearing stored session");
        self.inner.storage.remove(StorageKey::AuthToken);
        self.inner.storage.remove(StorageKey::AuthUser);
        self.inner.session.clear();
        self.inner.queries.clear();
        history::redirect_to_login(self.inner.history.as_ref());
    }
}
