//! HTTP access to the admin API.

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::client::list_query::ListRequest;
use crate::client::tracker::RequestTracker;
use crate::domain::types::RecordId;
use crate::domain::user::AUDIT_USER_HEADER;
use crate::list::ListResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("session expired or unauthorized")]
    Unauthorized,
}

/// The signed-in user whose identity is attached to every request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: RecordId,
    pub token: Option<String>,
}

/// Source of list pages for [`crate::client::ListQueryManager`].
pub trait ListFetcher: Send + Sync + 'static {
    fn fetch_list(
        &self,
        endpoint: &str,
        request: &ListRequest,
    ) -> impl Future<Output = Result<ListResponse<Value>, ApiError>> + Send;
}

/// Performs `DELETE <url>` and returns the decoded body.
pub trait ItemDeleter: Send + Sync {
    fn delete_item(&self, url: &str) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

/// reqwest client rooted at the API base URL.
///
/// Every request is counted by the [`RequestTracker`] while it runs and
/// carries the audit and bearer headers of the current [`Session`].
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tracker: RequestTracker,
    session: Arc<RwLock<Option<Session>>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, tracker: RequestTracker) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, tracker)
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        tracker: RequestTracker,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tracker,
            session: Arc::new(RwLock::new(None)),
        }
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    pub fn set_session(&self, session: Session) {
        *self.session.write() = Some(session);
    }

    pub fn clear_session(&self) {
        *self.session.write() = None;
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self.http.request(method, self.url(path));
        if let Some(session) = self.session.read().as_ref() {
            request = request.header(AUDIT_USER_HEADER, session.user_id.to_string());
            if let Some(token) = &session.token {
                request = request.bearer_auth(token);
            }
        }
        request
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let _pending = self.tracker.start();

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            log::warn!("Session expired or unauthorized; clearing session");
            self.clear_session();
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(response.json::<T>().await?)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.execute(self.request(Method::GET, path).query(query))
            .await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(self.request(Method::POST, path).json(body))
            .await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(self.request(Method::PUT, path).json(body))
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.request(Method::DELETE, path)).await
    }
}

impl ListFetcher for ApiClient {
    async fn fetch_list(
        &self,
        endpoint: &str,
        request: &ListRequest,
    ) -> Result<ListResponse<Value>, ApiError> {
        self.get(endpoint, &request.query_pairs()).await
    }
}

impl ItemDeleter for ApiClient {
    async fn delete_item(&self, url: &str) -> Result<Value, ApiError> {
        self.delete(url).await
    }
}
