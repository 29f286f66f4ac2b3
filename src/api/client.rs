//! Typed wrapper over the content API's wire protocol.
//!
//! All operations go through one JSON client with an optional bearer token.
//! Readiness polling lives here too, since it probes the same base URL.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::content::Payload;

/// Interval between readiness probes.
const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Errors from API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected response body: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("API server unavailable after {0} seconds")]
    ServerUnavailable(u64),
}

/// Author record from `GET v1/authors/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Response body of a successful `POST v1/contents`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentCreated {
    pub id: String,
    pub path: String,
}

/// Content API client. Cheap to clone; the token travels with the clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates an unauthenticated client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            http: reqwest::Client::new(),
        }
    }

    /// Returns a clone of this client carrying a bearer token.
    pub fn authorized(&self, token: impl Into<String>) -> Self {
        Self {
            base_url: self.base_url.clone(),
            token: Some(token.into()),
            http: self.http.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::Status {
                    status: StatusCode::UNAUTHORIZED,
                    body: "token is not a valid header value".to_string(),
                })?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<String, ApiError> {
        let mut request = self
            .http
            .request(method, self.endpoint(path))
            .headers(self.headers()?);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status { status, body: text });
        }
        Ok(text)
    }

    /// `GET v1/authors/{name}`.
    pub async fn resolve_author(&self, name: &str) -> Result<Author, ApiError> {
        let body = self
            .request(Method::GET, &format!("v1/authors/{name}"), None)
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `POST v1/token` — exchanges author credentials for a bearer token.
    pub async fn obtain_token(
        &self,
        author_id: &str,
        password: &str,
    ) -> Result<String, ApiError> {
        let body = self
            .request(
                Method::POST,
                "v1/token",
                Some(serde_json::json!({
                    "authorId": author_id,
                    "password": password,
                })),
            )
            .await?;
        let parsed: TokenResponse = serde_json::from_str(&body)?;
        Ok(parsed.token)
    }

    /// `POST v1/contents`.
    pub async fn create_content(&self, payload: &Payload) -> Result<ContentCreated, ApiError> {
        let body = self
            .request(
                Method::POST,
                "v1/contents",
                Some(serde_json::to_value(payload)?),
            )
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `POST v1/series` — each series object is forwarded verbatim.
    pub async fn create_series(&self, series: &serde_json::Value) -> Result<(), ApiError> {
        self.request(Method::POST, "v1/series", Some(series.clone()))
            .await?;
        Ok(())
    }

    /// `DELETE v1/contents/{id}`.
    pub async fn delete_content(&self, id: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, &format!("v1/contents/{id}"), None)
            .await?;
        Ok(())
    }

    /// `DELETE v1/tags/{id}`.
    pub async fn delete_tag(&self, id: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, &format!("v1/tags/{id}"), None)
            .await?;
        Ok(())
    }

    /// `DELETE v1/caches`.
    pub async fn invalidate_caches(&self) -> Result<(), ApiError> {
        self.request(Method::DELETE, "v1/caches", None).await?;
        Ok(())
    }

    /// Polls the API base URL until it answers 2xx, at one-second intervals.
    /// Gives up after `timeout` and reports the server unavailable.
    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<(), ApiError> {
        let start = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            if let Ok(response) = self.http.get(&self.base_url).send().await {
                if response.status().is_success() {
                    info!("API server is ready at {}", self.base_url);
                    return Ok(());
                }
            }

            if start.elapsed() >= timeout {
                return Err(ApiError::ServerUnavailable(timeout.as_secs()));
            }
            info!("Waiting for API server... (attempt {attempt})");
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn endpoint_joins_without_duplicate_slashes() {
        let client = ApiClient::new("https://api.example.com/");
        assert_eq!(
            client.endpoint("/v1/contents"),
            "https://api.example.com/v1/contents"
        );
        assert_eq!(client.endpoint("v1/token"), "https://api.example.com/v1/token");
    }

    #[tokio::test]
    async fn resolves_an_author() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/authors/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "author-1",
                "name": "alice"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let author = client.resolve_author("alice").await.unwrap();
        assert_eq!(author.id, "author-1");
    }

    #[tokio::test]
    async fn obtains_a_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/token"))
            .and(body_json(serde_json::json!({
                "authorId": "author-1",
                "password": "secret"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "token": "jwt-token" })),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let token = client.obtain_token("author-1", "secret").await.unwrap();
        assert_eq!(token, "jwt-token");
    }

    #[tokio::test]
    async fn authorized_requests_carry_the_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/caches"))
            .and(bearer_token("jwt-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).authorized("jwt-token");
        client.invalidate_caches().await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_surfaces_the_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/tags/9"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such tag"))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).authorized("jwt-token");
        let err = client.delete_tag("9").await.unwrap_err();
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, "no such tag");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn readiness_poll_succeeds_when_the_server_answers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        client
            .wait_until_ready(Duration::from_secs(5))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn readiness_poll_times_out() {
        // nothing listens at this address
        let client = ApiClient::new("http://127.0.0.1:1");
        let err = client
            .wait_until_ready(Duration::from_millis(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ServerUnavailable(_)));
    }
}
