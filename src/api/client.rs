//! Authenticated HTTP client for the CarParter backend
//!
//! Wraps reqwest::Client with bearer token injection and status mapping.
//! One call = one request: no retry, no timeout, no caching.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::error::ApiError;
use crate::config::Config;

/// Fallback when a server error body is not JSON at all.
const UNKNOWN_SERVER_ERROR: &str = "알 수 없는 서버 오류가 발생했습니다.";
/// Fallback when a JSON error body has no usable `message`.
const GENERIC_FAILURE: &str = "API 요청에 실패했습니다.";

/// Where the user-facing message of a failed request comes from.
#[derive(Debug, Clone, Copy)]
pub enum ErrorText {
    /// Fixed message chosen by the call site.
    Fixed(&'static str),
    /// The `message` field of the server's JSON error body.
    FromServer,
}

/// Authenticated client for one base URL.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Backend client using the stored token.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        if config.auth_token.as_ref().is_some_and(|t| t.is_expired()) {
            tracing::warn!("Stored token is expired; requests will likely be rejected");
        }
        Self::new(config.api_base_url(), config.bearer_token())
    }

    /// Chatbot host client. The chatbot is unauthenticated.
    pub fn chatbot(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.chatbot_url(), None)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Absolute URL for the given path segments. Each segment is
    /// percent-encoded, so ids can never escape their position in the path.
    pub fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `Content-Type: application/json` always, `Authorization` only with a token.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("Stored token is not a valid header value, sending none"),
            }
        }
        headers
    }

    /// Send one request and map non-success statuses to `RequestFailed`.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
        on_error: ErrorText,
    ) -> Result<reqwest::Response, ApiError> {
        tracing::debug!("{} {}", method, url);

        let mut req = self.http.request(method, url.clone()).headers(self.headers());
        if let Some(ref body) = body {
            req = req.body(serde_json::to_vec(body)?);
        }

        let resp = req.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        check_response(resp, &url, on_error).await
    }

    /// Request whose body decodes as `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
        on_error: ErrorText,
    ) -> Result<T, ApiError> {
        let resp = self.send(method, url.clone(), body, on_error).await?;
        decode_json(resp, &url).await
    }

    /// Like `request`, but `204 No Content` yields `None`.
    pub async fn request_optional<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
        on_error: ErrorText,
    ) -> Result<Option<T>, ApiError> {
        let resp = self.send(method, url.clone(), body, on_error).await?;
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        decode_json(resp, &url).await.map(Some)
    }

    /// Request whose response body is ignored.
    pub async fn command(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
        on_error: ErrorText,
    ) -> Result<(), ApiError> {
        self.send(method, url, body, on_error).await?;
        Ok(())
    }

    /// Request whose body is plain text.
    pub async fn request_text(
        &self,
        method: Method,
        url: Url,
        on_error: ErrorText,
    ) -> Result<String, ApiError> {
        let resp = self.send(method, url.clone(), None, on_error).await?;
        resp.text().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })
    }
}

/// Serialize a request DTO.
pub fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
    Ok(serde_json::to_value(body)?)
}

/// Decode a JSON body. A shape mismatch surfaces here, not later.
async fn decode_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    url: &Url,
) -> Result<T, ApiError> {
    let bytes = resp.bytes().await.map_err(|source| ApiError::Transport {
        url: url.to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Check HTTP response status code and return a clear error on failure.
async fn check_response(
    resp: reqwest::Response,
    url: &Url,
    on_error: ErrorText,
) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    tracing::debug!("HTTP {} for {}: {}", status.as_u16(), url, body);

    let message = match on_error {
        ErrorText::Fixed(message) => message.to_string(),
        ErrorText::FromServer => server_message(&body),
    };
    tracing::warn!("HTTP {} for {}: {}", status.as_u16(), url, message);

    Err(ApiError::RequestFailed { status, message })
}

/// Pick the user-facing message out of a server error body.
fn server_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or(GENERIC_FAILURE)
            .to_string(),
        Err(_) => UNKNOWN_SERVER_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use reqwest::Method;

    #[test]
    fn test_url_encodes_segments() {
        let client = ApiClient::new("http://localhost:9000", None).unwrap();
        let url = client.url(&["api", "chat", "history", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/api/chat/history/a%2Fb%20c");
    }

    #[test]
    fn test_url_keeps_base_path() {
        let client = ApiClient::new("https://example.com/carparter/", None).unwrap();
        let url = client.url(&["api", "users", "profile"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/carparter/api/users/profile");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url", None),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_empty_token_is_no_token() {
        let client = ApiClient::new("http://localhost:9000", Some(String::new())).unwrap();
        assert!(client.token().is_none());
        assert!(client.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_server_message_fallbacks() {
        assert_eq!(server_message(r#"{"message":"이미 존재하는 ID입니다."}"#), "이미 존재하는 ID입니다.");
        assert_eq!(server_message(r#"{"error":"Bad Request"}"#), GENERIC_FAILURE);
        assert_eq!(server_message("<html>502</html>"), UNKNOWN_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_bearer_and_content_type_sent() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/users/profile")
                    .header("Authorization", "Bearer tok-1")
                    .header("Content-Type", "application/json");
                then.status(200).json_body(serde_json::json!({"ok": true}));
            })
            .await;

        let client = ApiClient::new(&server.base_url(), Some("tok-1".to_string())).unwrap();
        let url = client.url(&["api", "users", "profile"]).unwrap();
        let body: serde_json::Value = client
            .request(Method::GET, url, None, ErrorText::Fixed("실패"))
            .await
            .unwrap();

        assert_eq!(body["ok"], true);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_authorization_without_token() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/users/profile")
                    .header_missing("Authorization");
                then.status(200).json_body(serde_json::json!({}));
            })
            .await;

        let client = ApiClient::new(&server.base_url(), None).unwrap();
        let url = client.url(&["api", "users", "profile"]).unwrap();
        let _: serde_json::Value = client
            .request(Method::GET, url, None, ErrorText::Fixed("실패"))
            .await
            .unwrap();

        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_maps_to_request_failed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/x");
                then.status(500).body("boom");
            })
            .await;

        let client = ApiClient::new(&server.base_url(), None).unwrap();
        let err = client
            .request::<serde_json::Value>(
                Method::GET,
                client.url(&["api", "x"]).unwrap(),
                None,
                ErrorText::Fixed("요청에 실패했습니다."),
            )
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.to_string(), "요청에 실패했습니다.");
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/x");
                then.status(200).body("not json");
            })
            .await;

        let client = ApiClient::new(&server.base_url(), None).unwrap();
        let err = client
            .request::<Vec<i64>>(
                Method::GET,
                client.url(&["api", "x"]).unwrap(),
                None,
                ErrorText::Fixed("실패"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_no_content_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/x");
                then.status(204);
            })
            .await;

        let client = ApiClient::new(&server.base_url(), None).unwrap();
        let value: Option<serde_json::Value> = client
            .request_optional(
                Method::GET,
                client.url(&["api", "x"]).unwrap(),
                None,
                ErrorText::Fixed("실패"),
            )
            .await
            .unwrap();

        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Port 9 (discard) is closed on test machines.
        let client = ApiClient::new("http://127.0.0.1:9", None).unwrap();
        let err = client
            .command(
                Method::GET,
                client.url(&["api"]).unwrap(),
                None,
                ErrorText::Fixed("실패"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Transport { .. }));
    }
}
