//! Upstream transport used by the Lark services (token, ticket, login, messaging).
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport-layer errors (network/timeout/body).
///
/// Note:
/// - Kept apart from `LarkError` so each service decides which upstream error
///   a failed call becomes (auth vs ticket vs login, etc.).
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("upstream request timed out")]
    Timeout,
    #[error("upstream request failed: {0}")]
    Http(String),
    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("upstream response is not JSON: {0}")]
    InvalidBody(String),
}

impl TransportError {
    /// Diagnostic payload carried by upstream errors when no JSON body exists.
    pub fn into_payload(self) -> Value {
        json!({ "error": self.to_string() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One call against the Lark open API, relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: HttpMethod,
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

impl UpstreamRequest {
    pub fn get(path: &'static str) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: &'static str) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    fn new(method: HttpMethod, path: &'static str) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            bearer: None,
            body: None,
        }
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A minimal JSON request/response interface to the Lark open API.
///
/// The platform reports business failures through the `code` field of the
/// body (often alongside a non-2xx status), so implementations return any JSON
/// body as `Ok` and leave the interpretation to the caller.
#[async_trait]
pub trait LarkTransport: Send + Sync + 'static {
    // Returns the transport name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn send(&self, request: UpstreamRequest) -> TransportResult<Value>;
}

/// `reqwest`-backed transport with a per-request timeout.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: url::Url,
}

impl ReqwestTransport {
    pub fn new(base_url: url::Url, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: with_trailing_slash(base_url),
        })
    }

    fn endpoint(&self, request: &UpstreamRequest) -> TransportResult<url::Url> {
        let mut url = self
            .base_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|e| TransportError::Http(format!("invalid upstream path: {e}")))?;

        if !request.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(request.query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        Ok(url)
    }
}

#[async_trait]
impl LarkTransport for ReqwestTransport {
    fn backend_name(&self) -> &'static str {
        "reqwest"
    }

    async fn send(&self, request: UpstreamRequest) -> TransportResult<Value> {
        let url = self.endpoint(&request)?;

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            Some(body) => builder.json(body),
            // Lark expects a JSON content type even on body-less POSTs.
            None if request.method == HttpMethod::Post => builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body("{}"),
            None => builder,
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Ok(value),
            Err(_) if !status.is_success() => Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            }),
            Err(e) => Err(TransportError::InvalidBody(e.to_string())),
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Http(e.to_string())
    }
}

fn with_trailing_slash(mut url: url::Url) -> url::Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// `code` field of a Lark response envelope, if it is an integer.
pub(crate) fn response_code(payload: &Value) -> Option<i64> {
    payload.get("code").and_then(Value::as_i64)
}

pub(crate) fn is_success(payload: &Value) -> bool {
    response_code(payload) == Some(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> ReqwestTransport {
        ReqwestTransport::new(url::Url::parse(base).unwrap(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn endpoint_is_resolved_against_base_url() {
        let t = transport("https://open.larksuite.com");
        let url = t
            .endpoint(&UpstreamRequest::post("/open-apis/jssdk/ticket/get"))
            .unwrap();
        assert_eq!(url.as_str(), "https://open.larksuite.com/open-apis/jssdk/ticket/get");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix_and_encodes_query() {
        let t = transport("http://localhost:8080/lark");
        let url = t
            .endpoint(
                &UpstreamRequest::post("/open-apis/im/v1/messages")
                    .query("receive_id_type", "open id"),
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/lark/open-apis/im/v1/messages?receive_id_type=open+id"
        );
    }

    #[test]
    fn envelope_success_requires_integer_zero_code() {
        assert!(is_success(&json!({ "code": 0 })));
        assert!(!is_success(&json!({ "code": 99991663 })));
        assert!(!is_success(&json!({ "code": "0" })));
        assert!(!is_success(&json!({ "msg": "ok" })));
    }
}
