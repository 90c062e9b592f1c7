//! Base request wrapper.
//!
//! Every call goes to one configured base origin with credentials attached.
//! Non-2xx answers become [`ApiError::Rejected`] carrying the backend's own
//! message, network failures become [`ApiError::Transport`], and `204 No
//! Content` resolves to [`Payload::NoContent`] instead of a parsed body.
//!
//! There is no retry, response cache, or idle connection pool here: two
//! concurrent callers asking for the same resource issue two requests.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiError;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How a call proves who the caller is.
#[derive(Clone, Default)]
pub enum Credentials {
    /// No credentials; only public endpoints will answer.
    #[default]
    Anonymous,
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// A raw `Cookie` header forwarded from the browser session.
    Cookie(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "Anonymous"),
            Self::Bearer(_) => write!(f, "Bearer([redacted])"),
            Self::Cookie(_) => write!(f, "Cookie([redacted])"),
        }
    }
}

impl Credentials {
    fn apply(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Anonymous => req,
            Self::Bearer(token) => req.header(AUTHORIZATION, format!("Bearer {token}")),
            Self::Cookie(cookie) => req.header(COOKIE, cookie),
        }
    }
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `204 No Content`.
    NoContent,
    /// Any other 2xx, parsed as JSON.
    Json(serde_json::Value),
}

/// Backend error body (`{ detail?, message? }`).
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<serde_json::Value>,
}

/// Response envelope wrapping every backend payload.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
    #[serde(default)]
    meta: Option<Meta>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Meta {
    #[serde(default)]
    request_id: Option<String>,
}

/// Credentialed HTTP transport against a single base origin.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    credentials: Credentials,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a transport for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if `base_url` is empty or the HTTP client
    /// cannot be built.
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(ApiError::Config("missing API base URL".to_owned()));
        }

        let timeout = if timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            timeout
        };

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .user_agent(concat!("keyway-console/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            credentials,
            http,
        })
    }

    /// The configured base origin.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform a call without a body.
    ///
    /// # Errors
    ///
    /// `Transport` on network failure, `Rejected` on a non-2xx status,
    /// `Translation` if a 2xx body is not JSON.
    pub async fn send(&self, method: Method, path: &str) -> Result<Payload, ApiError> {
        self.dispatch(method, path, None).await
    }

    /// Perform a call with a JSON body.
    ///
    /// # Errors
    ///
    /// As [`ApiClient::send`], plus `Encode` if `body` cannot be serialized.
    pub async fn send_json<B>(&self, method: Method, path: &str, body: &B) -> Result<Payload, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec(body).map_err(ApiError::Encode)?;
        self.dispatch(method, path, Some(bytes)).await
    }

    /// Call and unwrap the envelope's `data` as `W`.
    pub(crate) async fn fetch<W>(
        &self,
        method: Method,
        path: &str,
        context: &'static str,
    ) -> Result<W, ApiError>
    where
        W: DeserializeOwned,
    {
        let payload = self.send(method, path).await?;
        decode(payload, context)
    }

    /// Call with a body and unwrap the envelope's `data` as `W`.
    pub(crate) async fn fetch_with<W, B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        context: &'static str,
    ) -> Result<W, ApiError>
    where
        W: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let payload = self.send_json(method, path, body).await?;
        decode(payload, context)
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Payload, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.credentials.apply(self.http.request(method.clone(), &url));

        // Only calls that carry a body declare one.
        if let Some(bytes) = body {
            req = req.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        let resp = req.send().await.map_err(|e| {
            warn!(%method, path, error = %e, "keyway API unreachable");
            ApiError::Transport(e)
        })?;

        let status = resp.status();
        debug!(%method, path, status = status.as_u16(), "keyway API response");

        if status == StatusCode::NO_CONTENT {
            return Ok(Payload::NoContent);
        }

        let text = resp.text().await.map_err(ApiError::Transport)?;

        if !status.is_success() {
            let message = extract_error_message(status, &text);
            warn!(%method, path, status = status.as_u16(), message = %message, "keyway API rejected request");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text)
            .map(Payload::Json)
            .map_err(|e| ApiError::translation("response body", e))
    }
}

/// Pull a human-readable message out of an error body.
///
/// Prefers `detail`, then `message`; falls back to `Request failed: <status>`
/// when the body is not JSON or carries neither.
pub(crate) fn extract_error_message(status: StatusCode, body: &str) -> String {
    let text_field = |value: Option<serde_json::Value>| {
        value
            .and_then(|v| v.as_str().map(str::to_owned))
            .filter(|s| !s.is_empty())
    };

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| text_field(b.detail).or_else(|| text_field(b.message)))
        .unwrap_or_else(|| format!("Request failed: {}", status.as_u16()))
}

/// Unwrap a payload's envelope into the wire type `W`.
pub(crate) fn decode<W>(payload: Payload, context: &'static str) -> Result<W, ApiError>
where
    W: DeserializeOwned,
{
    let Payload::Json(value) = payload else {
        return Err(ApiError::translation(
            context,
            "expected a response body, got 204 No Content",
        ));
    };

    let envelope: Envelope<W> =
        serde_json::from_value(value).map_err(|e| ApiError::translation(context, e))?;

    if let Some(request_id) = envelope.meta.and_then(|m| m.request_id) {
        debug!(context, request_id = %request_id, "decoded keyway response");
    }

    Ok(envelope.data)
}

/// Percent-encode one path segment.
pub(crate) fn segment(raw: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(raw)
}
