//! Request construction and execution
//!
//! Construction is pure: a [`RequestBuilder`] turns method, path, body and
//! header profile into a ready [`reqwest::Request`] without touching the
//! network. [`execute`] is the single I/O point, so tests can cover every
//! build path offline and the mocked-device tests only exercise one send
//! routine.

use std::collections::BTreeMap;

use reqwest::header::{self, HeaderName, HeaderValue};
use reqwest::{Body, Client, Method, Request, Response, Url};

use crate::error::{Error, Result};

use super::headers::{HeaderProfile, USER_AGENT};

/// Ordered multi-value parameters for getter/setter bodies.
///
/// Ordering by key keeps the encoded body deterministic for identical input.
pub type ParamMap = BTreeMap<String, Vec<String>>;

/// Encode parameters into the device's form body dialect.
///
/// Each entry becomes `key=value` with multiple values joined by `,`,
/// entries joined by `&` in key order. No percent escaping: the firmware
/// parses the raw text and the stock UI never escapes either.
pub fn encode_params(params: &ParamMap) -> String {
    params
        .iter()
        .map(|(key, values)| format!("{key}={}", values.join(",")))
        .collect::<Vec<_>>()
        .join("&")
}

/// Builds requests against one device base URL.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base: Url,
}

impl RequestBuilder {
    /// Create a builder rooted at the device base URL.
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Device base URL this builder targets.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Assemble a request without sending it.
    ///
    /// An empty `path` targets the base URL itself (the bare probe GET).
    /// The header profile is written out in full on every request; the
    /// `Cookie` header is the only computed one and is attached exactly
    /// when session material exists.
    pub fn build(
        &self,
        method: Method,
        path: &str,
        body: impl Into<String>,
        profile: HeaderProfile,
        cookie: Option<&str>,
    ) -> Result<Request> {
        let url = if path.is_empty() {
            self.base.clone()
        } else {
            self.base.join(path).map_err(|e| {
                Error::construction(format!("cannot join {path:?} onto {}: {e}", self.base))
            })?
        };

        let mut request = Request::new(method, url);
        let headers = request.headers_mut();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        for (name, values) in profile.entries() {
            let parsed = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::construction(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(&values.join(";"))
                .map_err(|e| Error::construction(format!("invalid value for {name}: {e}")))?;
            headers.insert(parsed, value);
        }
        if let Some(cookie) = cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| Error::construction(format!("invalid cookie value: {e}")))?;
            headers.insert(header::COOKIE, value);
        }

        let body = body.into();
        if !body.is_empty() {
            *request.body_mut() = Some(Body::from(body));
        }
        Ok(request)
    }
}

/// Send one built request.
///
/// No retries and no redirect-following beyond what the client is
/// configured with; every transport failure surfaces as
/// [`Error::Transport`] for the caller to map into its own flow.
pub async fn execute(client: &Client, request: Request) -> Result<Response> {
    let method = request.method().clone();
    let url = request.url().clone();
    tracing::debug!(%method, %url, "dispatching request");
    let response = client.execute(request).await?;
    tracing::debug!(status = %response.status(), %url, "response received");
    Ok(response)
}
