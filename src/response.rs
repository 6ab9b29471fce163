//! Response type shared by the transport, the classifier and strategies.
//!
//! A [`Response`] carries the decoded body as a [`serde_json::Value`] together
//! with the metadata of the exchange. Transport failures that never produced a
//! status line are represented as a response without a direct status, so they
//! flow through classification like any other outcome.

use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Status reported by an underlying transport error.
///
/// Some transport failures still know the status of the exchange that caused
/// them (a redirect loop, for example). That status is kept here rather than
/// on the response itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestedResponse {
    /// The status attached to the transport error.
    pub status: StatusCode,
}

/// The outcome of one dispatch.
///
/// # Examples
///
/// ```
/// use courier::Response;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let response = Response::new(StatusCode::OK, json!({ "ok": true }));
///
/// assert_eq!(response.effective_status(), Some(StatusCode::OK));
/// assert_eq!(response.data["ok"], true);
/// assert!(!response.is_transport_error());
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code, absent when the exchange failed before a status line.
    pub status: Option<StatusCode>,

    /// The decoded response body.
    ///
    /// JSON bodies are parsed, anything else is kept as a string value. An
    /// empty body decodes to `null`.
    pub data: Value,

    /// The raw response body, or the error message for transport failures.
    pub raw_body: String,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time spent on this dispatch.
    pub latency: Duration,

    /// The attempt number that produced this response (1-indexed).
    pub attempts: usize,

    /// Status carried by a transport error, if any.
    pub nested: Option<NestedResponse>,
}

impl Response {
    /// Creates a response with a status and decoded data.
    pub fn new(status: StatusCode, data: Value) -> Self {
        Self {
            status: Some(status),
            data,
            raw_body: String::new(),
            headers: HeaderMap::new(),
            latency: Duration::ZERO,
            attempts: 1,
            nested: None,
        }
    }

    /// Creates a statusless response for a failed exchange.
    ///
    /// These always classify as failed unless the nested status is `401`.
    pub fn transport_error(message: impl Into<String>, nested: Option<NestedResponse>) -> Self {
        let message = message.into();
        Self {
            status: None,
            data: Value::String(message.clone()),
            raw_body: message,
            headers: HeaderMap::new(),
            latency: Duration::ZERO,
            attempts: 1,
            nested,
        }
    }

    /// Sets the raw body.
    pub fn with_raw_body(mut self, raw_body: impl Into<String>) -> Self {
        self.raw_body = raw_body.into();
        self
    }

    /// Sets the response headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the dispatch latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Attaches a nested transport-error status.
    pub fn with_nested(mut self, status: StatusCode) -> Self {
        self.nested = Some(NestedResponse { status });
        self
    }

    /// Returns the direct status, or the nested one when there is none.
    pub fn effective_status(&self) -> Option<StatusCode> {
        self.status.or(self.nested.map(|nested| nested.status))
    }

    /// Returns `true` if the exchange failed before a status line arrived.
    pub fn is_transport_error(&self) -> bool {
        self.status.is_none()
    }

    /// Returns `true` if this response came from a redispatch.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Deserializes [`Response::data`] into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeserializationFailed`](crate::Error::DeserializationFailed)
    /// with the raw body attached when the data has a different shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use courier::Response;
    /// use http::StatusCode;
    /// use serde::Deserialize;
    /// use serde_json::json;
    ///
    /// #[derive(Deserialize)]
    /// struct User { id: u64 }
    ///
    /// let response = Response::new(StatusCode::OK, json!({ "id": 7 }));
    /// let user: User = response.json().unwrap();
    /// assert_eq!(user.id, 7);
    /// ```
    pub fn json<T: DeserializeOwned>(&self) -> crate::Result<T> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            tracing::error!(
                error = %e,
                raw_response = %self.raw_body,
                "Failed to deserialize response"
            );
            crate::Error::DeserializationFailed {
                raw_response: self.raw_body.clone(),
                serde_error: e.to_string(),
                status: self.effective_status(),
            }
        })
    }

    /// Returns a reference to a header value by name.
    ///
    /// # Examples
    ///
    /// ```
    /// # use courier::Response;
    /// # use http::{HeaderMap, HeaderValue, StatusCode};
    /// let mut headers = HeaderMap::new();
    /// headers.insert("content-type", HeaderValue::from_static("application/json"));
    ///
    /// let response = Response::new(StatusCode::OK, serde_json::Value::Null).with_headers(headers);
    ///
    /// assert_eq!(response.header("content-type"), Some("application/json"));
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}
