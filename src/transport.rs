//! Transports perform a single exchange for a descriptor.
//!
//! The engine only talks to the [`Transport`] trait. [`ReqwestTransport`] is the
//! built-in implementation on top of `reqwest`; it is built once and reused
//! for the lifetime of the process. Non-`2xx` statuses are ordinary responses
//! here, and send failures (connection refused, DNS, the transport's own
//! timeout) are normalized into a statusless [`Response`] that classifies as
//! failed.

use crate::{Error, RequestDescriptor, Response, ResponseType, Result};
use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;
use std::time::{Duration, Instant};
use url::Url;

/// Performs one `(method, descriptor) -> response` exchange.
///
/// Implementations should turn every failure they can describe into a
/// [`Response`] instead of an error; errors returned here are not handled by
/// the engine and reach the caller of `send()` directly.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use courier::{RequestDescriptor, Response, Transport};
/// use http::{Method, StatusCode};
/// use serde_json::json;
///
/// struct Canned;
///
/// #[async_trait]
/// impl Transport for Canned {
///     async fn dispatch(
///         &self,
///         _method: &Method,
///         descriptor: &RequestDescriptor,
///     ) -> courier::Result<Response> {
///         Ok(Response::new(StatusCode::OK, json!({ "url": descriptor.url() })))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Dispatches one request.
    async fn dispatch(&self, method: &Method, descriptor: &RequestDescriptor) -> Result<Response>;
}

/// HTTP transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a transport with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Creates a new `TransportBuilder`.
    pub fn builder() -> TransportBuilder {
        TransportBuilder::new()
    }

    fn build_url(descriptor: &RequestDescriptor) -> Result<Url> {
        let mut url = Url::parse(descriptor.url())?;
        if !descriptor.query_params().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in descriptor.query_params() {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn build_headers(descriptor: &RequestDescriptor) -> Result<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(descriptor.headers().len());
        for (name, value) in descriptor.headers() {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn dispatch(&self, method: &Method, descriptor: &RequestDescriptor) -> Result<Response> {
        let url = Self::build_url(descriptor)?;
        let headers = Self::build_headers(descriptor)?;

        tracing::debug!(method = %method, url = %url, "Executing HTTP request");

        let mut request = self.http_client.request(method.clone(), url);

        // Request headers override defaults with the same name.
        let mut merged = self.default_headers.clone();
        merged.extend(headers);
        request = request.headers(merged);

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        if let Some(body) = descriptor.body() {
            request = request.json(body);
        }

        let start_time = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    is_timeout = e.is_timeout(),
                    is_connect = e.is_connect(),
                    "HTTP request failed before a response arrived"
                );
                let failed = Response::transport_error(e.to_string(), None)
                    .with_latency(start_time.elapsed());
                return Ok(match e.status() {
                    Some(status) => failed.with_nested(status),
                    None => failed,
                });
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        let raw_body = response.text().await?;
        let latency = start_time.elapsed();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            "Received HTTP response"
        );

        if status.is_client_error() {
            tracing::error!(
                status = status.as_u16(),
                response = %raw_body,
                "Client error (4xx)"
            );
        } else if status.is_server_error() {
            tracing::warn!(
                status = status.as_u16(),
                response = %raw_body,
                "Server error (5xx)"
            );
        }

        let data = decode_body(&raw_body, descriptor.response_type().unwrap_or_default());
        Ok(Response::new(status, data)
            .with_raw_body(raw_body)
            .with_headers(headers)
            .with_latency(latency))
    }
}

/// Decodes a body according to the response type hint.
fn decode_body(raw_body: &str, response_type: ResponseType) -> Value {
    match response_type {
        ResponseType::Text => Value::String(raw_body.to_string()),
        ResponseType::Json if raw_body.trim().is_empty() => Value::Null,
        ResponseType::Json => serde_json::from_str(raw_body).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Response body is not JSON, keeping it as text");
            Value::String(raw_body.to_string())
        }),
    }
}

/// Builder for configuring and creating a [`ReqwestTransport`].
///
/// # Examples
///
/// ```no_run
/// use courier::ReqwestTransport;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), courier::Error> {
/// let transport = ReqwestTransport::builder()
///     .timeout(Duration::from_secs(30))
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct TransportBuilder {
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl TransportBuilder {
    /// Creates a new `TransportBuilder` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header sent with every dispatch.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets a per-dispatch timeout.
    ///
    /// An expired timeout surfaces as a failed response, not as an error.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn build(self) -> Result<ReqwestTransport> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(ReqwestTransport {
            http_client,
            default_headers: self.default_headers,
            timeout: self.timeout,
        })
    }
}
