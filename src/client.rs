//! Client entry point.
//!
//! The [`Client`] type owns the transport shared by every request it starts.
//! Use [`ClientBuilder`] to configure it, then start requests with
//! [`Client::get`], [`Client::post`], [`Client::put`], [`Client::delete`] or
//! [`Client::request`].

use crate::{
    config::RequestBuilder,
    transport::{Transport, TransportBuilder},
    Result,
};
use http::Method;
use std::sync::Arc;
use std::time::Duration;

/// Starts requests on a shared transport.
///
/// The client is cheap to clone; clones share the same transport.
///
/// # Examples
///
/// ```no_run
/// use courier::Client;
/// use serde_json::Value;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), courier::Error> {
/// let client = Client::builder()
///     .timeout(Duration::from_secs(30))
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
///
/// let user: Value = client
///     .get("https://api.example.com/users/123")
///     .on_success(|response| async move { response.data })
///     .send()
///     .await?;
/// println!("User: {}", user);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Creates a client backed by a default [`ReqwestTransport`](crate::ReqwestTransport).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Creates a client on top of a custom transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The transport shared by requests from this client.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Starts a request with no method or URL set.
    pub fn request<T>(&self) -> RequestBuilder<T> {
        RequestBuilder::new().transport(self.transport.clone())
    }

    /// Starts a GET request.
    pub fn get<T>(&self, url: impl Into<String>) -> RequestBuilder<T> {
        self.request().method(Method::GET).url(url)
    }

    /// Starts a POST request.
    pub fn post<T>(&self, url: impl Into<String>) -> RequestBuilder<T> {
        self.request().method(Method::POST).url(url)
    }

    /// Starts a PUT request.
    pub fn put<T>(&self, url: impl Into<String>) -> RequestBuilder<T> {
        self.request().method(Method::PUT).url(url)
    }

    /// Starts a DELETE request.
    pub fn delete<T>(&self, url: impl Into<String>) -> RequestBuilder<T> {
        self.request().method(Method::DELETE).url(url)
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// The transport is created once in [`ClientBuilder::build`] and lives as
/// long as the client and its clones.
#[derive(Default)]
pub struct ClientBuilder {
    transport: TransportBuilder,
    custom: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        self.transport = self.transport.default_header(name, value)?;
        Ok(self)
    }

    /// Sets the per-dispatch timeout of the built-in transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.transport = self.transport.timeout(timeout);
        self
    }

    /// Uses a custom transport instead of [`ReqwestTransport`](crate::ReqwestTransport).
    ///
    /// Default headers and the timeout are ignored when a custom transport is set.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.custom = Some(transport);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in transport cannot be created.
    pub fn build(self) -> Result<Client> {
        let transport: Arc<dyn Transport> = match self.custom {
            Some(transport) => transport,
            None => Arc::new(self.transport.build()?),
        };
        Ok(Client { transport })
    }
}
