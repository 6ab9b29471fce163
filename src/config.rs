//! Request configuration and its fluent builder.
//!
//! [`RequestBuilder`] accumulates one request's fields and strategy table.
//! [`RequestBuilder::send`] snapshots them into an immutable [`Configuration`],
//! validates it, and hands it to the [`ExecutionEngine`].

use crate::{
    engine::ExecutionEngine,
    strategy::{self, Strategies},
    transport::Transport,
    validate::validate,
    Error, RequestDescriptor, Response, ResponseType, Result,
};
use http::Method;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Retry budget used when none is configured.
pub const DEFAULT_MAX_RETRY: usize = 2;

/// Where the bearer token of a request comes from.
#[derive(Clone)]
pub enum BearerAuth {
    /// A fixed token.
    Static(String),
    /// A token read again for every attempt.
    ///
    /// Use this together with a refresh strategy that stores the new token
    /// somewhere the provider can read it.
    Provider(Arc<dyn Fn() -> Option<String> + Send + Sync>),
}

impl BearerAuth {
    /// Returns the token for the next attempt, if any.
    pub fn token(&self) -> Option<String> {
        match self {
            BearerAuth::Static(token) => Some(token.clone()),
            BearerAuth::Provider(provider) => provider(),
        }
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BearerAuth::Static(_) => f.write_str("Static(<redacted>)"),
            BearerAuth::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

/// An immutable snapshot of one request.
///
/// Every attempt derives a fresh [`RequestDescriptor`] from it; the snapshot
/// itself never changes during execution.
pub struct Configuration<T> {
    method: Option<Method>,
    url: String,
    headers: HashMap<String, String>,
    auth: Option<BearerAuth>,
    query_params: HashMap<String, String>,
    response_type: Option<ResponseType>,
    body: Option<Value>,
    max_retry: usize,
    strategies: Strategies<T>,
}

impl<T> Configuration<T> {
    /// The configured method, if any.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// The absolute request URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The configured request headers, without authorization.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// The bearer token source, if any.
    pub fn auth(&self) -> Option<&BearerAuth> {
        self.auth.as_ref()
    }

    /// The query parameters.
    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    /// The response type hint.
    pub fn response_type(&self) -> Option<ResponseType> {
        self.response_type
    }

    /// The JSON request body.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// The maximum number of dispatches, refresh redispatches included.
    pub fn max_retry(&self) -> usize {
        self.max_retry
    }

    /// The strategy table.
    pub fn strategies(&self) -> &Strategies<T> {
        &self.strategies
    }

    /// Builds a descriptor from the snapshot, without authorization.
    pub fn descriptor(&self) -> RequestDescriptor {
        RequestDescriptor::new(self.url.clone())
            .with_body(self.body.clone())
            .with_headers(self.headers.clone())
            .with_query_params(self.query_params.clone())
            .with_response_type(self.response_type)
    }

    /// Builds a descriptor and attaches the current bearer token.
    pub fn authorized_descriptor(&self) -> RequestDescriptor {
        let mut descriptor = self.descriptor();
        if let Some(token) = self.auth.as_ref().and_then(BearerAuth::token) {
            descriptor.set_bearer_token(&token);
        }
        descriptor
    }
}

impl<T> fmt::Debug for Configuration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("auth", &self.auth)
            .field("query_params", &self.query_params)
            .field("response_type", &self.response_type)
            .field("body", &self.body)
            .field("max_retry", &self.max_retry)
            .field("strategies", &self.strategies)
            .finish()
    }
}

/// Fluent builder for a single request.
///
/// Every setter returns the builder. Unset strategies fall back to
/// `T::default()`, the refresh strategy defaults to never refreshing, and the
/// retry budget defaults to [`DEFAULT_MAX_RETRY`].
///
/// # Examples
///
/// ```no_run
/// use courier::Client;
/// use serde_json::Value;
///
/// # async fn example() -> Result<(), courier::Error> {
/// let client = Client::new()?;
///
/// let name: Option<String> = client
///     .get("https://api.example.com/users/123")
///     .bearer_token("secret")
///     .max_retry(3)
///     .on_success(|response| async move {
///         response.data["name"].as_str().map(str::to_string)
///     })
///     .on_failed(|_| async { None })
///     .send()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct RequestBuilder<T> {
    transport: Option<Arc<dyn Transport>>,
    method: Option<Method>,
    url: String,
    headers: HashMap<String, String>,
    auth: Option<BearerAuth>,
    query_params: HashMap<String, String>,
    response_type: Option<ResponseType>,
    body: Option<Value>,
    max_retry: usize,
    strategies: Strategies<T>,
}

impl<T> RequestBuilder<T> {
    /// Creates a builder without a transport.
    ///
    /// Attach one with [`RequestBuilder::transport`] before calling
    /// [`RequestBuilder::send`], or start from a [`Client`](crate::Client).
    pub fn new() -> Self {
        Self {
            transport: None,
            method: None,
            url: String::new(),
            headers: HashMap::new(),
            auth: None,
            query_params: HashMap::new(),
            response_type: None,
            body: None,
            max_retry: DEFAULT_MAX_RETRY,
            strategies: Strategies::new(),
        }
    }

    /// Sets the transport used by [`RequestBuilder::send`].
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the request method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the absolute request URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Adds a header, replacing any previous value for the same name.
    ///
    /// Names compare case-insensitively, so the last call wins.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        replace_header(&mut self.headers, name.into(), value.into());
        self
    }

    /// Adds multiple headers, with the same replacement rule as [`RequestBuilder::header`].
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        for (name, value) in headers {
            replace_header(&mut self.headers, name, value);
        }
        self
    }

    /// Sends `Authorization: Bearer <token>` with every attempt.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(BearerAuth::Static(token.into()));
        self
    }

    /// Reads the bearer token from `provider` before every attempt.
    ///
    /// # Examples
    ///
    /// ```
    /// use courier::RequestBuilder;
    /// use std::sync::{Arc, RwLock};
    ///
    /// let token = Arc::new(RwLock::new(String::from("expired")));
    /// let current = token.clone();
    ///
    /// let builder: RequestBuilder<()> = RequestBuilder::new()
    ///     .bearer_token_with(move || current.read().ok().map(|t| t.clone()))
    ///     .refresh_token(move || {
    ///         let token = token.clone();
    ///         async move {
    ///             *token.write().unwrap() = "fresh".to_string();
    ///             true
    ///         }
    ///     });
    /// ```
    pub fn bearer_token_with<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.auth = Some(BearerAuth::Provider(Arc::new(provider)));
        self
    }

    /// Adds a query parameter.
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// Adds multiple query parameters.
    pub fn query_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query_params.extend(params);
        self
    }

    /// Sets how the response body is decoded.
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Sets a raw JSON body.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `body` as the JSON request body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be represented as JSON.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value =
            serde_json::to_value(body).map_err(|e| Error::SerializationFailed(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Sets the maximum number of dispatches.
    ///
    /// Redispatches triggered by a token refresh count against the same
    /// budget. `0` skips the network entirely and goes straight to the retry
    /// fallback.
    pub fn max_retry(mut self, max_retry: usize) -> Self {
        self.max_retry = max_retry;
        self
    }

    /// Runs before every redispatch decision on a `401` response.
    ///
    /// Returning `true` redispatches the request; `false` routes the response
    /// to the unauthorized strategy.
    pub fn refresh_token<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.strategies.refresh_token = Some(strategy::refresh_token_strategy(f));
        self
    }

    /// Appends an observer for success and no-content responses.
    pub fn success_side_effect<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(&Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.strategies
            .success_side_effects
            .push(strategy::response_side_effect(f));
        self
    }

    /// Appends an observer for failed responses.
    pub fn failed_side_effect<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(&Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.strategies
            .failed_side_effects
            .push(strategy::response_side_effect(f));
        self
    }

    /// Appends an observer for unauthorized responses that were not refreshed.
    pub fn unauthorized_side_effect<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(&Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.strategies
            .unauthorized_side_effects
            .push(strategy::response_side_effect(f));
        self
    }

    /// Appends an observer for an exhausted retry budget.
    pub fn retry_fallback_side_effect<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(&RequestDescriptor) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.strategies
            .retry_fallback_side_effects
            .push(strategy::descriptor_side_effect(f));
        self
    }

    pub(crate) fn into_configuration(self) -> Configuration<T> {
        Configuration {
            method: self.method,
            url: self.url,
            headers: self.headers,
            auth: self.auth,
            query_params: self.query_params,
            response_type: self.response_type,
            body: self.body,
            max_retry: self.max_retry,
            strategies: self.strategies,
        }
    }
}

impl<T: 'static> RequestBuilder<T> {
    /// Handles `2xx` responses other than `204`.
    pub fn on_success<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.strategies.success = Some(strategy::response_strategy(f));
        self
    }

    /// Handles `204` responses.
    pub fn on_no_content<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.strategies.no_content = Some(strategy::response_strategy(f));
        self
    }

    /// Handles missing, statusless and non-`2xx` responses.
    pub fn on_failed<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.strategies.failed = Some(strategy::response_strategy(f));
        self
    }

    /// Handles `401` responses the refresh strategy declined.
    pub fn on_unauthorized<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.strategies.unauthorized = Some(strategy::response_strategy(f));
        self
    }

    /// Handles an exhausted retry budget.
    pub fn on_retry_exhausted<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(RequestDescriptor) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.strategies.retry_fallback = Some(strategy::retry_fallback_strategy(f));
        self
    }

    /// Snapshots and validates the configuration without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] on the first invalid field, after logging
    /// a warning.
    pub fn build(self) -> Result<Configuration<T>> {
        let config = self.into_configuration();
        if let Err(e) = validate(&config) {
            tracing::warn!(
                error = %e,
                url = %config.url(),
                "Rejected request configuration"
            );
            return Err(e.into());
        }
        Ok(config)
    }
}

impl<T: Default + Send + 'static> RequestBuilder<T> {
    /// Validates the configuration and executes it.
    ///
    /// Returns the value produced by exactly one strategy.
    ///
    /// # Errors
    ///
    /// * [`Error::Validation`] if the configuration is invalid; nothing is
    ///   dispatched and a warning is logged.
    /// * [`Error::ConfigurationError`] if no transport was attached.
    /// * Any error the transport could not express as a response.
    pub async fn send(mut self) -> Result<T> {
        let transport = self.transport.take().ok_or_else(|| {
            Error::ConfigurationError("No transport attached to request".to_string())
        })?;
        let config = self.build()?;

        ExecutionEngine::new(transport).execute(&config).await
    }
}

fn replace_header(headers: &mut HashMap<String, String>, name: String, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
    headers.insert(name, value);
}

impl<T> Default for RequestBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
