//! Configuration validation.
//!
//! Runs once per [`send`](crate::RequestBuilder::send), before any dispatch.
//! Checks run in a fixed order and stop at the first violation.

use crate::config::{BearerAuth, Configuration};
use http::{HeaderName, HeaderValue, Method};
use url::Url;

/// Why a request configuration was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No method was chosen.
    #[error("request method is not set")]
    MissingMethod,

    /// The method is not one of GET, POST, PUT or DELETE.
    #[error("unsupported request method {0}, expected GET, POST, PUT or DELETE")]
    UnsupportedMethod(Method),

    /// The URL is empty.
    #[error("request url is empty")]
    EmptyUrl,

    /// The URL could not be parsed as an absolute URL.
    #[error("request url {url:?} is invalid: {reason}")]
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// The parser error
        reason: String,
    },

    /// A header name or value is not legal HTTP.
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader {
        /// The offending header name
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// A query parameter has an empty name.
    #[error("query parameter names must not be empty")]
    EmptyQueryParam,

    /// The bearer token cannot be sent as a header value.
    #[error("bearer token is not a valid header value")]
    InvalidBearerToken,
}

const SUPPORTED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

/// Validates a configuration, returning the method to dispatch with.
///
/// Retry budgets and strategy slots need no runtime check: `usize` and the
/// `Fn` trait objects already guarantee a number and callables.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found, in this order: method, url,
/// headers, query parameters, bearer token.
pub fn validate<T>(config: &Configuration<T>) -> Result<Method, ValidationError> {
    let method = validate_method(config.method())?;
    validate_url(config.url())?;
    validate_headers(config)?;
    validate_query_params(config)?;
    validate_bearer(config.auth())?;
    Ok(method)
}

fn validate_method(method: Option<&Method>) -> Result<Method, ValidationError> {
    let method = method.ok_or(ValidationError::MissingMethod)?;
    if SUPPORTED_METHODS.contains(method) {
        Ok(method.clone())
    } else {
        Err(ValidationError::UnsupportedMethod(method.clone()))
    }
}

fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.trim().is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    Url::parse(url).map_err(|e| ValidationError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

fn validate_headers<T>(config: &Configuration<T>) -> Result<(), ValidationError> {
    let mut names: Vec<&String> = config.headers().keys().collect();
    names.sort();

    for name in names {
        HeaderName::try_from(name.as_str()).map_err(|e| ValidationError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        HeaderValue::try_from(config.headers()[name].as_str()).map_err(|e| {
            ValidationError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?;
    }
    Ok(())
}

fn validate_query_params<T>(config: &Configuration<T>) -> Result<(), ValidationError> {
    if config.query_params().keys().any(|key| key.is_empty()) {
        return Err(ValidationError::EmptyQueryParam);
    }
    Ok(())
}

fn validate_bearer(auth: Option<&BearerAuth>) -> Result<(), ValidationError> {
    // Provided tokens are only known per attempt and checked by the transport.
    if let Some(BearerAuth::Static(token)) = auth {
        HeaderValue::try_from(format!("Bearer {}", token))
            .map_err(|_| ValidationError::InvalidBearerToken)?;
    }
    Ok(())
}
