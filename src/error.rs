//! Error types for request execution.
//!
//! Only failures that cannot be expressed as a response end up here. Classified
//! failures (non-2xx, unauthorized) and retry exhaustion are routed through the
//! caller's strategies instead and never surface as an [`Error`].

use crate::validate::ValidationError;
use http::StatusCode;

/// The main error type for request execution.
///
/// # Examples
///
/// ```no_run
/// use courier::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::new()?;
///
/// match client.get::<serde_json::Value>("https://api.example.com/items").send().await {
///     Ok(value) => println!("Handled: {}", value),
///     Err(Error::Validation(e)) => eprintln!("Request never left: {}", e),
///     Err(e) => eprintln!("Transport failure: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error that could not be normalized into a response.
    ///
    /// Send failures (connection refused, DNS, timeouts) are turned into a
    /// statusless [`Response`](crate::Response) by the built-in transport. This
    /// variant only covers failures after a status line was received.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request configuration was rejected before any dispatch.
    #[error("Invalid request configuration: {0}")]
    Validation(#[from] ValidationError),

    /// Failed to deserialize response data into the requested type.
    ///
    /// # Fields
    ///
    /// * `raw_response` - The raw response body as a string
    /// * `serde_error` - The error message from serde
    /// * `status` - The effective HTTP status of the response, if any
    #[error("Failed to deserialize response (status {status:?}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The effective HTTP status code
        status: Option<StatusCode>,
    },

    /// Failed to serialize the request body.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// Invalid client or transport configuration.
    ///
    /// This covers problems such as an invalid default header or a failure
    /// building the underlying HTTP client.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid URL reached the transport.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A custom transport failed in a way it could not express as a response.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Returns `true` if the request was rejected by validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Network(e) => e.status(),
            Error::DeserializationFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for request execution.
///
/// This is a convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
