//! Response classification.
//!
//! Every dispatch outcome lands in exactly one [`Classification`] bucket, which
//! selects the strategy and side effects the engine runs. The checks are
//! ordered: unauthorized first, then failed, then no-content, then success.

use crate::Response;
use http::StatusCode;
use std::fmt;

/// The four outcome buckets of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// The direct or nested status is `401`.
    Unauthorized,
    /// No response, no readable status, or a status outside `2xx`.
    Failed,
    /// A `204` response.
    NoContent,
    /// Any other `2xx` response.
    Success,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Classification::Unauthorized => "unauthorized",
            Classification::Failed => "failed",
            Classification::NoContent => "no-content",
            Classification::Success => "success",
        };
        f.write_str(name)
    }
}

/// Classifies a response, or the absence of one.
///
/// # Examples
///
/// ```
/// use courier::{classify, Classification, Response};
/// use http::StatusCode;
/// use serde_json::Value;
///
/// let ok = Response::new(StatusCode::OK, Value::Null);
/// assert_eq!(classify(Some(&ok)), Classification::Success);
///
/// let gone = Response::transport_error("connection refused", None);
/// assert_eq!(classify(Some(&gone)), Classification::Failed);
/// assert_eq!(classify(None), Classification::Failed);
/// ```
pub fn classify(response: Option<&Response>) -> Classification {
    if is_unauthorized(response) {
        Classification::Unauthorized
    } else if is_failed(response) {
        Classification::Failed
    } else if is_no_content(response) {
        Classification::NoContent
    } else {
        Classification::Success
    }
}

/// Returns `true` if the direct or nested status is `401`.
pub fn is_unauthorized(response: Option<&Response>) -> bool {
    let Some(response) = response else {
        return false;
    };
    response.status == Some(StatusCode::UNAUTHORIZED)
        || response.nested.map(|nested| nested.status) == Some(StatusCode::UNAUTHORIZED)
}

/// Returns `true` if there is no response or its effective status is not `2xx`.
pub fn is_failed(response: Option<&Response>) -> bool {
    match response.and_then(Response::effective_status) {
        Some(status) => !status.is_success(),
        None => true,
    }
}

/// Returns `true` if the effective status is `204`.
pub fn is_no_content(response: Option<&Response>) -> bool {
    response.and_then(Response::effective_status) == Some(StatusCode::NO_CONTENT)
}
