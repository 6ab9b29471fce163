//! Per-attempt request descriptors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// How the transport should interpret the response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Parse the body as JSON, falling back to a string when it is not JSON.
    #[default]
    Json,
    /// Keep the body as a JSON string value.
    Text,
}

/// Everything the transport needs to perform one dispatch.
///
/// A fresh descriptor is derived from the request configuration for every
/// attempt and discarded afterwards. Headers can only be changed through
/// [`RequestDescriptor::set_header`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestDescriptor {
    url: String,
    body: Option<Value>,
    headers: HashMap<String, String>,
    query_params: HashMap<String, String>,
    response_type: Option<ResponseType>,
}

impl RequestDescriptor {
    /// Creates a descriptor for the given URL with no body, headers or query.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub(crate) fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    pub(crate) fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub(crate) fn with_query_params(mut self, query_params: HashMap<String, String>) -> Self {
        self.query_params = query_params;
        self
    }

    pub(crate) fn with_response_type(mut self, response_type: Option<ResponseType>) -> Self {
        self.response_type = response_type;
        self
    }

    /// Sets a header, replacing any existing header with the same name.
    ///
    /// Header names are compared case-insensitively, so setting
    /// `Authorization` replaces a previously supplied `authorization`.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    /// Sets `Authorization: Bearer <token>`.
    pub fn set_bearer_token(&mut self, token: &str) {
        self.set_header("Authorization", format!("Bearer {}", token));
    }

    /// The absolute request URL, without query parameters.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The JSON request body, if any.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// The request headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Looks up a header by name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The query parameters appended to the URL at dispatch.
    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    /// The response type hint, if one was configured.
    pub fn response_type(&self) -> Option<ResponseType> {
        self.response_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_descriptor_has_empty_headers() {
        let descriptor = RequestDescriptor::new("https://api.test/x");
        assert_eq!(descriptor.url(), "https://api.test/x");
        assert!(descriptor.headers().is_empty());
        assert!(descriptor.query_params().is_empty());
        assert!(descriptor.body().is_none());
        assert_eq!(descriptor.response_type(), None);
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut headers = HashMap::new();
        headers.insert("authorization".to_string(), "Basic abc".to_string());
        let mut descriptor = RequestDescriptor::new("https://api.test/x").with_headers(headers);

        descriptor.set_bearer_token("t0k3n");

        assert_eq!(descriptor.headers().len(), 1);
        assert_eq!(descriptor.header("AUTHORIZATION"), Some("Bearer t0k3n"));
    }

    #[test]
    fn test_response_type_serde_names() {
        assert_eq!(serde_json::to_value(ResponseType::Text).unwrap(), "text");
        assert_eq!(
            serde_json::from_value::<ResponseType>("json".into()).unwrap(),
            ResponseType::Json
        );
    }
}
