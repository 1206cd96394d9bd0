//! Transport seam between the endpoint helpers and the HTTP stack.
//!
//! Everything above this trait deals in decoded JSON; everything below it
//! deals in URLs, headers and status codes. [`HttpTransport`] is the
//! production implementation; tests plug in scripted transports.
//!
//! [`HttpTransport`]: crate::pumble::http::HttpTransport

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;

/// HTTP verbs used by the Pumble API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`, used by the listing endpoints.
    Get,
    /// `POST`, used by every write except deletion.
    Post,
    /// `DELETE`, used to remove a message.
    Delete,
}

impl Method {
    /// Upper-case verb as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single API call, independent of how it is carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Short name used in error messages, e.g. `list messages`.
    pub operation: &'static str,
    /// HTTP verb.
    pub method: Method,
    /// Path relative to the base URL, starting with `/`.
    pub path: &'static str,
    /// Query parameters in insertion order.
    pub query: Vec<(&'static str, String)>,
    /// JSON body, if any.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// A `GET` request without query parameters.
    #[must_use]
    pub const fn get(operation: &'static str, path: &'static str) -> Self {
        Self {
            operation,
            method: Method::Get,
            path,
            query: Vec::new(),
            body: None,
        }
    }

    /// A `POST` request carrying a JSON body.
    #[must_use]
    pub fn post(operation: &'static str, path: &'static str, body: Value) -> Self {
        Self {
            operation,
            method: Method::Post,
            path,
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// A `DELETE` request carrying a JSON body.
    #[must_use]
    pub fn delete(operation: &'static str, path: &'static str, body: Value) -> Self {
        Self {
            operation,
            method: Method::Delete,
            path,
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// Append a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    /// Value of the first query parameter named `key`.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Carries [`ApiRequest`]s to the API.
///
/// Implementations perform exactly one round trip per call. A 2xx answer
/// yields the decoded JSON body (`Value::Null` for an empty body); any other
/// status yields [`CoreError::Transport`] with the status code and body text.
/// No retries.
///
/// [`CoreError::Transport`]: crate::CoreError::Transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request.
    async fn send(&self, request: ApiRequest) -> Result<Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        (**self).send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_parameters_keep_insertion_order() {
        let request = ApiRequest::get("list messages", "/listMessages")
            .with_query("channel", "general")
            .with_query("limit", "50");
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.query_value("channel"), Some("general"));
        assert_eq!(request.query_value("limit"), Some("50"));
        assert_eq!(request.query_value("cursor"), None);
        assert_eq!(
            request.query,
            vec![("channel", "general".to_string()), ("limit", "50".to_string())]
        );
    }

    #[test]
    fn write_requests_carry_a_body() {
        let request = ApiRequest::delete("delete message", "/deleteMessage", json!({"messageId": "m1"}));
        assert_eq!(request.method.to_string(), "DELETE");
        assert_eq!(request.body, Some(json!({"messageId": "m1"})));
    }
}
