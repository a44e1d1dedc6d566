//! Request and response values exchanged with a [`Transport`](crate::Transport)

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use std::time::Duration;

/// Encoding of a request body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    /// Newline-delimited JSON, used by `_bulk`
    Ndjson,
}

/// A request that has not been executed yet
///
/// Built by the endpoint methods and consumed by the transport, so it can be
/// executed at most once.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<(BodyFormat, Vec<u8>)>,
    timeout: Option<Duration>,
}

impl PendingRequest {
    /// Creates a request for the path made of `segments`
    ///
    /// Segments are percent-encoded individually, so document ids may contain
    /// `/` and other reserved characters. Segments are kept as given; endpoints
    /// reject empty names before building a request.
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, segments)
    }

    pub fn post<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::POST, segments)
    }

    pub fn put<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::PUT, segments)
    }

    pub fn delete<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::DELETE, segments)
    }

    pub fn head<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::HEAD, segments)
    }

    /// Appends a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Appends a query parameter when `value` is present
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Serializes `body` as the JSON request body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some((BodyFormat::Json, serde_json::to_vec(body)?));
        Ok(self)
    }

    /// Uses pre-encoded JSON bytes as the request body
    pub fn raw_json(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some((BodyFormat::Json, body.into()));
        self
    }

    pub fn ndjson(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some((BodyFormat::Ndjson, body.into()));
        self
    }

    /// Per-request deadline, overriding the transport default
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Unencoded path, for logs and error context
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Value of the first query parameter named `key`
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_ref().map(|(_, bytes)| bytes.as_slice())
    }

    pub fn body_format(&self) -> Option<BodyFormat> {
        self.body.as_ref().map(|(format, _)| *format)
    }

    /// Request body decoded as JSON, for inspecting recorded requests
    pub fn body_json(&self) -> Option<serde_json::Value> {
        self.body().and_then(|bytes| serde_json::from_slice(bytes).ok())
    }

    pub fn timeout_value(&self) -> Option<Duration> {
        self.timeout
    }

    /// Splits the request into its parts for execution
    pub(crate) fn into_parts(self) -> RequestParts {
        RequestParts {
            method: self.method,
            segments: self.segments,
            query: self.query,
            headers: self.headers,
            body: self.body,
            timeout: self.timeout,
        }
    }
}

pub(crate) struct RequestParts {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<(BodyFormat, Vec<u8>)>,
    pub timeout: Option<Duration>,
}

/// A fully drained response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_path_keeps_segments_as_given() {
        let request = PendingRequest::get(["idx", "_doc", ""]);
        assert_eq!(request.segments().len(), 3);
        assert_eq!(request.path(), "/idx/_doc/");
        assert_eq!(PendingRequest::head(Vec::<String>::new()).path(), "/");
    }

    #[test]
    fn test_query_opt() {
        let request = PendingRequest::post(["idx", "_update", "1"])
            .query_opt("refresh", Some("wait_for"))
            .query_opt::<u32>("retry_on_conflict", None);
        assert_eq!(request.query_value("refresh"), Some("wait_for"));
        assert_eq!(request.query_value("retry_on_conflict"), None);
    }

    #[test]
    fn test_json_body_sets_format() {
        let request = PendingRequest::put(["idx"])
            .json(&serde_json::json!({"a": 1}))
            .unwrap();
        assert_eq!(request.body_format(), Some(BodyFormat::Json));
        assert_eq!(request.body(), Some(br#"{"a":1}"#.as_slice()));
    }
}
