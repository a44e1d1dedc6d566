//! HTTP transport used by the client
//!
//! [`Transport`] is the seam between request construction and the network.
//! [`ReqwestTransport`] is the production implementation; tests use
//! [`MockTransport`](crate::mock::MockTransport).

use async_trait::async_trait;
use eswrap_core::{ClientConfig, Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

use crate::error::{TransportError, TransportErrorKind};
use crate::request::{BodyFormat, PendingRequest, RawResponse};

const JSON: &str = "application/json";
const NDJSON: &str = "application/x-ndjson";
const VENDOR_JSON: &str = "application/vnd.elasticsearch+json; compatible-with=8";
const VENDOR_NDJSON: &str = "application/vnd.elasticsearch+x-ndjson; compatible-with=8";

/// Executes a request and drains its response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: PendingRequest) -> std::result::Result<RawResponse, TransportError>;
}

/// Adds headers to every request before it reaches the transport
pub trait HeaderInjector: Send + Sync {
    fn inject(&self, headers: &mut HeaderMap);
}

/// reqwest-backed transport with round-robin node selection
pub struct ReqwestTransport {
    client: Client,
    nodes: Vec<Url>,
    next_node: AtomicUsize,
    v7_compatible: bool,
}

impl ReqwestTransport {
    /// Builds the HTTP client from connection settings
    pub fn new(config: &ClientConfig) -> Result<Self> {
        info!("Initializing search transport");
        info!("  Nodes: {}", config.addresses.join(", "));
        info!("  Timeout: {}s", config.timeout_secs);
        info!("  Connect timeout: {}s", config.connect_timeout_secs);

        let nodes = config
            .addresses
            .iter()
            .map(|address| {
                Url::parse(address.trim())
                    .map_err(|e| Error::config(format!("Invalid address '{address}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        if nodes.is_empty() {
            return Err(Error::config(
                "no search server address provided (client.addresses is empty)".to_string(),
            ));
        }

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .default_headers(default_headers(config)?);

        if let Some(path) = &config.ca_cert_path {
            let pem = std::fs::read(path).map_err(|e| {
                Error::transport(format!("Failed to read CA certificate {}: {e}", path.display()))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| Error::transport(format!("Invalid CA certificate: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let client = builder
            .build()
            .map_err(|e| Error::transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            nodes,
            next_node: AtomicUsize::new(0),
            v7_compatible: config.v7_compatible,
        })
    }

    fn pick_node(&self) -> &Url {
        let index = self.next_node.fetch_add(1, Ordering::Relaxed) % self.nodes.len();
        &self.nodes[index]
    }

    fn media_type(&self, format: BodyFormat) -> &'static str {
        match (format, self.v7_compatible) {
            (BodyFormat::Json, true) => JSON,
            (BodyFormat::Ndjson, true) => NDJSON,
            (BodyFormat::Json, false) => VENDOR_JSON,
            (BodyFormat::Ndjson, false) => VENDOR_NDJSON,
        }
    }
}

fn default_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.default_headers {
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| Error::config(format!("Invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::config(format!("Invalid value for header '{name}': {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Joins `segments` onto `base`, percent-encoding each one
fn build_url(base: &Url, segments: &[String], query: &[(String, String)]) -> Option<Url> {
    let mut url = base.clone();
    {
        let mut path = url.path_segments_mut().ok()?;
        path.pop_if_empty();
        path.extend(segments);
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Some(url)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: PendingRequest) -> std::result::Result<RawResponse, TransportError> {
        let path = request.path();
        let parts = request.into_parts();
        let method = parts.method.to_string();

        let url = build_url(self.pick_node(), &parts.segments, &parts.query).ok_or_else(|| {
            TransportError::new(
                TransportErrorKind::Request,
                &method,
                &path,
                "node address cannot be used as a base URL",
            )
        })?;

        let accept = if self.v7_compatible { JSON } else { VENDOR_JSON };
        let mut builder = self
            .client
            .request(parts.method, url)
            .header(ACCEPT, accept)
            .headers(parts.headers);
        if let Some((format, body)) = parts.body {
            builder = builder.header(CONTENT_TYPE, self.media_type(format)).body(body);
        }
        if let Some(timeout) = parts.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, &method, &path))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(e, &method, &path))?;

        Ok(RawResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}
