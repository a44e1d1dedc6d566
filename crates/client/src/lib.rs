//! Typed client for Elasticsearch-compatible search clusters
//!
//! Every endpoint builds a [`PendingRequest`], hands it to a [`Transport`] and
//! classifies the outcome with [`dispatch`]:
//!
//! - 2xx bodies are decoded into the endpoint's response type
//! - 404 and 409 become the [`ClientError::NotFound`] and
//!   [`ClientError::Conflict`] sentinels
//! - any other status is decoded into the endpoint's error shape
//!   ([`ErrorEnvelope`], [`GenericError`], ...) or kept as raw text
//!
//! Search hits keep their `sort` values as [`SortValues`](eswrap_core::SortValues),
//! so cursors survive a round trip without losing integer precision.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod api;
mod client;
pub mod decoder;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod mock;
pub mod request;
pub mod transport;

pub use api::bulk::{BulkAction, BulkBody, BulkDocument, BulkResponse, BulkResponseItem};
pub use api::cluster::{ClusterInfo, LicenseInfo, VersionInfo};
pub use api::document::{DocWriteResponse, DocsResponse, GetDocumentResponse, Refresh, WriteOptions};
pub use api::indices::{Acknowledged, IndexCreateResponse, IndexInfo, IndexStats};
pub use api::scripts::{FieldOp, FieldUpdate, PainlessExecuteRequest, StoredScript};
pub use api::search::{Hit, SearchResponse, TypedSortSearchResponse};
pub use client::EsClient;
pub use decoder::{DiscardBody, IgnoreResponse, JsonDecoder, ResponseDecoder};
pub use dispatch::{dispatch, ResponseOutcome};
pub use envelope::{DocumentNotFoundError, ErrorEnvelope, GenericError};
pub use error::{
    ClientError, ClientResult, DecodeFailure, MissingArgument, TransportError, TransportErrorKind,
};
pub use request::{BodyFormat, PendingRequest, RawResponse};
pub use transport::{HeaderInjector, ReqwestTransport, Transport};
