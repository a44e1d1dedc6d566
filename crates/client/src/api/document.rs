//! Single-document endpoints

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::search::ShardStats;
use crate::envelope::{DocumentNotFoundError, ErrorEnvelope, GenericError};
use crate::error::{require, ClientError, ClientResult};
use crate::request::PendingRequest;
use crate::EsClient;

/// Value of the `refresh` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    True,
    False,
    WaitFor,
}

impl fmt::Display for Refresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::True => "true",
            Self::False => "false",
            Self::WaitFor => "wait_for",
        })
    }
}

/// Optional parameters shared by write endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub refresh: Option<Refresh>,
    /// Only used by updates
    pub retry_on_conflict: Option<u32>,
}

impl WriteOptions {
    pub fn refresh(refresh: Refresh) -> Self {
        Self {
            refresh: Some(refresh),
            ..Self::default()
        }
    }

    pub fn with_retry_on_conflict(mut self, retries: u32) -> Self {
        self.retry_on_conflict = Some(retries);
        self
    }

    fn apply(&self, request: PendingRequest) -> PendingRequest {
        request
            .query_opt("refresh", self.refresh)
            .query_opt("retry_on_conflict", self.retry_on_conflict)
    }
}

/// Response of create, index, update and delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocWriteResponse {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version", default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub result: String,
    #[serde(rename = "_shards", default)]
    pub shards: ShardStats,
    #[serde(rename = "_seq_no", default)]
    pub seq_no: Option<i64>,
    #[serde(rename = "_primary_term", default)]
    pub primary_term: Option<i64>,
}

/// Response of `GET {index}/_doc/{id}`, also one entry of `_mget`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetDocumentResponse<S> {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version", default)]
    pub version: Option<i64>,
    #[serde(rename = "_seq_no", default)]
    pub seq_no: Option<i64>,
    #[serde(rename = "_primary_term", default)]
    pub primary_term: Option<i64>,
    #[serde(default)]
    pub found: bool,
    #[serde(rename = "_source", default = "none")]
    pub source: Option<S>,
}

fn none<T>() -> Option<T> {
    None
}

/// Response of `_mget`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocsResponse<S> {
    #[serde(default = "Vec::new")]
    pub docs: Vec<GetDocumentResponse<S>>,
}

impl<S> DocsResponse<S> {
    /// Sources of the documents that were found
    pub fn sources(&self) -> Vec<&S> {
        self.docs
            .iter()
            .filter(|doc| doc.found)
            .filter_map(|doc| doc.source.as_ref())
            .collect()
    }

    pub fn into_sources(self) -> Vec<S> {
        self.docs
            .into_iter()
            .filter(|doc| doc.found)
            .filter_map(|doc| doc.source)
            .collect()
    }
}

/// Painless script that adds `params.count_<field>` to each field, creating
/// missing fields
pub fn counter_script(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| {
            format!(
                "if (ctx._source.{field} == null) {{ ctx._source.{field} = params.count_{field}; }} \
                 else {{ ctx._source.{field} += params.count_{field}; }}"
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Field names are spliced into script source, so only plain identifiers pass
fn check_field_name(field: &str) -> ClientResult<()> {
    let mut chars = field.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ClientError::invalid_argument(format!(
            "invalid counter field name '{field}'"
        )))
    }
}

impl EsClient {
    /// Creates a document, failing with [`ClientError::Conflict`] if the id exists
    pub async fn create_document<T>(
        &self,
        index: &str,
        id: &str,
        document: &T,
        options: WriteOptions,
    ) -> ClientResult<DocWriteResponse>
    where
        T: Serialize + ?Sized,
    {
        require("index", index)?;
        require("id", id)?;
        let request = options.apply(PendingRequest::put([index, "_create", id]).json(document)?);
        self.send_json(request).await
    }

    /// Creates or replaces a document
    pub async fn index_document<T>(
        &self,
        index: &str,
        id: &str,
        document: &T,
        options: WriteOptions,
    ) -> ClientResult<DocWriteResponse>
    where
        T: Serialize + ?Sized,
    {
        require("index", index)?;
        require("id", id)?;
        let request = options.apply(PendingRequest::put([index, "_doc", id]).json(document)?);
        self.send_json(request).await
    }

    /// Fetches a document's source; a missing document is [`ClientError::NotFound`]
    pub async fn get_document<S>(
        &self,
        index: &str,
        id: &str,
    ) -> ClientResult<GetDocumentResponse<S>, DocumentNotFoundError>
    where
        S: DeserializeOwned,
    {
        require("index", index)?;
        require("id", id)?;
        self.send_json(PendingRequest::get([index, "_doc", id]))
            .await
    }

    /// Fetches several documents by id in one round trip
    pub async fn get_documents<S, I>(
        &self,
        index: &str,
        ids: &[I],
    ) -> ClientResult<DocsResponse<S>, GenericError>
    where
        S: DeserializeOwned,
        I: AsRef<str>,
    {
        require("index", index)?;
        if ids.is_empty() {
            return Ok(DocsResponse { docs: Vec::new() });
        }
        let ids: Vec<&str> = ids.iter().map(AsRef::as_ref).collect();
        let request = PendingRequest::post([index, "_mget"]).json(&json!({ "ids": ids }))?;
        self.send_json(request).await
    }

    pub async fn delete_document(
        &self,
        index: &str,
        id: &str,
        options: WriteOptions,
    ) -> ClientResult<DocWriteResponse> {
        require("index", index)?;
        require("id", id)?;
        let request = options.apply(PendingRequest::delete([index, "_doc", id]));
        self.send_json(request).await
    }

    /// Merges `partial` into an existing document
    pub async fn update_document<T>(
        &self,
        index: &str,
        id: &str,
        partial: &T,
        options: WriteOptions,
    ) -> ClientResult<DocWriteResponse>
    where
        T: Serialize + ?Sized,
    {
        let body = json!({ "doc": serde_json::to_value(partial)? });
        self.post_update(index, id, &body, options).await
    }

    /// Updates a document with an inline painless script
    pub async fn update_document_script(
        &self,
        index: &str,
        id: &str,
        source: &str,
        params: Map<String, Value>,
        options: WriteOptions,
    ) -> ClientResult<DocWriteResponse> {
        let body = json!({
            "script": {
                "source": source,
                "lang": "painless",
                "params": params,
            }
        });
        self.post_update(index, id, &body, options).await
    }

    /// Adds each delta to its counter field, creating the document if needed
    pub async fn update_counters(
        &self,
        index: &str,
        id: &str,
        counters: &BTreeMap<String, i64>,
        options: WriteOptions,
    ) -> ClientResult<DocWriteResponse> {
        if counters.is_empty() {
            return Err(ClientError::invalid_argument("no counters to update"));
        }
        let mut fields = Vec::with_capacity(counters.len());
        let mut params = Map::new();
        for (field, delta) in counters {
            check_field_name(field)?;
            fields.push(field.as_str());
            params.insert(format!("count_{field}"), Value::from(*delta));
        }

        let body = json!({
            "scripted_upsert": true,
            "script": {
                "source": counter_script(&fields),
                "lang": "painless",
                "params": params,
            },
            "upsert": {},
        });
        self.post_update(index, id, &body, options).await
    }

    /// Adds the same delta to every field in `fields`
    pub async fn update_counter_fields(
        &self,
        index: &str,
        id: &str,
        delta: i64,
        fields: &[&str],
        options: WriteOptions,
    ) -> ClientResult<DocWriteResponse> {
        let counters: BTreeMap<String, i64> =
            fields.iter().map(|field| (field.to_string(), delta)).collect();
        self.update_counters(index, id, &counters, options).await
    }

    pub(crate) async fn post_update(
        &self,
        index: &str,
        id: &str,
        body: &Value,
        options: WriteOptions,
    ) -> ClientResult<DocWriteResponse, ErrorEnvelope> {
        require("index", index)?;
        require("id", id)?;
        let request = options.apply(PendingRequest::post([index, "_update", id]).json(body)?);
        self.send_json(request).await
    }
}
