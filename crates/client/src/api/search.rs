//! Search and count endpoints
//!
//! Responses are generic over the document type `D`, the aggregations shape
//! `A` and the hit sort representation `S`. The default `S` is
//! [`SortValues`], which keeps large integers exact so the last hit's sort can
//! be sent back verbatim as `search_after`.

use eswrap_core::{SortDecodeError, SortSchema, SortValues};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::client::index_path;
use crate::envelope::GenericError;
use crate::error::{ClientError, ClientResult};
use crate::request::PendingRequest;
use crate::EsClient;

/// Shard summary included in most responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardStats {
    pub total: u32,
    pub successful: u32,
    #[serde(default)]
    pub skipped: u32,
    pub failed: u32,
}

/// Body of a `_search` response
#[derive(Debug, Deserialize)]
pub struct SearchResponse<D, A = IgnoredAny, S = SortValues> {
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(rename = "_scroll_id", default)]
    pub scroll_id: Option<String>,
    #[serde(rename = "_shards", default)]
    pub shards: ShardStats,
    pub hits: HitsMetadata<D, S>,
    #[serde(default = "none")]
    pub aggregations: Option<A>,
}

fn none<T>() -> Option<T> {
    None
}

/// Search response whose hit sort values are decoded later with a [`SortSchema`]
pub type TypedSortSearchResponse<D, A = IgnoredAny> = SearchResponse<D, A, Box<RawValue>>;

#[derive(Debug, Deserialize)]
pub struct HitsMetadata<D, S = SortValues> {
    #[serde(default)]
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default = "Vec::new")]
    pub hits: Vec<Hit<D, S>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalHits {
    pub value: u64,
    pub relation: String,
}

/// One search hit
#[derive(Debug, Deserialize)]
pub struct Hit<D, S = SortValues> {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source", default = "none")]
    pub source: Option<D>,
    #[serde(default)]
    pub fields: HashMap<String, Vec<Value>>,
    #[serde(default = "none")]
    pub sort: Option<S>,
    #[serde(default)]
    pub highlight: HashMap<String, Vec<String>>,
}

impl<D, A, S> SearchResponse<D, A, S> {
    /// Total hit count reported by the cluster, 0 if tracking was disabled
    pub fn total(&self) -> u64 {
        self.hits.total.as_ref().map_or(0, |total| total.value)
    }

    /// Sources of the hits that carry one
    pub fn sources(&self) -> Vec<&D> {
        self.hits
            .hits
            .iter()
            .filter_map(|hit| hit.source.as_ref())
            .collect()
    }

    pub fn into_sources(self) -> Vec<D> {
        self.hits
            .hits
            .into_iter()
            .filter_map(|hit| hit.source)
            .collect()
    }

    /// Sort values of the last hit, the cursor for the next page
    pub fn last_sort(&self) -> Option<&S> {
        self.hits.hits.last()?.sort.as_ref()
    }
}

impl<D, A> SearchResponse<D, A, Box<RawValue>> {
    /// Decodes the last hit's sort values with `schema`
    pub fn last_sort_typed(
        &self,
        schema: &SortSchema,
    ) -> Result<Option<SortValues>, SortDecodeError> {
        self.last_sort()
            .map(|raw| schema.decode_raw(raw))
            .transpose()
    }
}

/// Body of a `_count` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
    #[serde(rename = "_shards", default)]
    pub shards: ShardStats,
}

/// Inserts the pagination keys into a search body
///
/// `search_after` is only added when the cursor is non-empty and `sort` only
/// when it is present.
pub fn paginate_body<B: Serialize + ?Sized>(
    body: &B,
    size: u64,
    search_after: Option<&SortValues>,
    sort: Option<&Value>,
) -> Result<Map<String, Value>, ClientError<GenericError>> {
    let mut object = match serde_json::to_value(body)? {
        Value::Object(object) => object,
        Value::Null => Map::new(),
        other => {
            return Err(ClientError::invalid_argument(format!(
                "search body must be a JSON object, got {other}"
            )))
        }
    };

    object.insert("size".to_string(), Value::from(size));
    if let Some(cursor) = search_after.filter(|cursor| !cursor.is_empty()) {
        object.insert(
            "search_after".to_string(),
            serde_json::to_value(cursor)?,
        );
    }
    if let Some(sort) = sort {
        object.insert("sort".to_string(), sort.clone());
    }
    Ok(object)
}

impl EsClient {
    /// Runs a search; an empty `index` searches all indices
    ///
    /// `R` is usually a [`SearchResponse`] or [`TypedSortSearchResponse`].
    pub async fn search<R, B>(&self, index: &str, body: &B) -> ClientResult<R, GenericError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = PendingRequest::post(index_path(index, "_search")).json(body)?;
        self.send_json(request).await
    }

    /// Runs a search with a pre-encoded JSON body
    pub async fn search_raw<R>(
        &self,
        index: &str,
        body: impl Into<Vec<u8>>,
    ) -> ClientResult<R, GenericError>
    where
        R: DeserializeOwned,
    {
        let request = PendingRequest::post(index_path(index, "_search")).raw_json(body);
        self.send_json(request).await
    }

    /// Fetches one page of a `search_after` traversal
    ///
    /// `body` carries the query; `size`, `search_after` and `sort` are set on
    /// top of it.
    pub async fn search_paginated<R, B>(
        &self,
        index: &str,
        body: &B,
        size: u64,
        search_after: Option<&SortValues>,
        sort: Option<&Value>,
    ) -> ClientResult<R, GenericError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = paginate_body(body, size, search_after, sort)?;
        self.search(index, &body).await
    }

    /// Counts documents matching `query` (a query clause, not a full body)
    pub async fn count(&self, index: &str, query: Option<&Value>) -> ClientResult<u64, GenericError> {
        let mut request = PendingRequest::post(index_path(index, "_count"));
        if let Some(query) = query {
            request = request.json(&serde_json::json!({ "query": query }))?;
        }
        let response = self
            .send_json::<CountResponse, GenericError>(request)
            .await?;
        Ok(response.count)
    }

    pub async fn count_all(&self, index: &str) -> ClientResult<u64, GenericError> {
        self.count(index, None).await
    }
}
