//! Index management endpoints

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::search::ShardStats;
use crate::decoder::DiscardBody;
use crate::envelope::{ErrorEnvelope, GenericError};
use crate::client::index_path;
use crate::error::{require, ClientError, ClientResult};
use crate::request::PendingRequest;
use crate::EsClient;

/// Master timeout for index creation
const CREATE_INDEX_TIMEOUT: &str = "30s";

/// Response of index creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexCreateResponse {
    pub acknowledged: bool,
    #[serde(default)]
    pub shards_acknowledged: bool,
    pub index: String,
}

/// Generic `{"acknowledged": bool}` response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledged {
    pub acknowledged: bool,
}

/// One index in the response of `GET {index}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    #[serde(default)]
    pub aliases: Map<String, Value>,
    #[serde(default)]
    pub mappings: Map<String, Value>,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

/// Response of `GET {index}/_stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    #[serde(rename = "_shards", default)]
    pub shards: ShardStats,
    #[serde(rename = "_all", default)]
    pub all: Value,
    #[serde(default)]
    pub indices: HashMap<String, Value>,
}

impl IndexStats {
    /// Primary document count across the matched indices
    pub fn doc_count(&self) -> Option<u64> {
        self.all
            .get("primaries")?
            .get("docs")?
            .get("count")?
            .as_u64()
    }
}

impl EsClient {
    /// Creates an index from a body holding `mappings`, `settings` and `aliases`
    pub async fn create_index<B>(&self, index: &str, body: &B) -> ClientResult<IndexCreateResponse>
    where
        B: Serialize + ?Sized,
    {
        require("index", index)?;
        let request = PendingRequest::put([index]).json(body)?;
        self.send_create_index(request).await
    }

    /// Creates an index from a pre-encoded JSON body
    pub async fn create_index_raw(
        &self,
        index: &str,
        body: impl Into<Vec<u8>>,
    ) -> ClientResult<IndexCreateResponse> {
        require("index", index)?;
        self.send_create_index(PendingRequest::put([index]).raw_json(body))
            .await
    }

    async fn send_create_index(
        &self,
        request: PendingRequest,
    ) -> ClientResult<IndexCreateResponse, ErrorEnvelope> {
        let request = request
            .query("timeout", CREATE_INDEX_TIMEOUT)
            .query("wait_for_active_shards", 1);
        self.send_json(request).await
    }

    /// Deletes an index; `false` if it did not exist
    pub async fn delete_index(&self, index: &str) -> ClientResult<bool, GenericError> {
        require("index", index)?;
        match self
            .send_json::<Acknowledged, GenericError>(PendingRequest::delete([index]))
            .await
        {
            Ok(response) => Ok(response.acknowledged),
            Err(ClientError::NotFound) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub async fn index_exists(&self, index: &str) -> ClientResult<bool, GenericError> {
        require("index", index)?;
        match self
            .send::<GenericError, _>(PendingRequest::head([index]), DiscardBody)
            .await
        {
            Ok(()) => Ok(true),
            Err(ClientError::NotFound) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Aliases, mappings and settings keyed by index name
    pub async fn get_index(&self, index: &str) -> ClientResult<HashMap<String, IndexInfo>, GenericError> {
        require("index", index)?;
        self.send_json(PendingRequest::get([index])).await
    }

    /// Statistics for `index`; an empty `index` covers all indices
    pub async fn index_stats(&self, index: &str) -> ClientResult<IndexStats, GenericError> {
        self.send_json(PendingRequest::get(index_path(index, "_stats")))
            .await
    }
}
