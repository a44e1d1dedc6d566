//! Bulk operations
//!
//! A bulk body is newline-delimited JSON: one action line per operation,
//! followed by a source line for everything except `delete`. The body must
//! end with a newline.

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use tracing::warn;

use super::search::ShardStats;
use crate::envelope::ErrorEnvelope;
use crate::error::{require, ClientError, ClientResult};
use crate::request::PendingRequest;
use crate::EsClient;

/// A document that knows its own id
pub trait BulkDocument {
    fn doc_id(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Index,
    Create,
    Update,
    Delete,
}

impl BulkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "index" => Some(Self::Index),
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for an NDJSON bulk body
#[derive(Debug, Clone, Default)]
pub struct BulkBody {
    buf: Vec<u8>,
    operations: usize,
}

impl BulkBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index<T: Serialize + ?Sized>(
        &mut self,
        id: &str,
        document: &T,
    ) -> Result<&mut Self, serde_json::Error> {
        self.push(BulkAction::Index, id, Some(document))
    }

    pub fn create<T: Serialize + ?Sized>(
        &mut self,
        id: &str,
        document: &T,
    ) -> Result<&mut Self, serde_json::Error> {
        self.push(BulkAction::Create, id, Some(document))
    }

    /// Merges `partial` into the existing document
    pub fn update<T: Serialize + ?Sized>(
        &mut self,
        id: &str,
        partial: &T,
    ) -> Result<&mut Self, serde_json::Error> {
        let partial = serde_json::to_value(partial)?;
        self.push(BulkAction::Update, id, Some(&json!({ "doc": partial })))
    }

    pub fn delete(&mut self, id: &str) -> Result<&mut Self, serde_json::Error> {
        self.push::<()>(BulkAction::Delete, id, None)
    }

    fn push<T: Serialize + ?Sized>(
        &mut self,
        action: BulkAction,
        id: &str,
        source: Option<&T>,
    ) -> Result<&mut Self, serde_json::Error> {
        let start = self.buf.len();
        let written = self.write_operation(action, id, source);
        if written.is_err() {
            self.buf.truncate(start);
        }
        written?;
        self.operations += 1;
        Ok(self)
    }

    fn write_operation<T: Serialize + ?Sized>(
        &mut self,
        action: BulkAction,
        id: &str,
        source: Option<&T>,
    ) -> Result<(), serde_json::Error> {
        serde_json::to_writer(
            &mut self.buf,
            &json!({ action.as_str(): { "_id": id } }),
        )?;
        self.buf.push(b'\n');
        if let Some(source) = source {
            serde_json::to_writer(&mut self.buf, source)?;
            self.buf.push(b'\n');
        }
        Ok(())
    }

    /// Number of operations added so far
    pub fn len(&self) -> usize {
        self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Response of `_bulk`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub took: u64,
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<BulkResponseItem>,
}

impl BulkResponse {
    /// Items that carry an error
    pub fn error_items(&self) -> Vec<&BulkResponseItem> {
        self.items
            .iter()
            .filter(|item| item.detail.error.is_some())
            .collect()
    }
}

/// One item of a bulk response, `{"<action>": {...}}` on the wire
#[derive(Debug, Clone, PartialEq)]
pub struct BulkResponseItem {
    pub action: BulkAction,
    pub detail: BulkItemDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkItemDetail {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(rename = "_shards", default, skip_serializing_if = "Option::is_none")]
    pub shards: Option<ShardStats>,
    #[serde(rename = "_seq_no", default, skip_serializing_if = "Option::is_none")]
    pub seq_no: Option<i64>,
    #[serde(rename = "_primary_term", default, skip_serializing_if = "Option::is_none")]
    pub primary_term: Option<i64>,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<BulkItemError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkItemError {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard: Option<String>,
}

impl Serialize for BulkResponseItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.action.as_str(), &self.detail)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for BulkResponseItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ItemVisitor;

        impl<'de> Visitor<'de> for ItemVisitor {
            type Value = BulkResponseItem;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a single-key object naming the bulk action")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
                let name: String = map
                    .next_key()?
                    .ok_or_else(|| de::Error::custom("empty bulk item"))?;
                let action = BulkAction::parse(&name).ok_or_else(|| {
                    de::Error::unknown_variant(&name, &["index", "create", "update", "delete"])
                })?;
                let detail = map.next_value()?;
                if map.next_key::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::custom("bulk item has more than one action"));
                }
                Ok(BulkResponseItem { action, detail })
            }
        }

        deserializer.deserialize_map(ItemVisitor)
    }
}

impl EsClient {
    /// Sends a pre-built bulk body to `index`
    pub async fn bulk(&self, index: &str, body: BulkBody) -> ClientResult<BulkResponse> {
        require("index", index)?;
        if body.is_empty() {
            return Err(ClientError::invalid_argument("bulk request has no operations"));
        }
        let operations = body.len();
        let request = PendingRequest::post([index, "_bulk"]).ndjson(body.into_bytes());
        let response: BulkResponse = self.send_json::<BulkResponse, ErrorEnvelope>(request).await?;
        if response.errors {
            warn!(
                "Bulk request to {index}: {}/{operations} operations failed",
                response.error_items().len()
            );
        }
        Ok(response)
    }

    /// Indexes (creates or replaces) every document
    pub async fn bulk_index<T>(&self, index: &str, documents: &[T]) -> ClientResult<BulkResponse>
    where
        T: BulkDocument + Serialize,
    {
        let mut body = BulkBody::new();
        for document in documents {
            body.index(document.doc_id(), document)?;
        }
        self.bulk(index, body).await
    }

    /// Creates every document; existing ids fail per item with status 409
    pub async fn bulk_create<T>(&self, index: &str, documents: &[T]) -> ClientResult<BulkResponse>
    where
        T: BulkDocument + Serialize,
    {
        let mut body = BulkBody::new();
        for document in documents {
            body.create(document.doc_id(), document)?;
        }
        self.bulk(index, body).await
    }

    /// Applies each `(id, partial document)` pair as a partial update
    pub async fn bulk_update<K, T>(&self, index: &str, updates: &[(K, T)]) -> ClientResult<BulkResponse>
    where
        K: AsRef<str>,
        T: Serialize,
    {
        let mut body = BulkBody::new();
        for (id, partial) in updates {
            body.update(id.as_ref(), partial)?;
        }
        self.bulk(index, body).await
    }

    pub async fn bulk_delete<K>(&self, index: &str, ids: &[K]) -> ClientResult<BulkResponse>
    where
        K: AsRef<str>,
    {
        let mut body = BulkBody::new();
        for id in ids {
            body.delete(id.as_ref())?;
        }
        self.bulk(index, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_body_lines() {
        let mut body = BulkBody::new();
        body.index("1", &json!({"a": 1}))
            .unwrap()
            .update("2", &json!({"b": 2}))
            .unwrap()
            .delete("3")
            .unwrap();

        assert_eq!(body.len(), 3);
        assert_eq!(
            String::from_utf8(body.into_bytes()).unwrap(),
            concat!(
                r#"{"index":{"_id":"1"}}"#, "\n",
                r#"{"a":1}"#, "\n",
                r#"{"update":{"_id":"2"}}"#, "\n",
                r#"{"doc":{"b":2}}"#, "\n",
                r#"{"delete":{"_id":"3"}}"#, "\n",
            )
        );
    }

    #[test]
    fn test_failed_source_leaves_body_untouched() {
        use std::collections::HashMap;

        // non-string map keys cannot be encoded as JSON
        let mut bad = HashMap::new();
        bad.insert(vec![1u8], 1);

        let mut body = BulkBody::new();
        body.create("1", &json!({"ok": true})).unwrap();
        let before = body.as_bytes().to_vec();

        assert!(body.index("2", &bad).is_err());
        assert_eq!(body.as_bytes(), before.as_slice());
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_response_items_are_tagged_by_action() {
        let body = r#"{
            "took": 30,
            "errors": true,
            "items": [
                {"index": {"_index": "test", "_id": "1", "_version": 1, "result": "created", "status": 201}},
                {"create": {"_index": "test", "_id": "2", "status": 409,
                    "error": {"type": "version_conflict_engine_exception", "reason": "document already exists", "index": "test", "shard": "0"}}},
                {"delete": {"_index": "test", "_id": "3", "result": "not_found", "status": 404}}
            ]
        }"#;
        let response: BulkResponse = serde_json::from_str(body).unwrap();
        let actions: Vec<BulkAction> = response.items.iter().map(|item| item.action).collect();
        assert_eq!(
            actions,
            vec![BulkAction::Index, BulkAction::Create, BulkAction::Delete]
        );

        let failed = response.error_items();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].detail.status, 409);
        assert_eq!(
            failed[0].detail.error.as_ref().unwrap().kind,
            "version_conflict_engine_exception"
        );

        let encoded = serde_json::to_value(&response.items[0]).unwrap();
        assert_eq!(encoded["index"]["result"], "created");
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let item = r#"{"upsert": {"_index": "t", "status": 200}}"#;
        assert!(serde_json::from_str::<BulkResponseItem>(item).is_err());
    }
}
