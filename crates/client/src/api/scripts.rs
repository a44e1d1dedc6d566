//! Stored scripts, painless execution and the field-update script

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};
use twox_hash::XxHash3_128;

use super::document::{DocWriteResponse, WriteOptions};
use super::indices::Acknowledged;
use crate::envelope::{ErrorEnvelope, GenericError};
use crate::error::{require, ClientError, ClientResult};
use crate::request::PendingRequest;
use crate::EsClient;

pub const PAINLESS: &str = "painless";

/// Applies a list of `set`/`incr`/`push` operations to a document
pub const FIELD_UPDATE_SCRIPT: &str = r#"
for (item in params.fields) {
  String name = item['name'];
  String op = item['tp'];
  if (op == 'set') {
    ctx._source[name] = item['value'];
  } else if (op == 'incr') {
    if (ctx._source[name] == null) {
      ctx._source[name] = item['value'];
    } else {
      ctx._source[name] += item['value'];
    }
  } else if (op == 'push') {
    def value = item['value'];
    if (ctx._source[name] == null) {
      ctx._source[name] = new ArrayList();
    }
    if (value instanceof List) {
      ctx._source[name].addAll(value);
    } else {
      ctx._source[name].add(value);
    }
  }
}
"#;

/// Stored script id derived from the script source
pub fn script_id(source: &str) -> String {
    format!("{:032x}", XxHash3_128::oneshot(source.as_bytes()))
}

/// Id under which [`FIELD_UPDATE_SCRIPT`] is stored
pub fn field_update_script_id() -> String {
    script_id(FIELD_UPDATE_SCRIPT)
}

/// A script as stored in the cluster state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredScript {
    pub lang: String,
    pub source: String,
}

impl StoredScript {
    pub fn painless(source: impl Into<String>) -> Self {
        Self {
            lang: PAINLESS.to_string(),
            source: source.into(),
        }
    }
}

/// Response of `GET _scripts/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetStoredScriptResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub found: bool,
    #[serde(default)]
    pub script: Option<StoredScript>,
}

/// Response of `GET _script_language`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptLanguagesResponse {
    #[serde(default)]
    pub types_allowed: Vec<String>,
    #[serde(default)]
    pub language_contexts: Vec<LanguageContexts>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageContexts {
    pub language: String,
    #[serde(default)]
    pub contexts: Vec<String>,
}

/// Response of `GET _script_context`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptContextsResponse {
    #[serde(default)]
    pub contexts: Vec<ScriptContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptContext {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<Value>,
}

/// Body of `POST _scripts/painless/_execute`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PainlessExecuteRequest {
    pub script: PainlessScript,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_setup: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PainlessScript {
    pub source: String,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub params: serde_json::Map<String, Value>,
}

impl PainlessExecuteRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            script: PainlessScript {
                source: source.into(),
                params: serde_json::Map::new(),
            },
            context: None,
            context_setup: None,
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.script.params.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainlessExecuteResponse {
    pub result: Value,
}

/// Kind of a field-update operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldOp {
    /// Replace the field value
    Set,
    /// Add to a numeric field, creating it if missing
    Incr,
    /// Append to an array field, creating it if missing
    ///
    /// A list value is appended element by element, so pushing `["a", "b"]`
    /// onto a missing field stores `["a", "b"]`. Any other value is appended
    /// as a single element.
    Push,
}

impl fmt::Display for FieldOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Set => "set",
            Self::Incr => "incr",
            Self::Push => "push",
        })
    }
}

/// One operation of [`EsClient::update_fields`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    #[serde(rename = "tp")]
    pub op: FieldOp,
    pub name: String,
    pub value: Value,
}

impl FieldUpdate {
    pub fn set(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: FieldOp::Set,
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn incr(name: impl Into<String>, delta: impl Into<Value>) -> Self {
        Self {
            op: FieldOp::Incr,
            name: name.into(),
            value: delta.into(),
        }
    }

    pub fn push(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: FieldOp::Push,
            name: name.into(),
            value: value.into(),
        }
    }
}

impl EsClient {
    pub async fn put_stored_script(
        &self,
        id: &str,
        script: &StoredScript,
    ) -> ClientResult<Acknowledged, GenericError> {
        if id.trim().is_empty() {
            return Err(ClientError::invalid_argument("script id is required"));
        }
        let request = PendingRequest::put(["_scripts", id]).json(&json!({ "script": script }))?;
        self.send_json(request).await
    }

    pub async fn put_painless_script(
        &self,
        id: &str,
        source: &str,
    ) -> ClientResult<Acknowledged, GenericError> {
        self.put_stored_script(id, &StoredScript::painless(source))
            .await
    }

    /// Fetches a stored script; a missing id is [`ClientError::NotFound`]
    pub async fn get_stored_script(
        &self,
        id: &str,
    ) -> ClientResult<GetStoredScriptResponse, GenericError> {
        require("script id", id)?;
        self.send_json(PendingRequest::get(["_scripts", id]))
            .await
    }

    pub async fn delete_stored_script(&self, id: &str) -> ClientResult<Acknowledged, GenericError> {
        require("script id", id)?;
        self.send_json(PendingRequest::delete(["_scripts", id]))
            .await
    }

    pub async fn script_languages(&self) -> ClientResult<ScriptLanguagesResponse, GenericError> {
        self.send_json(PendingRequest::get(["_script_language"]))
            .await
    }

    pub async fn script_contexts(&self) -> ClientResult<ScriptContextsResponse, GenericError> {
        self.send_json(PendingRequest::get(["_script_context"]))
            .await
    }

    /// Runs a painless script without storing it
    pub async fn execute_painless(
        &self,
        request: &PainlessExecuteRequest,
    ) -> ClientResult<PainlessExecuteResponse> {
        let request = PendingRequest::post(["_scripts", PAINLESS, "_execute"]).json(request)?;
        self.send_json(request).await
    }

    /// Stores every script in `scripts` (id -> painless source)
    ///
    /// Stops at the first failure. Returns the number of acknowledged scripts.
    pub async fn register_scripts(
        &self,
        scripts: &BTreeMap<String, String>,
    ) -> ClientResult<usize, GenericError> {
        let mut acknowledged = 0;
        for (id, source) in scripts {
            debug!("Registering stored script {id}");
            if self.put_painless_script(id, source).await?.acknowledged {
                acknowledged += 1;
            } else {
                warn!("Stored script {id} was not acknowledged");
            }
        }
        Ok(acknowledged)
    }

    /// Stores [`FIELD_UPDATE_SCRIPT`] under its content-derived id
    pub async fn init_field_update_script(&self) -> ClientResult<String, GenericError> {
        let id = field_update_script_id();
        self.put_painless_script(&id, FIELD_UPDATE_SCRIPT).await?;
        info!("Stored field update script as {id}");
        Ok(id)
    }

    /// Applies `updates` in order with the stored field-update script
    ///
    /// The script must have been stored with [`Self::init_field_update_script`].
    pub async fn update_fields(
        &self,
        index: &str,
        id: &str,
        updates: &[FieldUpdate],
        options: WriteOptions,
    ) -> ClientResult<DocWriteResponse, ErrorEnvelope> {
        if updates.is_empty() {
            return Err(ClientError::invalid_argument("no field updates given"));
        }
        let body = json!({
            "script": {
                "id": field_update_script_id(),
                "params": { "fields": updates },
            }
        });
        self.post_update(index, id, &body, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_script_id_is_stable_hex() {
        let id = field_update_script_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, script_id(FIELD_UPDATE_SCRIPT));
        assert_ne!(id, script_id("ctx._source.a = 1"));
    }

    #[test]
    fn test_field_update_wire_shape() {
        let updates = vec![
            FieldUpdate::set("title", "hello"),
            FieldUpdate::incr("views", 2),
            FieldUpdate::push("tags", "new"),
        ];
        assert_eq!(
            serde_json::to_value(&updates).unwrap(),
            json!([
                {"tp": "set", "name": "title", "value": "hello"},
                {"tp": "incr", "name": "views", "value": 2},
                {"tp": "push", "name": "tags", "value": "new"}
            ])
        );
    }

    #[test]
    fn test_push_appends_list_elements() {
        assert!(FIELD_UPDATE_SCRIPT.contains("if (value instanceof List) {"));
        assert!(FIELD_UPDATE_SCRIPT.contains("ctx._source[name].addAll(value);"));
        assert!(FIELD_UPDATE_SCRIPT.contains("ctx._source[name].add(value);"));

        let update = FieldUpdate::push("tags", json!(["a", "b"]));
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"tp": "push", "name": "tags", "value": ["a", "b"]})
        );
    }

    #[test]
    fn test_painless_request_skips_empty_params() {
        let request = PainlessExecuteRequest::new("1 + 1");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"script": {"source": "1 + 1"}})
        );

        let request = PainlessExecuteRequest::new("params.a * 2").param("a", 21);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"script": {"source": "params.a * 2", "params": {"a": 21}}})
        );
    }
}
