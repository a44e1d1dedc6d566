//! Application error shapes returned by the cluster
//!
//! Each endpoint picks one of these as the `E` of its
//! [`ClientError`](crate::ClientError).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Standard `{"error": {...}, "status": N}` error body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorCause,
    #[serde(default)]
    pub status: u16,
}

/// One cause in an error body, possibly nested
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorCause {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub root_cause: Vec<ErrorCause>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<Box<ErrorCause>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_uuid: Option<String>,

    /// Script source echoed back by script errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub script_stack: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<ScriptPosition>,
}

/// Location of a script compile error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptPosition {
    pub offset: i64,
    pub start: i64,
    pub end: i64,
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {reason}", self.kind)?,
            None => f.write_str(&self.kind)?,
        }
        if let Some(position) = &self.position {
            write!(f, " at offset {}", position.offset)?;
        }
        if let Some(cause) = &self.caused_by {
            write!(f, " (caused by {cause})")?;
        }
        Ok(())
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, code: {}", self.error, self.status)?;
        if !self.error.root_cause.is_empty() {
            let kinds: Vec<&str> = self
                .error
                .root_cause
                .iter()
                .map(|cause| cause.kind.as_str())
                .collect();
            write!(f, ", root_cause: [{}]", kinds.join(", "))?;
        }
        Ok(())
    }
}

/// Any JSON object, for endpoints without a fixed error shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenericError(pub Map<String, Value>);

impl GenericError {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The `error.type` field when the body uses the standard envelope
    pub fn error_type(&self) -> Option<&str> {
        self.0.get("error")?.get("type")?.as_str()
    }
}

impl fmt::Display for GenericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str("{}"),
        }
    }
}

/// Body of a get-document miss
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentNotFoundError {
    #[serde(rename = "_index", default)]
    pub index: String,
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub found: bool,
}

impl fmt::Display for DocumentNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "document {}/{} not found (found={})",
            self.index, self.id, self.found
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_envelope_requires_error_field() {
        assert!(serde_json::from_str::<ErrorEnvelope>(r#"{"status": 400}"#).is_err());
        assert!(serde_json::from_str::<ErrorEnvelope>("not json").is_err());
    }

    #[test]
    fn test_envelope_display_includes_root_causes() {
        let body = r#"{
            "error": {
                "root_cause": [{"type": "resource_already_exists_exception", "reason": "index [a/x] already exists"}],
                "type": "resource_already_exists_exception",
                "reason": "index [a/x] already exists",
                "index_uuid": "x",
                "index": "a"
            },
            "status": 400
        }"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error.index.as_deref(), Some("a"));
        assert_eq!(
            envelope.to_string(),
            "resource_already_exists_exception: index [a/x] already exists, code: 400, \
             root_cause: [resource_already_exists_exception]"
        );
    }

    #[test]
    fn test_envelope_script_error_fields() {
        let body = r#"{
            "error": {
                "type": "script_exception",
                "reason": "compile error",
                "script_stack": ["ctx._source.a +", "               ^---- HERE"],
                "script": "ctx._source.a +",
                "lang": "painless",
                "position": {"offset": 15, "start": 0, "end": 15},
                "caused_by": {"type": "illegal_argument_exception", "reason": "unexpected end of script."}
            },
            "status": 400
        }"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error.script_stack.len(), 2);
        assert_eq!(envelope.error.lang.as_deref(), Some("painless"));
        assert_eq!(
            envelope.error.to_string(),
            "script_exception: compile error at offset 15 \
             (caused by illegal_argument_exception: unexpected end of script.)"
        );
    }

    #[test]
    fn test_generic_error_displays_compact_json() {
        let err: GenericError =
            serde_json::from_str(r#"{ "error": { "type": "x" }, "status": 500 }"#).unwrap();
        assert_eq!(err.error_type(), Some("x"));
        assert_eq!(err.to_string(), r#"{"error":{"type":"x"},"status":500}"#);
    }

    #[test]
    fn test_generic_error_rejects_non_object() {
        assert!(serde_json::from_str::<GenericError>("[1, 2]").is_err());
    }
}
