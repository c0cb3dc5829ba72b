//! Wire types for the analysis worker.
//!
//! Requests arrive one JSON-RPC 2.0 object per line. A request without an
//! `id` is a notification and is never answered. Every answer echoes the
//! request `id` and carries either `result` or `error`, never both.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The request line is not valid JSON-RPC.
pub const PARSE_ERROR: i64 = -32700;
/// No handler for the requested method.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Params failed to decode, or the columns have different lengths.
pub const INVALID_PARAMS: i64 = -32602;

/// One request or notification line.
#[derive(Debug, Deserialize)]
pub struct JsonRpcMessage {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: Value, code: i64, message: String) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(JsonRpcError { code, message }),
        }
    }

    /// Reply to a line that could not be decoded. The id is unknown, so it is `null`.
    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::err(Value::Null, PARSE_ERROR, format!("parse error: {detail}"))
    }

    pub fn method_not_found(id: Value, method: &str) -> Self {
        Self::err(id, METHOD_NOT_FOUND, format!("method not found: {method}"))
    }

    /// Wrap a crosstab handler outcome. Handler errors are always bad input.
    pub fn from_handler(id: Value, outcome: Result<Value, String>) -> Self {
        match outcome {
            Ok(value) => Self::ok(id, value),
            Err(message) => Self::err(id, INVALID_PARAMS, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_and_error_are_exclusive() {
        let ok = serde_json::to_value(JsonRpcResponse::ok(json!(1), json!({}))).unwrap();
        assert_eq!(ok, json!({"jsonrpc": "2.0", "id": 1, "result": {}}));

        let err = serde_json::to_value(JsonRpcResponse::from_handler(
            json!("req-2"),
            Err("shape mismatch".into()),
        ))
        .unwrap();
        assert!(err.get("result").is_none());
        assert_eq!(err["id"], "req-2");
        assert_eq!(err["error"]["code"], INVALID_PARAMS);
    }

    #[test]
    fn test_parse_error_has_null_id() {
        let resp = serde_json::to_value(JsonRpcResponse::parse_error("eof")).unwrap();
        assert!(resp["id"].is_null());
        assert_eq!(resp["error"]["code"], PARSE_ERROR);
        assert_eq!(resp["error"]["message"], "parse error: eof");
    }

    #[test]
    fn test_notification_decodes_without_id() {
        let msg: JsonRpcMessage =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"ping"}"#).unwrap();
        assert!(msg.id.is_none());
        assert!(msg.params.is_none());
    }
}
