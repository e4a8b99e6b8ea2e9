//! JSON-RPC Request/Response Types
//!
//! Envelope types for JSON-RPC 2.0 plus the subset of the ledger's
//! object-read responses the state source consumes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a> {
  pub jsonrpc: &'static str,
  pub id: u64,
  pub method: &'a str,
  pub params: Value,
}

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse<T> {
  /// Payload on success.
  pub result: Option<T>,
  /// Error object on failure.
  pub error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
  pub code: i64,
  pub message: String,
}

/// Response to an object read (`sui_getObject`, `suix_getDynamicFieldObject`).
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectResponse {
  /// Object data when the object exists.
  pub data: Option<ObjectData>,
  /// Read error, e.g. `{"code": "notExists"}`.
  pub error: Option<ObjectError>,
}

/// Object data with its parsed Move content.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectData {
  pub object_id: String,
  /// Present when requested with `showContent`.
  pub content: Option<ObjectContent>,
}

/// Parsed Move object content.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectContent {
  /// `moveObject` or `package`.
  pub data_type: String,
  /// Fully qualified Move type.
  #[serde(rename = "type")]
  pub type_name: Option<String>,
  /// Struct fields; numbers above 2^53 arrive as strings.
  #[serde(default)]
  pub fields: Value,
}

/// Object-level read error.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectError {
  pub code: String,
}

impl ObjectError {
  /// Whether the error means "no such object" rather than a failure.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self.code.as_str(),
      "notExists" | "deleted" | "dynamicFieldNotFound"
    )
  }
}

/// Dynamic field name used to address a table entry.
#[derive(Debug, Clone, Serialize)]
pub struct DynamicFieldName {
  #[serde(rename = "type")]
  pub type_name: &'static str,
  pub value: String,
}
