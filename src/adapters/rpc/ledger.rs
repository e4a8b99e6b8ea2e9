//! Ledger State Source - Move Object Reader
//!
//! Implements `StateSource` against a ledger full node: market objects
//! come from `sui_getObject` with content, table-backed distributions
//! are read entry by entry via `suix_getDynamicFieldObject`.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::client::RpcClient;
use super::types::{DynamicFieldName, ObjectResponse};
use crate::ports::state_source::{DistributionSource, MarketObject, StateSource};

/// `StateSource` backed by the ledger's JSON-RPC API.
pub struct LedgerStateSource {
  client: Arc<RpcClient>,
}

impl LedgerStateSource {
  pub fn new(client: Arc<RpcClient>) -> Self {
    Self { client }
  }
}

#[async_trait]
impl StateSource for LedgerStateSource {
  #[instrument(skip(self))]
  async fn market_object(&self, market_id: &str) -> Result<Option<MarketObject>> {
    let response: ObjectResponse = self
      .client
      .call(
        "sui_getObject",
        json!([market_id, { "showContent": true, "showType": true }]),
      )
      .await
      .with_context(|| format!("Failed to read market object {market_id}"))?;

    if let Some(err) = &response.error {
      if err.is_not_found() {
        debug!(market_id, code = %err.code, "Market object not found");
        return Ok(None);
      }
      anyhow::bail!("Object read for {market_id} failed: {}", err.code);
    }

    let Some(data) = response.data else {
      return Ok(None);
    };

    let fields = match data.content {
      Some(content) if content.data_type == "moveObject" => content.fields,
      _ => Value::Null,
    };
    parse_market_object(&data.object_id, &fields).map(Some)
  }

  #[instrument(skip(self))]
  async fn bucket_shares(&self, table_id: &str, bucket: i64) -> Result<Option<u128>> {
    let index = u64::try_from(bucket)
      .with_context(|| format!("Bucket {bucket} cannot address a u64-keyed table"))?;
    let name = DynamicFieldName {
      type_name: "u64",
      value: index.to_string(),
    };

    let response: ObjectResponse = self
      .client
      .call("suix_getDynamicFieldObject", json!([table_id, name]))
      .await
      .with_context(|| format!("Failed to read bucket {bucket} of table {table_id}"))?;

    if let Some(err) = &response.error {
      if err.is_not_found() {
        return Ok(None);
      }
      anyhow::bail!("Table entry read for bucket {bucket} failed: {}", err.code);
    }

    let value = response
      .data
      .and_then(|d| d.content)
      .and_then(|c| c.fields.get("value").cloned());
    match value {
      None => Ok(None),
      Some(v) => parse_u128(&v)
        .map(Some)
        .with_context(|| format!("Malformed share count for bucket {bucket}: {v}")),
    }
  }

  async fn is_healthy(&self) -> bool {
    self.client.health_check().await
  }
}

/// Map Move struct fields onto a `MarketObject`.
///
/// Unknown or absent fields become `None`; structurally broken
/// distribution entries are an error.
pub(crate) fn parse_market_object(object_id: &str, fields: &Value) -> Result<MarketObject> {
  Ok(MarketObject {
    id: object_id.to_string(),
    alpha: fields.get("alpha").and_then(parse_u128),
    balance: fields.get("balance").and_then(parse_u128),
    min_value: fields.get("min_value").and_then(parse_i64),
    max_value: fields.get("max_value").and_then(parse_i64),
    bucket_width: fields.get("bucket_width").and_then(parse_i64),
    max_shares_per_bucket: fields.get("max_shares_per_bucket").and_then(parse_u128),
    distribution: parse_distribution(fields)?,
  })
}

fn parse_distribution(fields: &Value) -> Result<DistributionSource> {
  let Some(dist) = fields.get("distribution") else {
    return Ok(DistributionSource::Missing);
  };
  let type_name = dist.get("type").and_then(Value::as_str).unwrap_or_default();
  let inner = dist.get("fields").unwrap_or(dist);

  // VecMap { contents: vector<Entry { key, value }> }
  if let Some(contents) = inner.get("contents").and_then(Value::as_array) {
    let mut entries = BTreeMap::new();
    for entry in contents {
      let entry = entry.get("fields").unwrap_or(entry);
      let bucket = entry
        .get("key")
        .and_then(parse_i64)
        .with_context(|| format!("Malformed distribution key: {entry}"))?;
      let shares = entry
        .get("value")
        .and_then(parse_u128)
        .with_context(|| format!("Malformed distribution value: {entry}"))?;
      entries.insert(bucket, shares);
    }
    return Ok(DistributionSource::Inline { entries });
  }

  // Table { id: UID, size }
  if type_name.contains("::table::Table") || inner.get("size").is_some() {
    let table_id = inner
      .get("id")
      .and_then(|uid| uid.get("id").or(Some(uid)))
      .and_then(Value::as_str)
      .context("Table distribution without an id")?
      .to_string();
    // without the index the table cannot be enumerated
    let Some(items) = fields.get("active_buckets").and_then(Value::as_array) else {
      return Ok(DistributionSource::Missing);
    };
    let active_buckets = items
      .iter()
      .map(parse_i64)
      .collect::<Option<Vec<_>>>()
      .context("Malformed active bucket list")?;
    let size = inner.get("size").and_then(parse_u128);
    if active_buckets.is_empty() && size != Some(0) {
      return Ok(DistributionSource::Missing);
    }
    return Ok(DistributionSource::Table {
      table_id,
      active_buckets,
    });
  }

  Ok(DistributionSource::Missing)
}

/// u64/u128 Move values arrive as JSON strings; small ones may be numbers.
fn parse_u128(value: &Value) -> Option<u128> {
  match value {
    Value::String(s) => s.parse().ok(),
    Value::Number(n) => n.as_u64().map(u128::from),
    // Balance<T> { value }
    Value::Object(_) => value
      .get("fields")
      .and_then(|f| f.get("value"))
      .or_else(|| value.get("value"))
      .and_then(parse_u128),
    _ => None,
  }
}

fn parse_i64(value: &Value) -> Option<i64> {
  match value {
    Value::String(s) => s.parse().ok(),
    Value::Number(n) => n.as_i64(),
    _ => None,
  }
}
