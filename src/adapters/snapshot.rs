//! Snapshot State Source - JSON File Market Store
//!
//! Serves market objects from a JSON snapshot file, for offline quoting
//! and fixtures. The file is re-read on every market read so edits show
//! up without a restart. Table-backed distributions are resolved from
//! that same read, so a market never mixes two versions of the file.
//! Writers are expected to replace the file atomically (tmp + rename).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, instrument};

use crate::ports::state_source::{DistributionSource, MarketObject, StateSource};

/// On-disk snapshot layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Market objects by id.
    #[serde(default)]
    pub markets: BTreeMap<String, MarketObject>,
    /// Table contents by table id: bucket → shares.
    #[serde(default)]
    pub tables: BTreeMap<String, BTreeMap<i64, u128>>,
}

/// File-backed `StateSource`.
pub struct SnapshotStateSource {
    /// Path to the snapshot JSON.
    path: PathBuf,
}

impl SnapshotStateSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole snapshot. A missing file is an empty snapshot.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<MarketSnapshot> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(MarketSnapshot::default());
        }

        let json = fs::read_to_string(&self.path)
            .await
            .context("Failed to read snapshot file")?;
        serde_json::from_str(&json).context("Failed to parse snapshot JSON")
    }
}

impl MarketSnapshot {
    /// Take `market_id` out of the snapshot with any table distribution
    /// inlined. Active buckets absent from their table hold zero shares;
    /// a table absent from the snapshot leaves the distribution missing.
    fn take_market(&mut self, market_id: &str) -> Option<MarketObject> {
        let mut object = self.markets.remove(market_id)?;

        object.distribution = match object.distribution {
            DistributionSource::Table {
                table_id,
                active_buckets,
            } => match self.tables.get(&table_id) {
                Some(table) => DistributionSource::Inline {
                    entries: active_buckets
                        .iter()
                        .map(|&bucket| (bucket, table.get(&bucket).copied().unwrap_or(0)))
                        .collect(),
                },
                None => {
                    debug!(market_id, table_id = %table_id, "Snapshot has no such table");
                    DistributionSource::Missing
                }
            },
            other => other,
        };
        Some(object)
    }
}

#[async_trait]
impl StateSource for SnapshotStateSource {
    async fn market_object(&self, market_id: &str) -> Result<Option<MarketObject>> {
        let mut snapshot = self.load().await?;
        Ok(snapshot.take_market(market_id))
    }

    async fn bucket_shares(&self, table_id: &str, bucket: i64) -> Result<Option<u128>> {
        let snapshot = self.load().await?;
        Ok(snapshot
            .tables
            .get(table_id)
            .and_then(|table| table.get(&bucket))
            .copied())
    }

    async fn is_healthy(&self) -> bool {
        self.load().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("snapshot-{}", uuid::Uuid::new_v4()))
            .join("markets.json")
    }

    fn market(id: &str, distribution: DistributionSource) -> MarketObject {
        MarketObject {
            id: id.to_string(),
            alpha: Some(1_000_000),
            balance: Some(0),
            min_value: Some(0),
            max_value: Some(1_000),
            bucket_width: Some(100),
            max_shares_per_bucket: None,
            distribution,
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let source = SnapshotStateSource::new(scratch_path());
        assert_eq!(source.load().await.unwrap(), MarketSnapshot::default());
        assert!(source.market_object("0xm").await.unwrap().is_none());
        assert!(source.is_healthy().await);
    }

    async fn write_snapshot(path: &Path, snapshot: &MarketSnapshot) {
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(path, serde_json::to_string_pretty(snapshot).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_table_market_is_inlined_from_one_read() {
        let path = scratch_path();
        let mut snapshot = MarketSnapshot::default();
        snapshot.markets.insert(
            "0xa".into(),
            market(
                "0xa",
                DistributionSource::Table {
                    table_id: "0xt".into(),
                    active_buckets: vec![1, 2],
                },
            ),
        );
        snapshot
            .tables
            .insert("0xt".into(), BTreeMap::from([(1, 250_000), (9, 7)]));
        write_snapshot(&path, &snapshot).await;

        let source = SnapshotStateSource::new(&path);
        let object = source.market_object("0xa").await.unwrap().unwrap();
        assert_eq!(object.alpha, Some(1_000_000));
        assert_eq!(
            object.distribution,
            DistributionSource::Inline {
                entries: BTreeMap::from([(1, 250_000), (2, 0)]),
            }
        );

        assert_eq!(source.bucket_shares("0xt", 1).await.unwrap(), Some(250_000));
        assert_eq!(source.bucket_shares("0xnope", 1).await.unwrap(), None);

        let _ = fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_table_missing_from_snapshot_leaves_no_distribution() {
        let path = scratch_path();
        let mut snapshot = MarketSnapshot::default();
        snapshot.markets.insert(
            "0xa".into(),
            market(
                "0xa",
                DistributionSource::Table {
                    table_id: "0xgone".into(),
                    active_buckets: vec![1],
                },
            ),
        );
        write_snapshot(&path, &snapshot).await;

        let source = SnapshotStateSource::new(&path);
        let object = source.market_object("0xa").await.unwrap().unwrap();
        assert_eq!(object.distribution, DistributionSource::Missing);

        let _ = fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let path = scratch_path();
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, "{ not json").await.unwrap();

        let source = SnapshotStateSource::new(&path);
        assert!(source.market_object("0xa").await.is_err());
        assert!(!source.is_healthy().await);

        let _ = fs::remove_dir_all(path.parent().unwrap()).await;
    }
}
