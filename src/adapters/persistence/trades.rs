//! Trade Log - Daily JSONL Trade Records
//!
//! Reads trades from daily JSONL files in the format
//! `trades/YYYY-MM-DD.jsonl`, partitioned by execution date. Each line
//! is a self-contained JSON record, so a torn final line costs one
//! trade, not the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument, warn};

use crate::domain::trade::Trade;
use crate::ports::trade_history::TradeHistory;

/// Daily-partitioned JSONL trade log.
pub struct TradeLog {
    /// Base directory for trade files.
    trades_dir: PathBuf,
}

impl TradeLog {
    /// Open the trade log under the given data directory, creating it
    /// when absent.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let trades_dir = data_dir.as_ref().join("trades");

        fs::create_dir_all(&trades_dir)
            .await
            .context("Failed to create trades directory")?;

        Ok(Self { trades_dir })
    }
}

#[async_trait]
impl TradeHistory for TradeLog {
    /// Load every trade from every daily file, oldest first.
    #[instrument(skip(self))]
    async fn load_trades(&self) -> Result<Vec<Trade>> {
        let mut trades = Vec::new();
        let mut entries = fs::read_dir(&self.trades_dir)
            .await
            .context("Failed to list trades directory")?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "jsonl") {
                continue;
            }
            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            for line in content.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Trade>(line) {
                    Ok(trade) => trades.push(trade),
                    Err(e) => {
                        warn!(
                            file = %path.display(),
                            error = %e,
                            "Skipping malformed trade record"
                        );
                    }
                }
            }
        }

        trades.sort_by_key(|t| t.executed_at);
        debug!(count = trades.len(), "Loaded trade records");
        Ok(trades)
    }

    /// Check if the trades directory can be listed.
    async fn is_healthy(&self) -> bool {
        fs::read_dir(&self.trades_dir).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::trade::TradeSide;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("trades-{}", uuid::Uuid::new_v4()))
    }

    async fn append(dir: &Path, day: &str, lines: &[String]) {
        let path = dir.join("trades").join(format!("{day}.jsonl"));
        let mut content = fs::read_to_string(&path).await.unwrap_or_default();
        for line in lines {
            content.push_str(line);
            content.push('\n');
        }
        fs::write(&path, content).await.unwrap();
    }

    #[tokio::test]
    async fn test_loads_every_day_in_order() {
        let dir = scratch_dir();
        let log = TradeLog::new(&dir).await.unwrap();

        let mut later = Trade::new("0xa", TradeSide::Sell, 0, 100, 5, 2_000_000);
        later.executed_at = Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap();
        let mut earlier = Trade::new("0xb", TradeSide::Buy, 0, 100, 5, 1_000_000);
        earlier.executed_at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        append(&dir, "2025-03-02", &[serde_json::to_string(&later).unwrap()]).await;
        append(&dir, "2025-03-01", &[serde_json::to_string(&earlier).unwrap()]).await;
        fs::write(dir.join("trades/notes.txt"), "ignored").await.unwrap();

        let trades = log.load_trades().await.unwrap();
        assert_eq!(trades, vec![earlier, later]);

        assert!(log.is_healthy().await);
        let _ = fs::remove_dir_all(&dir).await;
        assert!(!log.is_healthy().await);
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let dir = scratch_dir();
        let log = TradeLog::new(&dir).await.unwrap();

        let trade = Trade::new("0xa", TradeSide::Buy, 0, 100, 5, 1_000_000);
        append(
            &dir,
            "2025-03-01",
            &[
                serde_json::to_string(&trade).unwrap(),
                "{\"truncated\":".to_string(),
                String::new(),
            ],
        )
        .await;

        let trades = log.load_trades().await.unwrap();
        assert_eq!(trades, vec![trade]);
        let _ = fs::remove_dir_all(&dir).await;
    }
}
