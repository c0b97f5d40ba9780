use crate::core::errors::StoreError;
use crate::core::traits::TradeStore;
use crate::core::types::TradeRecord;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

/// Append-only trade log, one JSON document per line.
///
/// The file is opened lazily on each save, so a sink that becomes
/// unavailable (missing directory, permissions) reports a `StoreError`
/// for that record without affecting the session or earlier records.
pub struct JsonlTradeStore {
    path: PathBuf,
}

impl JsonlTradeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl TradeStore for JsonlTradeStore {
    #[instrument(skip(self, record), fields(order_id = %record.order_id))]
    async fn save(&self, record: &TradeRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    async fn find(&self, order_id: &str) -> Result<Option<TradeRecord>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // last write wins, records are append-only
        let mut found = None;
        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            let record: TradeRecord = serde_json::from_str(line)?;
            if record.order_id == order_id {
                found = Some(record);
            }
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn record(order_id: &str) -> TradeRecord {
        TradeRecord {
            order_id: order_id.to_string(),
            side: "buy".to_string(),
            instrument_name: "BTC-PERPETUAL".to_string(),
            amount: Decimal::from(10),
            price: Decimal::from(64000),
            order_type: "limit".to_string(),
            status: "open".to_string(),
            executed_at: Utc::now(),
        }
    }

    fn temp_store(name: &str) -> JsonlTradeStore {
        let path = std::env::temp_dir().join(format!(
            "deribitx-{}-{}.jsonl",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        JsonlTradeStore::new(path)
    }

    #[tokio::test]
    async fn saved_records_can_be_found_by_order_id() {
        let store = temp_store("roundtrip");

        store.save(&record("BTC-1")).await.unwrap();
        store.save(&record("BTC-2")).await.unwrap();

        let found = store.find("BTC-2").await.unwrap().unwrap();
        assert_eq!(found.order_id, "BTC-2");
        assert!(store.find("BTC-3").await.unwrap().is_none());

        let _ = std::fs::remove_file(store.path());
    }

    #[tokio::test]
    async fn find_on_missing_file_is_empty_not_an_error() {
        let store = temp_store("missing");
        assert!(store.find("BTC-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unavailable_sink_reports_store_error() {
        let store = JsonlTradeStore::new("/nonexistent-dir/trades.jsonl");
        let err = store.save(&record("BTC-1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
