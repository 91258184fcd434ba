pub mod haoting;
pub mod html;

pub use haoting::{HaotingScraper, ReplayPage};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{PredictorError, PredictorResult};
use crate::store::RecordStore;
use crate::types::SessionRecord;

/// A feed of freshly observed session records
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Records observed on the page, stamped with `date`
    async fn fetch_records(&self, date: &str) -> PredictorResult<Vec<SessionRecord>>;
}

/// Fetch from `source` and write the rows to `store`, replacing the table
/// unless `append` is set. Transport failures are logged and count as an
/// empty scrape; an empty scrape leaves the store untouched.
pub async fn scrape_into_store(
    source: &dyn RecordSource,
    store: &RecordStore,
    date: &str,
    append: bool,
) -> PredictorResult<usize> {
    let records = match source.fetch_records(date).await {
        Ok(records) => records,
        Err(PredictorError::Transport(reason)) => {
            warn!("Scrape failed, no rows collected: {}", reason);
            return Ok(0);
        }
        Err(e) => return Err(e),
    };

    if records.is_empty() {
        warn!("Scrape returned no rows; {} left unchanged", store.path().display());
        return Ok(0);
    }

    let written = if append {
        store.append_all(&records)?
    } else {
        store.rewrite_all(&records)?
    };
    info!(
        "Scraped {} rows into {} ({})",
        written,
        store.path().display(),
        if append { "appended" } else { "rewritten" }
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(PredictorResult<Vec<SessionRecord>>);

    #[async_trait]
    impl RecordSource for FixedSource {
        async fn fetch_records(&self, date: &str) -> PredictorResult<Vec<SessionRecord>> {
            match &self.0 {
                Ok(records) => Ok(records
                    .iter()
                    .map(|r| SessionRecord { date: date.to_string(), ..r.clone() })
                    .collect()),
                Err(e) => Err(PredictorError::Transport(e.to_string())),
            }
        }
    }

    fn rows() -> Vec<SessionRecord> {
        vec![
            SessionRecord::new("", 40, true, false, true),
            SessionRecord::new("", 65, false, true, false),
        ]
    }

    #[tokio::test]
    async fn test_rewrite_replaces_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("history.csv"));
        store
            .append_all(&[SessionRecord::new("2024-07-01", 12, false, false, false)])
            .unwrap();

        let written = scrape_into_store(&FixedSource(Ok(rows())), &store, "2024-08-01", false)
            .await
            .unwrap();
        assert_eq!(written, 2);

        let stored = store.read_all().unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|r| r.date == "2024-08-01"));
    }

    #[tokio::test]
    async fn test_append_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("history.csv"));
        store
            .append_all(&[SessionRecord::new("2024-07-01", 12, false, false, false)])
            .unwrap();

        scrape_into_store(&FixedSource(Ok(rows())), &store, "2024-08-01", true)
            .await
            .unwrap();
        assert_eq!(store.read_all().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_transport_failure_is_empty_and_leaves_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("history.csv"));
        store
            .append_all(&[SessionRecord::new("2024-07-01", 12, false, false, false)])
            .unwrap();

        let source = FixedSource(Err(PredictorError::Transport("timed out".to_string())));
        let written = scrape_into_store(&source, &store, "2024-08-01", false).await.unwrap();
        assert_eq!(written, 0);
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_scrape_does_not_create_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("history.csv"));

        let written = scrape_into_store(&FixedSource(Ok(Vec::new())), &store, "2024-08-01", false)
            .await
            .unwrap();
        assert_eq!(written, 0);
        assert!(!store.path().exists());
    }
}
