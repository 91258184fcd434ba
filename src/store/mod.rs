pub mod synthetic;

pub use synthetic::generate_sessions;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{PredictorError, PredictorResult};
use crate::types::{column_index, SessionRecord, RECORD_COLUMNS};

struct TableLayout {
    columns: Vec<Option<usize>>,
    ends_with_newline: bool,
}

/// CSV-backed session record table.
///
/// Single-process, single-operator: there is no locking, and a rewrite that
/// races a read is undefined.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append_record(&self, record: &SessionRecord) -> PredictorResult<()> {
        self.append_all(std::slice::from_ref(record)).map(|_| ())
    }

    /// Append rows, writing the header first when the table is new or empty.
    /// An existing table keeps its own header, so rows are laid out in that
    /// header's column order.
    pub fn append_all(&self, records: &[SessionRecord]) -> PredictorResult<usize> {
        self.ensure_parent_dir()?;
        let layout = self.existing_layout()?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        match layout {
            None => {
                let mut writer = csv::Writer::from_writer(file);
                for record in records {
                    writer.serialize(record)?;
                }
                writer.flush()?;
            }
            Some(layout) => {
                if !layout.ends_with_newline {
                    file.write_all(b"\n")?;
                }
                let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
                for record in records {
                    let values = record.to_row();
                    writer.write_record(
                        layout
                            .columns
                            .iter()
                            .map(|column| column.map_or("", |i| values[i].as_str())),
                    )?;
                }
                writer.flush()?;
            }
        }

        debug!("Appended {} records to {}", records.len(), self.path.display());
        Ok(records.len())
    }

    /// Header layout of a non-empty table: for each column, its position in
    /// `RECORD_COLUMNS` (`None` for columns this table does not know)
    fn existing_layout(&self) -> PredictorResult<Option<TableLayout>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let bytes = std::fs::read(&self.path)?;
        if bytes.is_empty() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let columns: Vec<Option<usize>> = reader.headers()?.iter().map(column_index).collect();
        if let Some(missing) = (0..RECORD_COLUMNS.len()).find(|i| !columns.contains(&Some(*i))) {
            return Err(PredictorError::schema(
                RECORD_COLUMNS[missing],
                format!("column missing from existing table {}", self.path.display()),
            ));
        }

        Ok(Some(TableLayout {
            columns,
            ends_with_newline: bytes.last() == Some(&b'\n'),
        }))
    }

    /// Replace the whole table
    pub fn rewrite_all(&self, records: &[SessionRecord]) -> PredictorResult<usize> {
        self.ensure_parent_dir()?;
        let mut writer = csv::Writer::from_path(&self.path)?;
        if records.is_empty() {
            writer.write_record(RECORD_COLUMNS)?;
        }
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        info!("Rewrote {} with {} records", self.path.display(), records.len());
        Ok(records.len())
    }

    /// All records in file order. Malformed rows are skipped with a warning;
    /// a missing, empty or column-incomplete table is `DataUnavailable`.
    pub fn read_all(&self) -> PredictorResult<Vec<SessionRecord>> {
        if !self.path.is_file() {
            return Err(PredictorError::DataUnavailable(format!(
                "no record table at {}",
                self.path.display()
            )));
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        let missing: Vec<&str> = RECORD_COLUMNS
            .iter()
            .enumerate()
            .filter(|(i, _)| !headers.iter().any(|h| column_index(h) == Some(*i)))
            .map(|(_, name)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(PredictorError::DataUnavailable(format!(
                "record table {} is missing columns: {}",
                self.path.display(),
                missing.join(", ")
            )));
        }

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (line, row) in reader.deserialize::<SessionRecord>().enumerate() {
            match row {
                Ok(record) if record.burst_index.is_finite() => records.push(record),
                Ok(_) => {
                    skipped += 1;
                    warn!("Skipping row {}: burst_index is not finite", line + 2);
                }
                Err(e) => {
                    skipped += 1;
                    warn!("Skipping malformed row {}: {}", line + 2, e);
                }
            }
        }

        if records.is_empty() {
            return Err(PredictorError::DataUnavailable(format!(
                "record table {} has no usable rows",
                self.path.display()
            )));
        }

        debug!(
            "Read {} records from {} ({} skipped)",
            records.len(),
            self.path.display(),
            skipped
        );
        Ok(records)
    }

    /// Records sorted by date, ties kept in file order
    pub fn read_chronological(&self) -> PredictorResult<Vec<SessionRecord>> {
        let mut records = self.read_all()?;
        records.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(records)
    }

    fn ensure_parent_dir(&self) -> PredictorResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, RecordStore) {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path().join("data/history.csv"));
        (dir, store)
    }

    #[test]
    fn test_missing_table_is_unavailable() {
        let (_dir, store) = store();
        assert!(matches!(store.read_all(), Err(PredictorError::DataUnavailable(_))));
    }

    #[test]
    fn test_append_then_read_in_order() {
        let (_dir, store) = store();
        store.append_record(&SessionRecord::new("2024-03-01", 40, false, true, false)).unwrap();
        store.append_record(&SessionRecord::new("2024-03-02", 90, true, false, true)).unwrap();

        let records = store.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, "2024-03-01");
        assert_eq!(records[1].play_count, 90);
        assert!(records[1].jackpot);

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.lines().next().unwrap(), RECORD_COLUMNS.join(","));
        assert_eq!(text.lines().filter(|l| l.starts_with("date")).count(), 1);
    }

    #[test]
    fn test_rewrite_replaces_contents() {
        let (_dir, store) = store();
        store.append_record(&SessionRecord::new("2024-03-01", 40, false, true, false)).unwrap();
        store
            .rewrite_all(&[SessionRecord::new("2024-04-01", 55, true, true, false)])
            .unwrap();

        let records = store.read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, "2024-04-01");
    }

    #[test]
    fn test_empty_rewrite_leaves_header_only() {
        let (_dir, store) = store();
        store.rewrite_all(&[]).unwrap();
        assert!(matches!(store.read_all(), Err(PredictorError::DataUnavailable(_))));
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.trim(), RECORD_COLUMNS.join(","));
    }

    #[test]
    fn test_skips_malformed_rows() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            "date,play_count,jackpot,small_hit,free_game_triggered,burst_index\n\
             2024-03-01,40,0,1,0,12.0\n\
             2024-03-02,lots,0,1,0,12.0\n\
             2024-03-03,60,1,0,1,53.0\n",
        )
        .unwrap();

        let records = store.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].date, "2024-03-03");
    }

    #[test]
    fn test_missing_columns_is_unavailable() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "date,play_count\n2024-03-01,40\n").unwrap();
        match store.read_all() {
            Err(PredictorError::DataUnavailable(msg)) => assert!(msg.contains("jackpot")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_legacy_table_with_non_ascii_headers() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "日期,局數,爆金,小分,免費遊戲,爆發指數\n2024-03-05,77,1,1,1,63.85\n").unwrap();
        store.append_record(&SessionRecord::new("2024-03-06", 30, false, false, false)).unwrap();

        let records = store.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].jackpot);
        assert_eq!(records[1].burst_index, 1.5);
    }

    #[test]
    fn test_append_follows_existing_column_order() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "日期,局數,免費遊戲,小分,爆金,爆發指數\n2024-03-05,77,1,0,0,53.85\n").unwrap();

        store.append_record(&SessionRecord::new("2024-03-06", 30, false, false, true)).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.lines().nth(2).unwrap(), "2024-03-06,30,0,0,1,1.5");

        let records = store.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].free_game_triggered && !records[0].jackpot);
        assert!(records[1].jackpot && !records[1].free_game_triggered);
    }

    #[test]
    fn test_append_after_unterminated_last_row() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            "burst_index,date,jackpot,play_count,small_hit,free_game_triggered,notes\n53.85,2024-03-05,0,77,0,1,first",
        )
        .unwrap();

        store.append_record(&SessionRecord::new("2024-03-06", 30, false, true, true)).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.lines().nth(2).unwrap(), "11.5,2024-03-06,1,30,1,0,");
        let records = store.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], SessionRecord::new("2024-03-05", 77, true, false, false));
        assert_eq!(records[1], SessionRecord::new("2024-03-06", 30, false, true, true));
    }

    #[test]
    fn test_append_rejects_table_missing_columns() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "date,play_count\n2024-03-01,40\n").unwrap();

        let err = store
            .append_record(&SessionRecord::new("2024-03-06", 30, false, false, true))
            .unwrap_err();
        assert_eq!(err.kind(), "schema");
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "date,play_count\n2024-03-01,40\n");
    }

    #[test]
    fn test_chronological_sort_is_stable() {
        let (_dir, store) = store();
        store
            .rewrite_all(&[
                SessionRecord::new("2024-03-02", 10, false, false, false),
                SessionRecord::new("2024-03-01", 20, false, false, false),
                SessionRecord::new("2024-03-02", 30, false, false, false),
            ])
            .unwrap();
        let records = store.read_chronological().unwrap();
        let plays: Vec<u32> = records.iter().map(|r| r.play_count).collect();
        assert_eq!(plays, vec![20, 10, 30]);
    }
}
