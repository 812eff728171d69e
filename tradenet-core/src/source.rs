// Trade record sources: the boundary where files become records

use crate::error::{Result, TradeError};
use crate::record::{RawTradeRecord, TradeRecord};
use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const DEFAULT_PERIOD_A_COLUMN: &str = "2019";
pub const DEFAULT_PERIOD_B_COLUMN: &str = "2020";

/// Records produced by a source, plus how many incomplete rows were dropped
/// before validation.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub records: Vec<TradeRecord>,
    pub dropped: usize,
}

pub trait TradeRecordSource {
    fn load(&self) -> Result<SourceBatch>;
}

impl TradeRecordSource for Vec<TradeRecord> {
    fn load(&self) -> Result<SourceBatch> {
        Ok(SourceBatch {
            records: self.clone(),
            dropped: 0,
        })
    }
}

/// Reads a headered CSV with one row per ordered country pair.
#[derive(Debug, Clone)]
pub struct CsvTradeSource {
    path: PathBuf,
    period_a_column: String,
    period_b_column: String,
}

struct ColumnMap {
    from_code: usize,
    from_name: usize,
    to_code: usize,
    to_name: usize,
    volume_a: usize,
    volume_b: usize,
}

impl CsvTradeSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            period_a_column: DEFAULT_PERIOD_A_COLUMN.to_string(),
            period_b_column: DEFAULT_PERIOD_B_COLUMN.to_string(),
        }
    }

    pub fn with_period_columns(mut self, period_a: &str, period_b: &str) -> Self {
        self.period_a_column = period_a.to_string();
        self.period_b_column = period_b.to_string();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_from<R: Read>(&self, reader: R) -> Result<SourceBatch> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns = self.locate_columns(reader.headers()?)?;

        let mut records = Vec::new();
        let mut dropped = 0;

        for (idx, row) in reader.records().enumerate() {
            let row = row?;
            let raw = RawTradeRecord {
                from_code: field(&row, columns.from_code),
                from_name: field(&row, columns.from_name),
                to_code: field(&row, columns.to_code),
                to_name: field(&row, columns.to_name),
                volume_a: field(&row, columns.volume_a),
                volume_b: field(&row, columns.volume_b),
            };

            if !raw.is_complete() {
                dropped += 1;
                continue;
            }

            records.push(TradeRecord::try_from_raw(idx + 1, &raw)?);
        }

        Ok(SourceBatch { records, dropped })
    }

    fn locate_columns(&self, headers: &StringRecord) -> Result<ColumnMap> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| TradeError::schema(0, format!("missing column '{}'", name)))
        };

        Ok(ColumnMap {
            from_code: find("from_code")?,
            from_name: find("from_name")?,
            to_code: find("to_code")?,
            to_name: find("to_name")?,
            volume_a: find(&self.period_a_column)?,
            volume_b: find(&self.period_b_column)?,
        })
    }
}

impl TradeRecordSource for CsvTradeSource {
    fn load(&self) -> Result<SourceBatch> {
        let file = File::open(&self.path)?;
        self.read_from(file)
    }
}

fn field(row: &StringRecord, idx: usize) -> Option<String> {
    row.get(idx).map(|v| v.trim().to_string())
}

/// Stable SHA-256 over the record sequence, used to key cached ranks.
pub fn fingerprint(records: &[TradeRecord]) -> String {
    let mut hasher = Sha256::new();
    for record in records {
        for text in [
            &record.from_code,
            &record.from_name,
            &record.to_code,
            &record.to_name,
        ] {
            hasher.update(text.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update(record.volume_a.to_bits().to_le_bytes());
        hasher.update(record.volume_b.to_bits().to_le_bytes());
        hasher.update([0x1e]);
    }
    hex::encode(hasher.finalize())
}
