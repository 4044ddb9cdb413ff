//! CSV fallback backend: the configured file is read into memory once per
//! process and scanned linearly. Sized for moderate reference data.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::record::Record;
use crate::resolve::SourceOutcome;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("key column {column:?} not in csv header (columns: {available:?})")]
    MissingKeyColumn {
        column: String,
        available: Vec<String>,
    },
}

pub struct CsvBackend {
    path: PathBuf,
    key_column: String,
    // Memoizes the load result; a failed load stays None for the process
    // lifetime, unlike the db pool which retries while uncached.
    table: OnceCell<Option<CsvTable>>,
}

impl CsvBackend {
    pub fn new(path: impl Into<PathBuf>, key_column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key_column: key_column.into(),
            table: OnceCell::new(),
        }
    }

    pub async fn lookup(&self, query: &str) -> SourceOutcome {
        let Some(table) = self.table().await else {
            return SourceOutcome::Unavailable;
        };
        match table.find(query) {
            Some(record) => SourceOutcome::Hit(record),
            None => SourceOutcome::Miss,
        }
    }

    async fn table(&self) -> Option<&CsvTable> {
        self.table
            .get_or_init(|| async {
                match load_table(&self.path, &self.key_column) {
                    Ok(table) => Some(table),
                    Err(err) => {
                        tracing::warn!(
                            path = %self.path.display(),
                            error = %err,
                            "csv load failed"
                        );
                        None
                    }
                }
            })
            .await
            .as_ref()
    }
}

pub struct CsvTable {
    headers: Vec<String>,
    key_index: usize,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// First row whose key cell contains the query as a substring.
    fn find(&self, query: &str) -> Option<Record> {
        let row = self.rows.iter().find(|row| {
            row.get(self.key_index)
                .is_some_and(|cell| cell.contains(query))
        })?;
        let mut record = Record::new();
        for (header, cell) in self.headers.iter().zip(row) {
            record.push(header.clone(), Value::String(cell.clone()));
        }
        Some(record)
    }
}

fn load_table(path: &Path, key_column: &str) -> Result<CsvTable, LoadError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    // Source files are commonly written utf-8-sig; drop the BOM from the
    // first header so the key column matches.
    if let Some(first) = headers.first_mut() {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }
    let key_index = headers
        .iter()
        .position(|h| h == key_column)
        .ok_or_else(|| LoadError::MissingKeyColumn {
            column: key_column.to_string(),
            available: headers.clone(),
        })?;

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        rows.push(row.iter().map(str::to_string).collect());
    }
    Ok(CsvTable {
        headers,
        key_index,
        rows,
    })
}
