//! The fallback chain: database first (when enabled), then the CSV table,
//! then a fixed not-found message. Always returns a displayable string.

use crate::config::Config;
use crate::csv_table::CsvBackend;
use crate::db::DbBackend;
use crate::record::{PreviewLimit, Record, format_reply};

const DB_PREVIEW_FIELDS: usize = 20;
const CSV_PREVIEW_CHARS: usize = 600;

/// What one backend had to say about a query. `Unavailable` covers every
/// soft failure (no driver handle, query error, unreadable file); callers
/// treat it exactly like `Miss` and fall through to the next source.
#[derive(Debug)]
pub enum SourceOutcome {
    Hit(Record),
    Miss,
    Unavailable,
}

/// Long-lived lookup state: the memoized pool and CSV table live here for
/// the process lifetime.
pub struct LookupService {
    db: DbBackend,
    csv: CsvBackend,
    use_database: bool,
}

impl LookupService {
    pub fn new(config: &Config) -> Self {
        Self {
            db: DbBackend::new(
                config.database_url.clone(),
                &config.table,
                &config.search_column,
            ),
            csv: CsvBackend::new(&config.csv_path, &config.csv_key_column),
            use_database: config.use_database,
        }
    }

    pub fn db(&self) -> &DbBackend {
        &self.db
    }

    /// Resolves a non-empty, trimmed query to a reply message. Never fails;
    /// backend trouble degrades to the next source in the chain.
    pub async fn resolve(&self, query: &str) -> String {
        if self.use_database {
            match self.db.query_first(query).await {
                SourceOutcome::Hit(record) => {
                    return format_reply(&record, PreviewLimit::Fields(DB_PREVIEW_FIELDS));
                }
                SourceOutcome::Miss | SourceOutcome::Unavailable => {}
            }
        }

        match self.csv.lookup(query).await {
            SourceOutcome::Hit(record) => {
                format_reply(&record, PreviewLimit::Chars(CSV_PREVIEW_CHARS))
            }
            SourceOutcome::Miss | SourceOutcome::Unavailable => {
                format!("未找到记录：{query}")
            }
        }
    }
}
