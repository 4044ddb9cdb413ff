//! Postgres backend: a lazily created, memoized pool and the single ILIKE
//! lookup it serves. Every failure here is soft; callers see `Unavailable`,
//! never an error.

use std::time::Duration;

use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Row};
use tokio::sync::OnceCell;

use crate::ident::safe_ident;
use crate::record::Record;
use crate::resolve::SourceOutcome;

const FALLBACK_TABLE: &str = "accounts";
const FALLBACK_COLUMN: &str = "account";
const POOL_MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);
const PING_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DbBackend {
    url: Option<String>,
    table: String,
    column: String,
    pool: OnceCell<PgPool>,
}

impl DbBackend {
    /// `table` and `column` are validated here; unsafe identifiers are
    /// replaced with the hardcoded fallbacks before any SQL is built.
    pub fn new(url: Option<String>, table: &str, column: &str) -> Self {
        Self {
            url: url
                .filter(|u| !u.is_empty())
                .map(|u| ensure_sslmode(&u)),
            table: safe_ident(table, FALLBACK_TABLE).to_string(),
            column: safe_ident(column, FALLBACK_COLUMN).to_string(),
            pool: OnceCell::new(),
        }
    }

    pub fn configured(&self) -> bool {
        self.url.is_some()
    }

    /// Memoized on success only: a failed construction is reported as
    /// unavailable and retried on the next call.
    async fn pool(&self) -> Option<&PgPool> {
        let url = self.url.as_deref()?;
        let created = self
            .pool
            .get_or_try_init(|| async {
                PgPoolOptions::new()
                    .max_connections(POOL_MAX_CONNECTIONS)
                    .acquire_timeout(ACQUIRE_TIMEOUT)
                    .connect_lazy(url)
            })
            .await;
        match created {
            Ok(pool) => Some(pool),
            Err(err) => {
                tracing::warn!(error = %err, "db pool construction failed");
                None
            }
        }
    }

    /// Case-insensitive substring match on the configured column, one row.
    pub async fn query_first(&self, query: &str) -> SourceOutcome {
        let Some(pool) = self.pool().await else {
            return SourceOutcome::Unavailable;
        };
        let sql = format!(
            "SELECT remarks, account_byte_length, account, account_hash \
             FROM \"{}\" WHERE \"{}\" ILIKE $1 LIMIT 1",
            self.table, self.column
        );
        let pattern = format!("%{query}%");
        match sqlx::query(&sql).bind(&pattern).fetch_optional(pool).await {
            Ok(Some(row)) => SourceOutcome::Hit(row_to_record(&row)),
            Ok(None) => SourceOutcome::Miss,
            Err(err) => {
                tracing::warn!(error = %err, "db query failed");
                SourceOutcome::Unavailable
            }
        }
    }

    /// One-shot connectivity probe for the status page. The error is
    /// rendered to a display string, never propagated.
    pub async fn ping(&self) -> Result<(), String> {
        let Some(pool) = self.pool().await else {
            return Err("database pool unavailable".into());
        };
        match tokio::time::timeout(PING_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err(format!("ping timed out after {}s", PING_TIMEOUT.as_secs())),
        }
    }
}

/// Appends `sslmode=require` unless the URL already pins an sslmode.
pub fn ensure_sslmode(url: &str) -> String {
    if url.contains("sslmode=") {
        return url.to_string();
    }
    if url.contains('?') {
        format!("{url}&sslmode=require")
    } else {
        format!("{url}?sslmode=require")
    }
}

fn row_to_record(row: &PgRow) -> Record {
    let mut record = Record::new();
    for (i, column) in row.columns().iter().enumerate() {
        record.push(column.name(), column_value(row, i));
    }
    record
}

fn column_value(row: &PgRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v
            .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    Value::Null
}
