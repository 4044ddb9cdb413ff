//! Process configuration, resolved once at startup and immutable afterwards.
//!
//! Several settings accept two environment variable names (the first
//! non-empty one wins) to stay compatible with older deployments.

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_TABLE: &str = "accounts";
pub const DEFAULT_CSV_PATH: &str = "db/accounts.csv";
pub const DEFAULT_CSV_KEY_COLUMN: &str = "account";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: Option<String>,
    pub api_base: String,
    pub database_url: Option<String>,
    /// Whether the database backend is consulted before the CSV fallback.
    pub use_database: bool,
    pub table: String,
    pub search_column: String,
    pub csv_path: String,
    pub csv_key_column: String,
    pub bind: String,
    pub commit: CommitInfo,
}

/// Deployment metadata surfaced read-only on the status page.
#[derive(Debug, Clone, Default)]
pub struct CommitInfo {
    pub sha: Option<String>,
    pub message: Option<String>,
    pub branch: Option<String>,
    pub env: Option<String>,
}

impl CommitInfo {
    /// First seven characters of the commit sha, when present.
    pub fn short_sha(&self) -> Option<String> {
        self.sha
            .as_deref()
            .map(|sha| sha.get(..7).unwrap_or(sha).to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.sha.is_none() && self.message.is_none() && self.branch.is_none() && self.env.is_none()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary key/value source; `from_env` is the
    /// production caller, tests pass a map.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| -> Option<String> {
            names
                .iter()
                .find_map(|&name| get(name).filter(|v| !v.is_empty()))
        };

        let csv_key_column =
            first(&["CSV_KEY_COLUMN"]).unwrap_or_else(|| DEFAULT_CSV_KEY_COLUMN.into());

        Self {
            bot_token: first(&["TELEGRAM_BOT_TOKEN", "BOT_TOKEN"]),
            api_base: first(&["TELEGRAM_API_BASE"]).unwrap_or_else(|| DEFAULT_API_BASE.into()),
            database_url: first(&["DATABASE_URL", "SUPABASE_DB_URL"]),
            use_database: first(&["FEATURE_USE_SUPABASE"])
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
            table: first(&["SUPABASE_TABLE_NAME"]).unwrap_or_else(|| DEFAULT_TABLE.into()),
            search_column: first(&["SUPABASE_SEARCH_COLUMN"])
                .unwrap_or_else(|| csv_key_column.clone()),
            csv_path: first(&["CSV_FILE_PATH"]).unwrap_or_else(|| DEFAULT_CSV_PATH.into()),
            csv_key_column,
            bind: first(&["BIND"]).unwrap_or_else(|| DEFAULT_BIND.into()),
            commit: CommitInfo {
                sha: first(&["VERCEL_GIT_COMMIT_SHA", "GIT_COMMIT_SHA"]),
                message: first(&["VERCEL_GIT_COMMIT_MESSAGE", "GIT_COMMIT_MESSAGE"]),
                branch: first(&["VERCEL_GIT_COMMIT_REF", "GIT_BRANCH"]),
                env: first(&["VERCEL_ENV", "DEPLOY_ENV"]),
            },
        }
    }
}

impl Default for Config {
    /// An unconfigured instance: no token, no database, built-in defaults.
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
