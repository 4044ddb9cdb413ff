//! Core library for the record-lookup Telegram bot.
//!
//! The webhook binary wires these pieces together: [`config::Config`] reads
//! the environment once, [`resolve::LookupService`] answers a query through
//! the database-then-CSV fallback chain, and [`notify::ReplySender`] is the
//! seam through which replies leave the process.

pub mod config;
pub mod csv_table;
pub mod db;
pub mod ident;
pub mod notify;
pub mod record;
pub mod resolve;

pub use config::{CommitInfo, Config};
pub use notify::{ReplySender, TelegramNotifier};
pub use record::{PreviewLimit, Record, format_reply};
pub use resolve::{LookupService, SourceOutcome};
