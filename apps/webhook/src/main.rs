//! Telegram webhook receiver: looks up inbound text against the configured
//! record sources and replies with the matched remark.
//!
//! ```text
//! POST /webhook   Telegram update; one lookup, one best-effort reply
//! GET  /status    configuration flags + live db probe (also mounted at /)
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use lookbot_core::{Config, LookupService, ReplySender, TelegramNotifier};

mod handler;
mod status;

pub(crate) struct AppState<S> {
    config: Arc<Config>,
    lookup: Arc<LookupService>,
    sender: Arc<S>,
}

// Manual impl: the derive would demand S: Clone, but the Arc is enough.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            lookup: self.lookup.clone(),
            sender: self.sender.clone(),
        }
    }
}

pub(crate) fn router<S>(state: AppState<S>) -> Router
where
    S: ReplySender + 'static,
{
    Router::new()
        .route("/webhook", post(handler::handle_update::<S>))
        .route("/status", get(status::status_page::<S>))
        .route("/", get(status::status_page::<S>))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let config = Config::from_env();
    let lookup = LookupService::new(&config);
    let sender = TelegramNotifier::new(
        reqwest::Client::new(),
        config.api_base.clone(),
        config.bot_token.clone(),
    );
    let state = AppState {
        config: Arc::new(config),
        lookup: Arc::new(lookup),
        sender: Arc::new(sender),
    };

    let addr: SocketAddr = state.config.bind.parse()?;
    tracing::info!("lookbot-webhook listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
