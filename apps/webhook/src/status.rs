//! Status endpoint: configuration flags, a live connectivity probe, and
//! deployment metadata, as JSON or a small HTML page for browsers.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
    response::{Html, IntoResponse, Response},
};
use lookbot_core::ReplySender;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub(crate) struct StatusReport {
    status: &'static str,
    bot_configured: bool,
    db_configured: bool,
    /// The Postgres driver is linked into this build; the field is kept for
    /// wire compatibility with earlier deployments.
    db_driver_available: bool,
    db_ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    db_error: Option<String>,
    csv_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit: Option<CommitReport>,
}

#[derive(Debug, Serialize)]
struct CommitReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    env: Option<String>,
}

pub(crate) async fn status_page<S>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Response
where
    S: ReplySender + 'static,
{
    let report = build_report(&state).await;
    if prefers_html(&headers) {
        Html(render_html(&report)).into_response()
    } else {
        Json(report).into_response()
    }
}

async fn build_report<S>(state: &AppState<S>) -> StatusReport {
    let db = state.lookup.db();
    let db_configured = db.configured();
    // No URL configured means no connectivity attempt at all.
    let (db_ok, db_error) = if db_configured {
        match db.ping().await {
            Ok(()) => (true, None),
            Err(err) => (false, Some(err)),
        }
    } else {
        (false, None)
    };

    let commit = &state.config.commit;
    StatusReport {
        status: "ok",
        bot_configured: state.config.bot_token.is_some(),
        db_configured,
        db_driver_available: true,
        db_ok,
        db_error,
        csv_configured: !state.config.csv_path.is_empty(),
        commit: (!commit.is_empty()).then(|| CommitReport {
            sha: commit.short_sha(),
            message: commit.message.clone(),
            branch: commit.branch.clone(),
            env: commit.env.clone(),
        }),
    }
}

fn prefers_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

fn render_html(report: &StatusReport) -> String {
    let mut rows = vec![
        html_row("bot_configured", &report.bot_configured.to_string()),
        html_row("db_configured", &report.db_configured.to_string()),
        html_row(
            "db_driver_available",
            &report.db_driver_available.to_string(),
        ),
        html_row("db_ok", &report.db_ok.to_string()),
        html_row("csv_configured", &report.csv_configured.to_string()),
    ];
    if let Some(error) = &report.db_error {
        rows.push(html_row("db_error", error));
    }
    if let Some(commit) = &report.commit {
        if let Some(sha) = &commit.sha {
            rows.push(html_row("commit", sha));
        }
        if let Some(branch) = &commit.branch {
            rows.push(html_row("branch", branch));
        }
        if let Some(env) = &commit.env {
            rows.push(html_row("env", env));
        }
    }
    format!(
        "<!doctype html><html><head><title>lookbot status</title></head>\
         <body><h1>status: {}</h1><table>{}</table></body></html>",
        report.status,
        rows.join("")
    )
}

fn html_row(name: &str, value: &str) -> String {
    format!("<tr><td>{name}</td><td>{}</td></tr>", escape_html(value))
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use lookbot_core::{CommitInfo, Config, LookupService};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct NoopSender;

    #[async_trait]
    impl ReplySender for NoopSender {
        async fn send(&self, _chat_id: i64, _text: &str) -> bool {
            true
        }
    }

    fn state_with(config: Config) -> AppState<NoopSender> {
        let lookup = LookupService::new(&config);
        AppState {
            config: Arc::new(config),
            lookup: Arc::new(lookup),
            sender: Arc::new(NoopSender),
        }
    }

    async fn get_status(config: Config, accept: Option<&str>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let mut request = Request::builder().method("GET").uri("/status");
        if let Some(accept) = accept {
            request = request.header("accept", accept);
        }
        let response = router(state_with(config))
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, bytes.to_vec())
    }

    #[tokio::test]
    async fn unconfigured_database_skips_the_probe() {
        let (status, _, body) = get_status(Config::default(), None).await;
        assert_eq!(status, StatusCode::OK);
        let report: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(report["status"], "ok");
        assert_eq!(report["db_configured"], false);
        assert_eq!(report["db_ok"], false);
        assert_eq!(report["db_driver_available"], true);
        assert_eq!(report["bot_configured"], false);
        assert!(report.get("db_error").is_none());
        assert!(report.get("commit").is_none());
    }

    #[tokio::test]
    async fn unreachable_database_reports_probe_failure() {
        // Configured URL, nothing listening: the probe error must show up
        // as a display string while the page itself stays 200/ok.
        let config = Config {
            database_url: Some("postgres://127.0.0.1:1/x".into()),
            ..Config::default()
        };
        let (status, _, body) = get_status(config, None).await;
        assert_eq!(status, StatusCode::OK);
        let report: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(report["status"], "ok");
        assert_eq!(report["db_configured"], true);
        assert_eq!(report["db_ok"], false);
        assert!(
            report["db_error"]
                .as_str()
                .is_some_and(|err| !err.is_empty())
        );
    }

    #[tokio::test]
    async fn token_and_commit_metadata_are_reported() {
        let config = Config {
            bot_token: Some("token".into()),
            commit: CommitInfo {
                sha: Some("0123456789ab".into()),
                branch: Some("main".into()),
                ..CommitInfo::default()
            },
            ..Config::default()
        };
        let (_, _, body) = get_status(config, None).await;
        let report: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(report["bot_configured"], true);
        assert_eq!(report["commit"]["sha"], "0123456");
        assert_eq!(report["commit"]["branch"], "main");
        assert!(report["commit"].get("message").is_none());
    }

    #[tokio::test]
    async fn browsers_get_an_html_page() {
        let (status, headers, body) =
            get_status(Config::default(), Some("text/html,application/xhtml+xml")).await;
        assert_eq!(status, StatusCode::OK);
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(content_type.starts_with("text/html"));
        let page = String::from_utf8(body).unwrap();
        assert!(page.contains("db_ok"));
        assert!(page.contains("status: ok"));
    }

    #[tokio::test]
    async fn status_is_also_mounted_at_root() {
        let response = router(state_with(Config::default()))
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn html_escapes_probe_errors() {
        let row = html_row("db_error", "<script>alert(1)</script>");
        assert!(!row.contains("<script>"));
        assert!(row.contains("&lt;script&gt;"));
    }
}
