// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The HTTP surface: a Prometheus scrape endpoint and a small status page.

use crate::exporter::MetricsSource;
use axum::extract::State as AxumState;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use zackup_core::{HostMetrics, JobStatus};

#[derive(Clone)]
pub struct HttpState {
    source: Arc<dyn MetricsSource>,
    registry: Arc<Registry>,
}

/// Build the router: `GET /-/metrics` for scraping, `GET /` for humans.
pub fn router(source: Arc<dyn MetricsSource>, registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/-/metrics", get(metrics))
        .route("/", get(index))
        .with_state(HttpState { source, registry })
}

/// Serve until `shutdown` completes, then drain in-flight requests.
pub async fn serve(
    listen: &str,
    router: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!(listen, "http server listening");
    axum::serve(listener, router).with_graceful_shutdown(shutdown).await
}

async fn metrics(AxumState(state): AxumState<HttpState>) -> impl IntoResponse {
    let mut buffer = String::new();
    if let Err(error) = encode(&mut buffer, &state.registry) {
        tracing::error!(%error, "failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "encoding error").into_response();
    }

    (
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        buffer,
    )
        .into_response()
}

async fn index(AxumState(state): AxumState<HttpState>) -> Html<String> {
    Html(render_index(&state.source.export()))
}

/// Minimal status overview. The fancy template lives outside this crate;
/// this renders the same data as a plain table.
fn render_index(hosts: &[HostMetrics]) -> String {
    let mut rows = String::new();
    for m in hosts {
        let status = m.status();
        let last_success = m
            .succeeded_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "n/a".to_string());
        let duration = m
            .success_duration
            .map(|d| format!("{:.1}s", d.as_secs_f64()))
            .unwrap_or_else(|| "n/a".to_string());

        rows.push_str(&format!(
            "<tr class=\"{class}\"><td>{host}</td><td>{status}</td><td>{last_success}</td>\
             <td>{duration}</td><td>{space}</td><td>{compression:.2}x</td></tr>\n",
            class = status_class(status),
            host = escape(&m.host),
            space = human_bytes(m.space_used_total()),
            compression = m.compression_factor,
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html><head><title>zackup</title></head><body>\n\
         <h1>zackup</h1>\n<table>\n\
         <tr><th>Host</th><th>Status</th><th>Last success</th>\
         <th>Duration</th><th>Space used</th><th>Compression</th></tr>\n\
         {rows}</table>\n</body></html>\n"
    )
}

fn status_class(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Failed => "failed",
        JobStatus::Success => "success",
        JobStatus::Running => "running",
        JobStatus::Primed | JobStatus::Unknown => "neutral",
    }
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "kB", "MB", "GB", "TB", "PB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
