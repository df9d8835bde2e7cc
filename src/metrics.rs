//! Prometheus metrics HTTP server.
//!
//! Exposes watcher statistics in Prometheus text format via HTTP endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use tokio::net::TcpListener;
use tracing::info;

use crate::stats::WatchStats;

/// Start the Prometheus metrics HTTP server.
///
/// Runs in the background and serves metrics at `/metrics`.
/// Returns an error if the server fails to bind to the port.
pub async fn start_metrics_server(
    port: u16,
    stats: Arc<WatchStats>,
) -> Result<(), std::io::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(stats);

    let listener = TcpListener::bind(addr).await?;
    info!("Prometheus metrics server listening on http://{}/metrics", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))
}

/// Health check endpoint.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Prometheus metrics endpoint.
async fn metrics_handler(State(stats): State<Arc<WatchStats>>) -> impl IntoResponse {
    let output = format_prometheus_metrics(&stats);
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        output,
    )
}

/// Format statistics as Prometheus text format.
fn format_prometheus_metrics(stats: &WatchStats) -> String {
    let summary = stats.summary();
    let mut output = String::with_capacity(2048);

    output.push_str("# HELP dxwatch_uptime_seconds Time since the watcher started\n");
    output.push_str("# TYPE dxwatch_uptime_seconds gauge\n");
    output.push_str(&format!(
        "dxwatch_uptime_seconds {:.3}\n",
        summary.elapsed_secs
    ));

    output.push_str("# HELP dxwatch_lines_total Lines received from the cluster session\n");
    output.push_str("# TYPE dxwatch_lines_total counter\n");
    output.push_str(&format!("dxwatch_lines_total {}\n", summary.lines_total));

    output.push_str("# HELP dxwatch_raw_lines_total Diagnostic (non-spot) lines received\n");
    output.push_str("# TYPE dxwatch_raw_lines_total counter\n");
    output.push_str(&format!("dxwatch_raw_lines_total {}\n", summary.raw_lines));

    output.push_str("# HELP dxwatch_spots_total Structured spot lines parsed\n");
    output.push_str("# TYPE dxwatch_spots_total counter\n");
    output.push_str(&format!("dxwatch_spots_total {}\n", summary.spots_parsed));

    output.push_str("# HELP dxwatch_parse_anomalies_total Structured lines that failed to parse\n");
    output.push_str("# TYPE dxwatch_parse_anomalies_total counter\n");
    output.push_str(&format!(
        "dxwatch_parse_anomalies_total {}\n",
        summary.parse_anomalies
    ));

    output.push_str("# HELP dxwatch_matches_total Spots that matched a watched target\n");
    output.push_str("# TYPE dxwatch_matches_total counter\n");
    output.push_str(&format!("dxwatch_matches_total {}\n", summary.matches));

    output.push_str("# HELP dxwatch_suppressed_total Matched spots suppressed by the dedup window\n");
    output.push_str("# TYPE dxwatch_suppressed_total counter\n");
    output.push_str(&format!(
        "dxwatch_suppressed_total {}\n",
        summary.suppressed
    ));

    output.push_str("# HELP dxwatch_notifications_total Notification delivery attempts by result\n");
    output.push_str("# TYPE dxwatch_notifications_total counter\n");
    output.push_str(&format!(
        "dxwatch_notifications_total{{result=\"ok\"}} {}\n",
        summary.notifications_sent
    ));
    output.push_str(&format!(
        "dxwatch_notifications_total{{result=\"error\"}} {}\n",
        summary.notify_failures
    ));

    output.push_str("# HELP dxwatch_reconnects_total Cluster session reconnects\n");
    output.push_str("# TYPE dxwatch_reconnects_total counter\n");
    output.push_str(&format!("dxwatch_reconnects_total {}\n", summary.reconnects));

    output.push_str("# HELP dxwatch_bytes_processed_total Total bytes of raw input processed\n");
    output.push_str("# TYPE dxwatch_bytes_processed_total counter\n");
    output.push_str(&format!(
        "dxwatch_bytes_processed_total {}\n",
        summary.bytes_processed
    ));

    output.push_str("# HELP dxwatch_spots_by_band_total Spots broken down by amateur band\n");
    output.push_str("# TYPE dxwatch_spots_by_band_total counter\n");
    for (band, count) in &summary.spots_by_band {
        output.push_str(&format!(
            "dxwatch_spots_by_band_total{{band=\"{}\"}} {}\n",
            band, count
        ));
    }

    output.push_str("# HELP dxwatch_spots_by_mode_total Spots broken down by mode\n");
    output.push_str("# TYPE dxwatch_spots_by_mode_total counter\n");
    for (mode, count) in &summary.spots_by_mode {
        output.push_str(&format!(
            "dxwatch_spots_by_mode_total{{mode=\"{}\"}} {}\n",
            mode, count
        ));
    }

    output
}
