//! HTTP dashboard for a running bench.
//!
//! Serves an embedded HTML page plus the JSON and SSE endpoints it reads.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use poll_mock::BallotBox;
use serde_json::Value;
use tokio::sync::Notify;
use tower_http::cors::{Any, CorsLayer};

use crate::events::EventBus;
use crate::ledger::Ledger;

const DEFAULT_LOG_LIMIT: usize = 200;

/// State shared by dashboard handlers.
pub struct DashboardState {
    pub started_at: Instant,
    pub ledger: Arc<Ledger>,
    pub bus: EventBus,
    /// The in-process service under test, if any, for live tallies.
    pub ballots: Option<(u32, Arc<BallotBox>)>,
}

/// Build the axum Router with all dashboard endpoints.
pub fn router(state: Arc<DashboardState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/dashboard", get(dashboard))
        .route("/api/v1/status", get(handle_status))
        .route("/api/v1/events", get(events_sse))
        .layer(cors)
        .with_state(state)
}

/// Serve the dashboard on `127.0.0.1:port` until `shutdown` is notified.
pub async fn serve(
    port: u16,
    state: Arc<DashboardState>,
    shutdown: Arc<Notify>,
) -> anyhow::Result<()> {
    let app = router(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("dashboard on http://{}/dashboard", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn dashboard() -> impl IntoResponse {
    Html(include_str!("dashboard.html"))
}

#[derive(serde::Deserialize, Default)]
struct StatusParams {
    limit: Option<usize>,
}

/// Counters, newest log entries and, when available, the service's tally.
async fn handle_status(
    Query(params): Query<StatusParams>,
    State(state): State<Arc<DashboardState>>,
) -> Json<Value> {
    let snapshot = state.ledger.snapshot(params.limit.unwrap_or(DEFAULT_LOG_LIMIT));
    let mut body = serde_json::to_value(&snapshot).unwrap_or_else(|_| serde_json::json!({}));

    if let Some(obj) = body.as_object_mut() {
        obj.insert(
            "uptimeSeconds".into(),
            state.started_at.elapsed().as_secs_f64().into(),
        );
        if let Some((poll_id, ballots)) = &state.ballots {
            let tally = ballots
                .tally(*poll_id)
                .await
                .ok()
                .and_then(|t| serde_json::to_value(t).ok())
                .unwrap_or(Value::Null);
            obj.insert("tally".into(), tally);
        }
    }
    Json(body)
}

/// Server-Sent Events stream of bench events.
async fn events_sse(
    State(state): State<Arc<DashboardState>>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.bus.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Ok(json) = serde_json::to_string(&event) {
                        yield Ok(Event::default().data(json));
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("SSE subscriber lagged by {skipped} events");
                    continue;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
