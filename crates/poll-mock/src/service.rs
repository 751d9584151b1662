//! HTTP front of the ballot box.
//!
//! Routes mirror a typical poll API: a status lookup, a vote endpoint and
//! a tally endpoint. The server only ever binds to `127.0.0.1`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::ballot::{Ballot, Rejection, StatusQuery, StatusResponse, TallyQuery, VoteReceipt};
use crate::store::{BallotBox, CastError};

/// Settings for a mock server instance.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Port on 127.0.0.1. Zero picks an ephemeral port.
    pub port: u16,
    /// Polls and their candidate ids.
    pub polls: Vec<(u32, Vec<u32>)>,
    pub max_votes_per_sec: Option<u32>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            port: 0,
            polls: vec![(1, vec![1, 2])],
            max_votes_per_sec: None,
        }
    }
}

impl IntoResponse for CastError {
    fn into_response(self) -> Response {
        let status = match &self {
            CastError::UnknownPoll(_) => StatusCode::NOT_FOUND,
            CastError::AlreadyVoted(_) => StatusCode::CONFLICT,
            CastError::UnknownCandidate { .. } | CastError::InvalidVoter(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CastError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        };
        (status, Json(Rejection::new(self.to_string()))).into_response()
    }
}

/// Build the axum router over a shared ballot box.
pub fn router(ballots: Arc<BallotBox>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/votes", post(cast_vote))
        .route("/api/votes/status", get(vote_status))
        .route("/api/votes/tally", get(vote_tally))
        .with_state(ballots)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn vote_status(
    State(ballots): State<Arc<BallotBox>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, CastError> {
    let already_voted = ballots.status(query.poll_id, &query.voter_id).await?;
    Ok(Json(StatusResponse { already_voted }))
}

async fn cast_vote(
    State(ballots): State<Arc<BallotBox>>,
    Json(ballot): Json<Ballot>,
) -> Result<(StatusCode, Json<VoteReceipt>), CastError> {
    let tally = ballots.cast(&ballot).await.inspect_err(|e| {
        debug!(voter = %ballot.voter_id, "vote refused: {e}");
    })?;
    Ok((
        StatusCode::CREATED,
        Json(VoteReceipt {
            accepted: true,
            receipt: uuid::Uuid::new_v4().to_string(),
            poll_id: ballot.poll_id,
            competitor_id: ballot.competitor_id,
            tally,
        }),
    ))
}

async fn vote_tally(
    State(ballots): State<Arc<BallotBox>>,
    Query(query): Query<TallyQuery>,
) -> Result<impl IntoResponse, CastError> {
    Ok(Json(ballots.tally(query.poll_id).await?))
}

/// A running mock server.
pub struct MockServer {
    addr: SocketAddr,
    ballots: Arc<BallotBox>,
    shutdown: Arc<Notify>,
    task: JoinHandle<std::io::Result<()>>,
}

impl MockServer {
    /// Bind on loopback and start serving in a background task.
    pub async fn spawn(config: MockConfig) -> std::io::Result<Self> {
        let ballots = Arc::new(
            BallotBox::new(config.polls).with_rate_limit(config.max_votes_per_sec),
        );
        let listener =
            tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], config.port)))
                .await?;
        let addr = listener.local_addr()?;
        info!("mock poll service listening on http://{addr}");

        let shutdown = Arc::new(Notify::new());
        let signal = Arc::clone(&shutdown);
        let app = router(Arc::clone(&ballots));
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.notified().await })
                .await
        });

        Ok(Self {
            addr,
            ballots,
            shutdown,
            task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Direct access to the store, e.g. for reading tallies in-process.
    pub fn ballots(&self) -> Arc<BallotBox> {
        Arc::clone(&self.ballots)
    }

    /// Stop accepting connections and wait for the server task.
    pub async fn shutdown(self) -> std::io::Result<()> {
        self.shutdown.notify_one();
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(std::io::Error::other(e)),
        }
    }
}
