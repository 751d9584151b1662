//! Async HTTP client for a local poll service, wrapping reqwest.
//!
//! Only loopback addresses are accepted. One request per call, no retries.

use std::net::SocketAddr;
use std::time::Duration;

use poll_mock::{Ballot, Rejection, StatusResponse};
use serde_json::Value;

use crate::error::{BenchError, BenchResult};

/// Result of posting a ballot.
#[derive(Debug, Clone, PartialEq)]
pub enum CastOutcome {
    /// 2xx with the service's JSON body.
    Accepted(Value),
    /// Non-2xx with whatever reason the service gave.
    Rejected { status: u16, reason: String },
}

/// Client bound to one local poll service.
#[derive(Clone)]
pub struct PollClient {
    client: reqwest::Client,
    base: String,
}

impl PollClient {
    pub fn new(addr: SocketAddr, timeout: Duration) -> BenchResult<Self> {
        if !addr.ip().is_loopback() {
            return Err(BenchError::NonLoopback(addr));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("pollbench/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base: format!("http://{addr}"),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Ask whether `voter_id` has already voted in `poll_id`.
    pub async fn check_status(&self, poll_id: u32, voter_id: &str) -> BenchResult<bool> {
        let poll = poll_id.to_string();
        let resp = self
            .client
            .get(format!("{}/api/votes/status", self.base))
            .query(&[("pollId", poll.as_str()), ("voter_id", voter_id)])
            .send()
            .await?
            .error_for_status()?;
        let status: StatusResponse = resp.json().await?;
        Ok(status.already_voted)
    }

    pub async fn cast(&self, ballot: &Ballot) -> BenchResult<CastOutcome> {
        let resp = self
            .client
            .post(format!("{}/api/votes", self.base))
            .json(ballot)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if status.is_success() {
            let value = serde_json::from_str(&body).unwrap_or(Value::String(body));
            return Ok(CastOutcome::Accepted(value));
        }

        let reason = serde_json::from_str::<Rejection>(&body)
            .map(|r| r.reason)
            .unwrap_or(body);
        Ok(CastOutcome::Rejected {
            status: status.as_u16(),
            reason,
        })
    }
}
