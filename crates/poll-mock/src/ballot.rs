//! Wire types shared by the mock service and its clients.

use serde::{Deserialize, Serialize};

/// A vote as posted to `/api/votes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    /// Poll id. Named `id` on the wire.
    #[serde(rename = "id")]
    pub poll_id: u32,
    #[serde(rename = "competitorId")]
    pub competitor_id: u32,
    pub voter_id: String,
    pub name: String,
    pub gender: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub constituency: String,
    #[serde(default)]
    pub ward: String,
}

/// Query string of `/api/votes/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "pollId")]
    pub poll_id: u32,
    pub voter_id: String,
}

/// Query string of `/api/votes/tally`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyQuery {
    #[serde(rename = "pollId")]
    pub poll_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(rename = "alreadyVoted")]
    pub already_voted: bool,
}

/// Body returned for an accepted vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub accepted: bool,
    pub receipt: String,
    #[serde(rename = "pollId")]
    pub poll_id: u32,
    #[serde(rename = "competitorId")]
    pub competitor_id: u32,
    /// The candidate's count after this vote.
    pub tally: u64,
}

/// Body returned for any refused vote or failed lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    pub accepted: bool,
    pub reason: String,
}

impl Rejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: reason.into(),
        }
    }
}
