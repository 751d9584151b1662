//! Ballot box — in-memory poll state guarded by a single lock.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;

use crate::ballot::Ballot;

/// Longest voter id the box accepts.
pub const MAX_VOTER_ID_LEN: usize = 64;

const RATE_WINDOW: Duration = Duration::from_secs(1);

/// Reasons a vote or lookup is refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CastError {
    #[error("unknown poll: {0}")]
    UnknownPoll(u32),

    #[error("unknown candidate {candidate} in poll {poll}")]
    UnknownCandidate { poll: u32, candidate: u32 },

    #[error("invalid voter id: {0}")]
    InvalidVoter(String),

    #[error("voter {0} already voted")]
    AlreadyVoted(String),

    #[error("rate limited: more than {0} votes this second")]
    RateLimited(u32),
}

/// Per-candidate counts for one poll.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PollTally {
    #[serde(rename = "pollId")]
    pub poll_id: u32,
    pub candidates: BTreeMap<u32, u64>,
    pub voters: usize,
}

#[derive(Debug, Default)]
struct PollRecord {
    voters: HashSet<String>,
    tally: HashMap<u32, u64>,
}

#[derive(Debug)]
struct RateWindow {
    started: Instant,
    admitted: u32,
}

#[derive(Debug)]
struct Inner {
    polls: HashMap<u32, PollRecord>,
    window: RateWindow,
}

/// Thread-safe store of polls, voters and tallies.
#[derive(Debug)]
pub struct BallotBox {
    inner: Mutex<Inner>,
    max_votes_per_sec: Option<u32>,
}

impl BallotBox {
    /// Create a box holding the given polls, each with its candidate ids.
    pub fn new(polls: impl IntoIterator<Item = (u32, Vec<u32>)>) -> Self {
        let polls = polls
            .into_iter()
            .map(|(poll_id, candidates)| {
                let record = PollRecord {
                    voters: HashSet::new(),
                    tally: candidates.into_iter().map(|c| (c, 0)).collect(),
                };
                (poll_id, record)
            })
            .collect();

        Self {
            inner: Mutex::new(Inner {
                polls,
                window: RateWindow {
                    started: Instant::now(),
                    admitted: 0,
                },
            }),
            max_votes_per_sec: None,
        }
    }

    /// Cap accepted votes per one-second window.
    pub fn with_rate_limit(mut self, max_votes_per_sec: Option<u32>) -> Self {
        self.max_votes_per_sec = max_votes_per_sec;
        self
    }

    /// Whether `voter_id` has already voted in `poll_id`.
    pub async fn status(&self, poll_id: u32, voter_id: &str) -> Result<bool, CastError> {
        let inner = self.inner.lock().await;
        let poll = inner
            .polls
            .get(&poll_id)
            .ok_or(CastError::UnknownPoll(poll_id))?;
        Ok(poll.voters.contains(voter_id))
    }

    /// Record a ballot. Returns the candidate's new count.
    pub async fn cast(&self, ballot: &Ballot) -> Result<u64, CastError> {
        self.cast_at(ballot, Instant::now()).await
    }

    async fn cast_at(&self, ballot: &Ballot, now: Instant) -> Result<u64, CastError> {
        validate_voter_id(&ballot.voter_id)?;

        let mut inner = self.inner.lock().await;
        let Inner { polls, window } = &mut *inner;

        let poll = polls
            .get_mut(&ballot.poll_id)
            .ok_or(CastError::UnknownPoll(ballot.poll_id))?;
        if !poll.tally.contains_key(&ballot.competitor_id) {
            return Err(CastError::UnknownCandidate {
                poll: ballot.poll_id,
                candidate: ballot.competitor_id,
            });
        }
        if poll.voters.contains(&ballot.voter_id) {
            return Err(CastError::AlreadyVoted(ballot.voter_id.clone()));
        }

        if let Some(limit) = self.max_votes_per_sec {
            if now.duration_since(window.started) >= RATE_WINDOW {
                window.started = now;
                window.admitted = 0;
            }
            if window.admitted >= limit {
                return Err(CastError::RateLimited(limit));
            }
            window.admitted += 1;
        }

        poll.voters.insert(ballot.voter_id.clone());
        let count = poll.tally.entry(ballot.competitor_id).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    /// Current counts for a poll.
    pub async fn tally(&self, poll_id: u32) -> Result<PollTally, CastError> {
        let inner = self.inner.lock().await;
        let poll = inner
            .polls
            .get(&poll_id)
            .ok_or(CastError::UnknownPoll(poll_id))?;
        Ok(PollTally {
            poll_id,
            candidates: poll.tally.iter().map(|(k, v)| (*k, *v)).collect(),
            voters: poll.voters.len(),
        })
    }
}

fn validate_voter_id(voter_id: &str) -> Result<(), CastError> {
    if voter_id.trim().is_empty() {
        return Err(CastError::InvalidVoter("empty".to_string()));
    }
    if voter_id.len() > MAX_VOTER_ID_LEN {
        return Err(CastError::InvalidVoter(format!(
            "{} bytes exceeds {MAX_VOTER_ID_LEN}",
            voter_id.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ballot(voter: &str, candidate: u32) -> Ballot {
        Ballot {
            poll_id: 1,
            competitor_id: candidate,
            voter_id: voter.to_string(),
            name: "Test Voter".to_string(),
            gender: "Male".to_string(),
            region: String::new(),
            county: String::new(),
            constituency: String::new(),
            ward: String::new(),
        }
    }

    fn single_poll() -> BallotBox {
        BallotBox::new([(1, vec![10, 20])])
    }

    #[tokio::test]
    async fn test_cast_then_status() {
        let bb = single_poll();
        assert!(!bb.status(1, "alice").await.unwrap());
        assert_eq!(bb.cast(&ballot("alice", 10)).await.unwrap(), 1);
        assert!(bb.status(1, "alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_second_vote_rejected() {
        let bb = single_poll();
        bb.cast(&ballot("bob", 10)).await.unwrap();
        let err = bb.cast(&ballot("bob", 20)).await.unwrap_err();
        assert_eq!(err, CastError::AlreadyVoted("bob".to_string()));

        let tally = bb.tally(1).await.unwrap();
        assert_eq!(tally.candidates[&10], 1);
        assert_eq!(tally.candidates[&20], 0);
        assert_eq!(tally.voters, 1);
    }

    #[tokio::test]
    async fn test_unknown_poll_and_candidate() {
        let bb = single_poll();
        assert_eq!(bb.status(9, "x").await, Err(CastError::UnknownPoll(9)));
        let err = bb.cast(&ballot("x", 99)).await.unwrap_err();
        assert!(matches!(err, CastError::UnknownCandidate { candidate: 99, .. }));
        assert_eq!(bb.tally(1).await.unwrap().voters, 0);
    }

    #[tokio::test]
    async fn test_invalid_voter_ids() {
        let bb = single_poll();
        assert!(matches!(
            bb.cast(&ballot("   ", 10)).await,
            Err(CastError::InvalidVoter(_))
        ));
        let long = "v".repeat(MAX_VOTER_ID_LEN + 1);
        assert!(matches!(
            bb.cast(&ballot(&long, 10)).await,
            Err(CastError::InvalidVoter(_))
        ));
        let exact = "v".repeat(MAX_VOTER_ID_LEN);
        assert!(bb.cast(&ballot(&exact, 10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limit_window() {
        let bb = single_poll().with_rate_limit(Some(2));
        let t0 = Instant::now();
        bb.cast_at(&ballot("a", 10), t0).await.unwrap();
        bb.cast_at(&ballot("b", 10), t0).await.unwrap();
        assert_eq!(
            bb.cast_at(&ballot("c", 10), t0).await,
            Err(CastError::RateLimited(2))
        );
        // A refused voter may try again once the window rolls over.
        let t1 = t0 + Duration::from_millis(1001);
        assert!(bb.cast_at(&ballot("c", 10), t1).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicates_do_not_consume_rate_budget() {
        let bb = single_poll().with_rate_limit(Some(1));
        let t0 = Instant::now();
        bb.cast_at(&ballot("a", 10), t0).await.unwrap();
        let t1 = t0 + Duration::from_secs(2);
        assert!(matches!(
            bb.cast_at(&ballot("a", 10), t1).await,
            Err(CastError::AlreadyVoted(_))
        ));
        assert!(bb.cast_at(&ballot("b", 10), t1).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_casts_accept_once() {
        let bb = Arc::new(single_poll());
        let mut handles = Vec::new();
        for i in 0..32 {
            let bb = Arc::clone(&bb);
            let candidate = if i % 2 == 0 { 10 } else { 20 };
            handles.push(tokio::spawn(async move {
                bb.cast(&ballot("same-voter", candidate)).await
            }));
        }

        let mut accepted = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);

        let tally = bb.tally(1).await.unwrap();
        assert_eq!(tally.candidates.values().sum::<u64>(), 1);
    }
}
