//! poll-mock — an in-process poll service for load benches.
//!
//! Accepts one vote per voter id per poll, answers "already voted" status
//! checks, and can cap admissions per second. Always binds to loopback.

pub mod ballot;
pub mod service;
pub mod store;

pub use ballot::{Ballot, Rejection, StatusResponse, VoteReceipt};
pub use service::{MockConfig, MockServer};
pub use store::{BallotBox, CastError, PollTally};
