//! pollbench — load bench for poll services.
//!
//! Generates synthetic voters, fans out timed status-then-vote attempts
//! against a local poll service, and tracks outcomes for a live dashboard.

pub mod cli;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod ledger;
pub mod roster;
pub mod simulation;

pub use client::{CastOutcome, PollClient};
pub use config::SimulationConfig;
pub use error::{BenchError, BenchResult};
pub use events::{BenchEvent, EventBus};
pub use ledger::{EntryKind, Ledger, LogEntry, Totals};
pub use roster::NamePool;
pub use simulation::Simulation;
