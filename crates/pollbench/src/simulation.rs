//! Timed fan-out of vote attempts against a local poll service.
//!
//! Every tick spawns `workers_per_tick` attempts. Each attempt creates a
//! voter, checks status, and casts a ballot unless the service says the
//! voter already voted. Outcomes go to the [`Ledger`]; nothing is retried.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use poll_mock::Ballot;
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::client::{CastOutcome, PollClient};
use crate::config::SimulationConfig;
use crate::error::BenchResult;
use crate::events::{BenchEvent, EventBus};
use crate::ledger::{EntryKind, Ledger, Totals};
use crate::roster::{random_voter_id, NamePool, VoterProfile, VOTER_ID_LEN};

/// Issued ids kept around for duplicate attempts.
const ISSUED_ID_WINDOW: usize = 10_000;

pub struct Simulation {
    config: Arc<SimulationConfig>,
    pool: Arc<NamePool>,
    client: PollClient,
    ledger: Arc<Ledger>,
    bus: EventBus,
    shutdown: Arc<Notify>,
    issued: Mutex<VecDeque<String>>,
}

impl Simulation {
    pub fn new(
        config: SimulationConfig,
        pool: NamePool,
        client: PollClient,
        ledger: Arc<Ledger>,
        bus: EventBus,
    ) -> Self {
        Self {
            config: Arc::new(config),
            pool: Arc::new(pool),
            client,
            ledger,
            bus,
            shutdown: Arc::new(Notify::new()),
            issued: Mutex::new(VecDeque::new()),
        }
    }

    /// Notifying this handle stops the tick loop early.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    pub fn ledger(&self) -> Arc<Ledger> {
        Arc::clone(&self.ledger)
    }

    /// Run until the configured duration elapses or shutdown is signalled.
    /// In-flight attempts finish before the closing entry is recorded.
    pub async fn run(&self) -> BenchResult<Totals> {
        self.config.validate()?;
        let cfg = &self.config;

        self.bus.emit(BenchEvent::SimulationStarted {
            poll_id: cfg.poll_id,
            candidate_id: cfg.candidate_id,
            workers_per_tick: cfg.workers_per_tick,
            tick_ms: cfg.tick.as_millis() as u64,
            duration_secs: cfg.duration.as_secs(),
        });
        info!(
            "simulation started: {} attempts every {:?} for {:?} against {}",
            cfg.workers_per_tick,
            cfg.tick,
            cfg.duration,
            self.client.base_url()
        );

        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + cfg.duration;
        let mut ticker = tokio::time::interval(cfg.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                now = ticker.tick() => {
                    if now >= deadline {
                        break;
                    }
                    for _ in 0..cfg.workers_per_tick {
                        let attempt = self.prepare_attempt();
                        tasks.spawn(attempt.run());
                    }
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        debug!("attempt task ended abnormally: {e}");
                    }
                }
                _ = self.shutdown.notified() => {
                    info!("simulation stopped early");
                    break;
                }
            }
        }

        while tasks.join_next().await.is_some() {}
        self.ledger.record(
            EntryKind::Info,
            format!(
                "Finished voting simulation after {:.1}s.",
                started.elapsed().as_secs_f64()
            ),
        );

        let totals = self.ledger.totals();
        self.bus.emit(BenchEvent::SimulationFinished {
            totals,
            elapsed_ms: started.elapsed().as_millis() as u64,
        });
        Ok(totals)
    }

    fn prepare_attempt(&self) -> Attempt {
        let mut rng = rand::thread_rng();
        let voter = self.pool.random_voter(&mut rng);
        let voter_id = self.pick_voter_id(&mut rng);
        Attempt {
            config: Arc::clone(&self.config),
            client: self.client.clone(),
            ledger: Arc::clone(&self.ledger),
            voter,
            voter_id,
        }
    }

    /// Reuse an issued id with probability `duplicate_ratio`, else mint one.
    fn pick_voter_id<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let mut issued = self
            .issued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if self.config.duplicate_ratio > 0.0 && rng.gen_bool(self.config.duplicate_ratio) {
            if let Some(id) = issued.make_contiguous().choose(rng) {
                return id.clone();
            }
        }

        let id = random_voter_id(rng, VOTER_ID_LEN);
        if issued.len() == ISSUED_ID_WINDOW {
            issued.pop_front();
        }
        issued.push_back(id.clone());
        id
    }
}

/// One voter's status-then-cast sequence.
struct Attempt {
    config: Arc<SimulationConfig>,
    client: PollClient,
    ledger: Arc<Ledger>,
    voter: VoterProfile,
    voter_id: String,
}

impl Attempt {
    async fn run(self) {
        let Attempt {
            config,
            client,
            ledger,
            voter,
            voter_id,
        } = self;

        ledger.record(
            EntryKind::Info,
            format!(
                "Created voter: {} ({}) with ID {voter_id}",
                voter.name, voter.gender
            ),
        );

        match client.check_status(config.poll_id, &voter_id).await {
            Ok(true) => {
                ledger.record(
                    EntryKind::Skipped,
                    format!("Voter {voter_id} already voted. Skipping."),
                );
                return;
            }
            Ok(false) => {}
            Err(e) => {
                ledger.record(
                    EntryKind::Error,
                    format!("Error checking vote status for {voter_id}: {e}"),
                );
                return;
            }
        }

        let ballot = Ballot {
            poll_id: config.poll_id,
            competitor_id: config.candidate_id,
            voter_id: voter_id.clone(),
            name: voter.name.clone(),
            gender: voter.gender.to_string(),
            region: config.region.clone(),
            county: config.county.clone(),
            constituency: String::new(),
            ward: String::new(),
        };

        match client.cast(&ballot).await {
            Ok(CastOutcome::Accepted(response)) => ledger.record(
                EntryKind::Success,
                format!("Voted for {}. Response: {response}", voter.name),
            ),
            // Another attempt with the same id won between status and cast.
            Ok(CastOutcome::Rejected { status: 409, .. }) => ledger.record(
                EntryKind::Skipped,
                format!("Voter {voter_id} already voted at cast time. Skipping."),
            ),
            Ok(CastOutcome::Rejected { status, reason }) => ledger.record(
                EntryKind::Error,
                format!("Vote for {voter_id} rejected ({status}): {reason}"),
            ),
            Err(e) => ledger.record(
                EntryKind::Error,
                format!("Error posting vote for {voter_id}: {e}"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn simulation(duplicate_ratio: f64) -> Simulation {
        let pool = NamePool::from_lists(vec!["A".into()], vec!["B".into()]).unwrap();
        let client = PollClient::new(
            "127.0.0.1:9".parse().unwrap(),
            Duration::from_millis(200),
        )
        .unwrap();
        Simulation::new(
            SimulationConfig {
                duplicate_ratio,
                ..Default::default()
            },
            pool,
            client,
            Arc::new(Ledger::new(100)),
            EventBus::new(16),
        )
    }

    #[test]
    fn test_fresh_ids_without_duplicates() {
        let sim = simulation(0.0);
        let mut rng = StdRng::seed_from_u64(3);
        let ids: std::collections::HashSet<String> =
            (0..100).map(|_| sim.pick_voter_id(&mut rng)).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_full_duplicate_ratio_reuses_first_id() {
        let sim = simulation(1.0);
        let mut rng = StdRng::seed_from_u64(3);
        let first = sim.pick_voter_id(&mut rng);
        for _ in 0..20 {
            assert_eq!(sim.pick_voter_id(&mut rng), first);
        }
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_running() {
        let mut sim = simulation(0.0);
        sim.config = Arc::new(SimulationConfig {
            workers_per_tick: 0,
            ..Default::default()
        });
        assert!(sim.run().await.is_err());
        assert_eq!(sim.ledger().totals().total, 0);
    }

    #[tokio::test]
    async fn test_unreachable_service_logs_errors() {
        let pool = NamePool::from_lists(vec!["A".into()], vec!["B".into()]).unwrap();
        // Bind then drop to get a port with nothing listening.
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let client = PollClient::new(
            format!("127.0.0.1:{port}").parse().unwrap(),
            Duration::from_millis(500),
        )
        .unwrap();
        let sim = Simulation::new(
            SimulationConfig {
                workers_per_tick: 3,
                tick: Duration::from_millis(50),
                duration: Duration::from_millis(120),
                ..Default::default()
            },
            pool,
            client,
            Arc::new(Ledger::new(100)),
            EventBus::new(16),
        );

        let totals = sim.run().await.unwrap();
        assert!(totals.errors >= 3);
        assert_eq!(totals.success, 0);
        assert_eq!(totals.skipped, 0);
    }
}
