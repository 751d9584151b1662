//! Run a full bench: mock service, dashboard and simulation in one process.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Args;
use poll_mock::{MockConfig, MockServer};
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::client::PollClient;
use crate::config::{resolve_names_path, SimulationConfig, FIRST_NAMES_ENV, LAST_NAMES_ENV};
use crate::dashboard::{self, DashboardState};
use crate::events::EventBus;
use crate::ledger::{Ledger, Totals};
use crate::roster::NamePool;
use crate::simulation::Simulation;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// JSON array of first names (default: $POLLBENCH_FIRST_NAMES or ./first.json).
    #[arg(long)]
    pub first_names: Option<String>,

    /// JSON array of last names (default: $POLLBENCH_LAST_NAMES or ./last.json).
    #[arg(long)]
    pub last_names: Option<String>,

    /// Poll id registered in the mock service.
    #[arg(long, default_value = "1")]
    pub poll_id: u32,

    /// Candidate ids registered in the poll (comma separated; defaults to --candidate-id).
    #[arg(long)]
    pub candidates: Option<String>,

    /// Candidate every simulated ballot is cast for.
    #[arg(long, default_value = "1")]
    pub candidate_id: u32,

    /// Attempts spawned per tick.
    #[arg(long, default_value = "50")]
    pub workers: usize,

    #[arg(long, default_value = "1000")]
    pub tick_ms: u64,

    #[arg(long, default_value = "3600")]
    pub duration_secs: u64,

    /// Share of attempts reusing an earlier voter id (0.0 to 1.0).
    #[arg(long, default_value = "0.0")]
    pub duplicate_ratio: f64,

    /// Admission cap of the mock service.
    #[arg(long)]
    pub max_votes_per_sec: Option<u32>,

    #[arg(long, default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Log entries kept for the dashboard.
    #[arg(long, default_value = "10000")]
    pub log_capacity: usize,

    #[arg(long, env = "POLLBENCH_DASHBOARD_PORT", default_value = "8000")]
    pub dashboard_port: u16,

    /// Mock service port on 127.0.0.1 (0 = any free port).
    #[arg(long, default_value = "0")]
    pub mock_port: u16,

    /// Exit as soon as the simulation finishes instead of keeping the dashboard up.
    #[arg(long)]
    pub exit_when_done: bool,
}

impl RunArgs {
    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            poll_id: self.poll_id,
            candidate_id: self.candidate_id,
            workers_per_tick: self.workers,
            tick: Duration::from_millis(self.tick_ms),
            duration: Duration::from_secs(self.duration_secs),
            duplicate_ratio: self.duplicate_ratio,
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            log_capacity: self.log_capacity,
            ..Default::default()
        }
    }

    /// Candidates to register, always including the simulated one.
    pub fn poll_candidates(&self) -> Result<Vec<u32>> {
        let Some(raw) = &self.candidates else {
            return Ok(vec![self.candidate_id]);
        };
        let list = super::parse_candidates(raw).map_err(anyhow::Error::msg)?;
        if !list.contains(&self.candidate_id) {
            bail!(
                "candidate {} is not among the poll's candidates {list:?}",
                self.candidate_id
            );
        }
        Ok(list)
    }
}

pub async fn run(args: RunArgs) -> Result<()> {
    let config = args.simulation_config();
    config.validate().context("invalid simulation settings")?;
    let candidates = args.poll_candidates()?;

    let first = resolve_names_path(args.first_names.as_deref(), FIRST_NAMES_ENV, "first.json");
    let last = resolve_names_path(args.last_names.as_deref(), LAST_NAMES_ENV, "last.json");
    let pool = NamePool::load(&first, &last).context("failed to load name lists")?;
    let (n_first, n_last) = pool.sizes();
    info!("loaded {n_first} first names and {n_last} last names");

    let mock = MockServer::spawn(MockConfig {
        port: args.mock_port,
        polls: vec![(config.poll_id, candidates)],
        max_votes_per_sec: args.max_votes_per_sec,
    })
    .await
    .context("failed to start mock poll service")?;

    let bus = EventBus::new(1024);
    let ledger = Arc::new(Ledger::new(config.log_capacity).with_bus(bus.clone()));
    let client = PollClient::new(mock.addr(), config.request_timeout)?;

    let dashboard_shutdown = Arc::new(Notify::new());
    let dashboard_task = tokio::spawn(dashboard::serve(
        args.dashboard_port,
        Arc::new(DashboardState {
            started_at: Instant::now(),
            ledger: Arc::clone(&ledger),
            bus: bus.clone(),
            ballots: Some((config.poll_id, mock.ballots())),
        }),
        Arc::clone(&dashboard_shutdown),
    ));
    eprintln!(
        "  Dashboard: http://127.0.0.1:{}/dashboard",
        args.dashboard_port
    );

    let simulation = Simulation::new(config, pool, client, ledger, bus);
    let stop = simulation.shutdown_handle();
    let signal = tokio::spawn(async move {
        super::ctrl_c().await;
        info!("received shutdown signal");
        stop.notify_one();
    });

    let totals = simulation.run().await?;
    print_totals(&totals);

    if !args.exit_when_done && !signal.is_finished() {
        eprintln!("  Simulation finished; dashboard stays up until Ctrl-C.");
        if let Err(e) = signal.await {
            warn!("signal task failed: {e}");
        }
    } else {
        signal.abort();
    }

    dashboard_shutdown.notify_one();
    match dashboard_task.await {
        Ok(result) => result.context("dashboard failed")?,
        Err(e) => warn!("dashboard task failed: {e}"),
    }
    mock.shutdown().await.context("mock poll service failed")?;
    Ok(())
}

fn print_totals(totals: &Totals) {
    println!(
        "entries: {}  success: {}  skipped: {}  errors: {}",
        totals.total, totals.success, totals.skipped, totals.errors
    );
}
