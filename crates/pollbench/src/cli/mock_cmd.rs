//! Serve the mock poll service on its own.

use anyhow::{Context, Result};
use poll_mock::{MockConfig, MockServer};
use tracing::info;

pub async fn run(
    port: u16,
    poll_id: u32,
    candidates: Vec<u32>,
    max_votes_per_sec: Option<u32>,
) -> Result<()> {
    let server = MockServer::spawn(MockConfig {
        port,
        polls: vec![(poll_id, candidates)],
        max_votes_per_sec,
    })
    .await
    .context("failed to start mock poll service")?;

    eprintln!("  Mock poll service on http://{} (poll {poll_id})", server.addr());
    super::ctrl_c().await;
    info!("received shutdown signal");
    server.shutdown().await.context("mock poll service failed")?;
    Ok(())
}
