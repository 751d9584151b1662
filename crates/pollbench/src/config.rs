//! Configuration loading and resolution.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BenchError, BenchResult};

pub const FIRST_NAMES_ENV: &str = "POLLBENCH_FIRST_NAMES";
pub const LAST_NAMES_ENV: &str = "POLLBENCH_LAST_NAMES";

/// Parameters of one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub poll_id: u32,
    pub candidate_id: u32,
    pub workers_per_tick: usize,
    pub tick: Duration,
    pub duration: Duration,
    /// Fraction of attempts that reuse an already issued voter id.
    pub duplicate_ratio: f64,
    pub request_timeout: Duration,
    /// Entries kept in the ledger; counters keep counting past it.
    pub log_capacity: usize,
    pub region: String,
    pub county: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            poll_id: 1,
            candidate_id: 1,
            workers_per_tick: 50,
            tick: Duration::from_secs(1),
            duration: Duration::from_secs(60 * 60),
            duplicate_ratio: 0.0,
            request_timeout: Duration::from_secs(10),
            log_capacity: 10_000,
            region: "National".to_string(),
            county: "All".to_string(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> BenchResult<()> {
        if self.workers_per_tick == 0 {
            return Err(BenchError::InvalidConfig(
                "workers per tick must be at least 1".into(),
            ));
        }
        if self.tick.is_zero() {
            return Err(BenchError::InvalidConfig("tick must be non-zero".into()));
        }
        if self.duration.is_zero() {
            return Err(BenchError::InvalidConfig("duration must be non-zero".into()));
        }
        if !(0.0..=1.0).contains(&self.duplicate_ratio) {
            return Err(BenchError::InvalidConfig(format!(
                "duplicate ratio {} outside 0.0..=1.0",
                self.duplicate_ratio
            )));
        }
        if self.log_capacity == 0 {
            return Err(BenchError::InvalidConfig(
                "log capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Resolve a name-list path: explicit flag, then env var, then `fallback`
/// in the working directory.
pub fn resolve_names_path(explicit: Option<&str>, env_var: &str, fallback: &str) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    if let Ok(env_path) = std::env::var(env_var) {
        if !env_path.trim().is_empty() {
            return PathBuf::from(env_path);
        }
    }

    PathBuf::from(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = SimulationConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.workers_per_tick, 50);
        assert_eq!(cfg.tick, Duration::from_secs(1));
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            SimulationConfig {
                workers_per_tick: 0,
                ..Default::default()
            },
            SimulationConfig {
                tick: Duration::ZERO,
                ..Default::default()
            },
            SimulationConfig {
                duration: Duration::ZERO,
                ..Default::default()
            },
            SimulationConfig {
                duplicate_ratio: 1.5,
                ..Default::default()
            },
            SimulationConfig {
                duplicate_ratio: f64::NAN,
                ..Default::default()
            },
            SimulationConfig {
                log_capacity: 0,
                ..Default::default()
            },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(BenchError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_explicit_path_wins() {
        let p = resolve_names_path(Some("/tmp/x.json"), "POLLBENCH_TEST_UNSET_VAR", "first.json");
        assert_eq!(p, PathBuf::from("/tmp/x.json"));
    }

    #[test]
    fn test_fallback_path() {
        let p = resolve_names_path(None, "POLLBENCH_TEST_SURELY_UNSET", "last.json");
        assert_eq!(p, PathBuf::from("last.json"));
    }
}
