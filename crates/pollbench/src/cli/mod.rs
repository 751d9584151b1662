//! CLI subcommand implementations for the pollbench binary.

pub mod mock_cmd;
pub mod roster_cmd;
pub mod run_cmd;

/// Parse a comma-separated list of candidate ids, e.g. "374,375".
pub fn parse_candidates(raw: &str) -> Result<Vec<u32>, String> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u32>().map_err(|e| format!("bad candidate id {s:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    if ids.is_empty() {
        return Err("at least one candidate id is required".to_string());
    }
    Ok(ids)
}

/// Resolves when Ctrl-C is received.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_candidates() {
        assert_eq!(parse_candidates("374, 375,").unwrap(), vec![374, 375]);
        assert!(parse_candidates("").is_err());
        assert!(parse_candidates("1,x").is_err());
    }
}
