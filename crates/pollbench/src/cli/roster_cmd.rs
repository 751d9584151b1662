//! Name-list maintenance.

use std::path::Path;

use anyhow::{Context, Result};

/// Strip `profile` from every record of `input`'s `results` array.
pub fn clean(input: &Path, output: &Path) -> Result<()> {
    let count = crate::roster::clean_file(input, output)
        .with_context(|| format!("failed to clean {}", input.display()))?;
    println!("Wrote {count} records to {}", output.display());
    Ok(())
}
