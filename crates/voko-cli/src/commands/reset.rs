//! Factory reset of the persisted state.

use std::io::Write;

use anyhow::{Context, Result};

use voko_core::repository::StateRepository;
use voko_infrastructure::{JsonStateStore, VokoPaths};

pub async fn execute(yes: bool) -> Result<()> {
    if !yes && !confirm()? {
        println!("Aborted.");
        return Ok(());
    }

    let paths = VokoPaths::default_location().context("Could not locate the data directory")?;
    let store = JsonStateStore::new(paths.state_file());
    store
        .clear()
        .await
        .context("Failed to erase the saved state")?;

    println!("All saved state erased.");
    Ok(())
}

fn confirm() -> Result<bool> {
    print!("Erase the current draft, session history, and accumulated context? [y/N] ");
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("Failed to read the answer")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
