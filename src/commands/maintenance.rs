use anyhow::Result;
use evently_core::repository::RecoveryOutcome;
use owo_colors::OwoColorize;

use crate::app::App;

pub async fn recover(app: &App) -> Result<()> {
    let recovered = app.repo.recover_transfers().await?;

    if recovered.is_empty() {
        println!("{}", "No interrupted transfers".dimmed());
        return Ok(());
    }

    for transfer in &recovered {
        let outcome = match transfer.outcome {
            RecoveryOutcome::RolledForward => "completed".green().to_string(),
            RecoveryOutcome::RolledBack => "rolled back".yellow().to_string(),
            RecoveryOutcome::Abandoned => "event missing, marker dropped".red().to_string(),
        };
        println!(
            "  {} {} -> {}: {}",
            transfer.event_id.bold(),
            transfer.marker.from_owner,
            transfer.marker.to_owner,
            outcome
        );
    }
    Ok(())
}

pub async fn reindex(app: &App) -> Result<()> {
    let report = app.repo.resolver().rebuild_indexes().await?;
    println!(
        "{} Indexed {} join code(s) and {} membership(s)",
        "✓".green(),
        report.codes,
        report.memberships
    );
    Ok(())
}
