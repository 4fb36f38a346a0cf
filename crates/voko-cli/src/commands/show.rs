//! Prints the persisted state without connecting.

use anyhow::{Context, Result};

use voko_core::repository::StateRepository;
use voko_infrastructure::{JsonStateStore, VokoPaths};

pub async fn execute() -> Result<()> {
    let paths = VokoPaths::default_location().context("Could not locate the data directory")?;
    let store = JsonStateStore::new(paths.state_file());

    let Some(state) = store
        .load()
        .await
        .context("Failed to read the saved state")?
    else {
        println!("No saved state.");
        return Ok(());
    };

    println!("Language: {}", state.language.code());

    let draft = &state.current_session;
    if draft.has_draft_content() {
        println!("\nCurrent draft:");
        if let Some(strategy) = &draft.impact.strategy {
            println!("  Strategy: {strategy}");
        }
        for kpi in &draft.impact.kpis {
            println!("  KPI: {} {}", kpi.label, kpi.value);
        }
        if let Some(okr) = &draft.outcome {
            println!("  Objective: {}", okr.objective);
            for kr in &okr.key_results {
                println!("    {} {} ({}%)", kr.label, kr.text, kr.progress);
            }
        }
        for initiative in &draft.output.initiatives {
            println!("  Initiative: {} -> {}", initiative.text, initiative.linked_kr);
        }
        for section in &draft.sections {
            println!("  Section {}: {} [{:?}]", section.id, section.title, section.status);
        }
        println!("  Checklist: {} items", draft.todos.len());
        println!("  Transcript: {} messages", draft.messages.len());
    } else {
        println!("\nNo draft in progress.");
    }

    if !state.user_context.is_empty() {
        println!("\nWhat the coach knows about you:\n  {}", state.user_context);
    }

    if state.completed_sessions.is_empty() {
        println!("\nNo completed sessions.");
    } else {
        println!("\nCompleted sessions:");
        for session in &state.completed_sessions {
            println!(
                "  {}  {}  {}",
                session.timestamp.format("%Y-%m-%d"),
                session.id,
                session.okr.objective
            );
        }
    }

    Ok(())
}
