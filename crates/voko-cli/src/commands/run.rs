//! The live session loop: connect, print the conversation as it happens,
//! end cleanly on Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;

use voko_application::SessionController;
use voko_core::session::event::UiEvent;
use voko_core::session::model::Role;
use voko_infrastructure::{ClientConfig, JsonStateStore, VokoPaths};

pub async fn execute(new_okr: bool) -> Result<()> {
    let paths = VokoPaths::default_location().context("Could not locate the data directory")?;
    let config = ClientConfig::load(&paths).context("Failed to load configuration")?;
    let store = Arc::new(
        JsonStateStore::from_paths(&paths).context("Failed to prepare the data directory")?,
    );

    let mut controller = SessionController::new(config, store);
    controller.hydrate().await;

    if new_okr {
        match controller.start_new_okr().await {
            Some(id) => println!("Archived the previous OKR as {id}."),
            None => println!("No OKR draft to archive; starting fresh."),
        }
    }

    let mut events = controller.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(event),
                Err(RecvError::Lagged(skipped)) => {
                    eprintln!("(skipped {skipped} events)");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    controller
        .start_session()
        .await
        .context("Could not open a session")?;
    println!("Session started. Press Ctrl-C to end.");

    let interrupted = tokio::select! {
        result = controller.run() => {
            result.context("Session loop failed")?;
            false
        }
        _ = tokio::signal::ctrl_c() => true,
    };

    if interrupted {
        println!();
        controller.end_session().await;
    }
    println!("Session ended. Your draft is saved; run again to resume.");

    printer.abort();
    Ok(())
}

fn print_event(event: UiEvent) {
    match event {
        UiEvent::TranscriptAppended { message } => {
            let speaker = match message.role {
                Role::User => "you",
                Role::Coach => "coach",
            };
            println!("[{speaker}] {}", message.text);
        }
        UiEvent::StatusChanged { status } => {
            println!("-- {status}");
        }
        UiEvent::TodosUpdated {
            todos,
            newly_completed,
        } => {
            println!("-- checklist:");
            for todo in &todos {
                let mark = if todo.completed { "x" } else { " " };
                let fresh = if newly_completed.contains(&todo.id) {
                    "  (done!)"
                } else {
                    ""
                };
                println!("   [{mark}] {}{fresh}", todo.text);
            }
        }
        UiEvent::WorkspaceUpdated { draft } => {
            if let Some(okr) = &draft.outcome {
                println!("-- objective: {}", okr.objective);
                for kr in &okr.key_results {
                    println!("   {} {} ({}%)", kr.label, kr.text, kr.progress);
                }
            }
            if let Some(strategy) = &draft.impact.strategy {
                println!("-- strategy: {strategy}");
            }
        }
    }
}
