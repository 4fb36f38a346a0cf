use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "voko")]
#[command(about = "Voko - voice-driven OKR coaching companion", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a live coaching session against the configured agent
    Run {
        /// Archive the current OKR draft and start a fresh one first
        #[arg(long)]
        new_okr: bool,
    },
    /// Print the saved draft and session history
    Show,
    /// Erase all saved state (draft, history, accumulated context)
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("voko=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { new_okr } => commands::run::execute(new_okr).await,
        Commands::Show => commands::show::execute().await,
        Commands::Reset { yes } => commands::reset::execute(yes).await,
    }
}
