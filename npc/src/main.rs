//! NPC chat log replay.
//!
//! Reads a JSON array of timestamped player messages, tracks each player's
//! mood and recent history, and writes an annotated log with one NPC reply
//! per message, newest first.
//!
//! ```bash
//! cargo run -p npc -- --input players.json --output npc_logs.json
//! cargo run -p npc -- --backend remote   # needs ANTHROPIC_API_KEY
//! ```

use npc_core::config::usage;
use npc_core::{ChatConfig, Command};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "npc=info,npc_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = match ChatConfig::from_env()?.parse_args(std::env::args().skip(1))? {
        Command::Help => {
            print!("{}", usage());
            return Ok(());
        }
        Command::Run(config) => config,
    };

    tracing::info!(
        input = %config.input.display(),
        output = %config.output.display(),
        backend = %config.backend,
        "starting run"
    );

    let processor = config.build_processor()?;
    processor.run_files(&config.input, &config.output).await?;
    Ok(())
}
