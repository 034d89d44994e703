//! Offline NPC dialogue replay.
//!
//! This crate provides:
//! - Per-player conversational state (a three-message history window and a mood)
//! - Rule-based and Claude-backed mood classifiers and reply generators
//! - A batch processor that replays a timestamped chat log through them
//! - JSON persistence for the input log and the annotated output
//!
//! # Quick Start
//!
//! ```ignore
//! use npc_core::{ChatConfig, Backend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ChatConfig::new()
//!         .with_input("players.json")
//!         .with_output("npc_logs.json")
//!         .with_backend(Backend::Rules);
//!
//!     let processor = config.build_processor()?;
//!     let summary = processor.run_files(&config.input, &config.output).await?;
//!     println!("{} records for {} players", summary.records, summary.players);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod message;
pub mod mood;
pub mod persist;
pub mod processor;
pub mod remote;
pub mod reply;
pub mod state;
pub mod testing;

// Primary public API
pub use config::{Backend, ChatConfig, Command, ConfigError};
pub use message::{ChatMessage, MessageError, OutputRecord};
pub use mood::{ClassifyError, KeywordClassifier, Mood, MoodClassifier};
pub use persist::PersistError;
pub use processor::{ChatProcessor, ProcessError, RunSummary};
pub use remote::{RemoteClassifier, RemoteReplier};
pub use reply::{ReplyError, ReplyGenerator, TemplateReplier};
pub use state::{History, PlayerBook, PlayerState};
