//! ChatProcessor - replays a chat log through NPC mood and reply logic.
//!
//! One run is a single sequential fold:
//! 1. every timestamp is parsed up front (any failure aborts the run)
//! 2. messages are stable-sorted by time
//! 3. each message updates its player's state, then gets a reply
//! 4. the records are returned newest first

use crate::message::{parse_timestamp, ChatMessage, MessageError, OutputRecord};
use crate::mood::MoodClassifier;
use crate::persist::{self, PersistError};
use crate::reply::{error_reply, ReplyGenerator};
use crate::state::PlayerBook;
use std::path::Path;
use thiserror::Error;

/// How many input messages are logged before a file run starts.
const SAMPLE_SIZE: usize = 5;

/// Errors that abort a run. Nothing is written when one occurs.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("invalid input: {0}")]
    Message(#[from] MessageError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Counts from a completed file run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    pub players: usize,
}

/// The orchestrator: a classifier and a generator, chosen at startup.
pub struct ChatProcessor {
    classifier: Box<dyn MoodClassifier>,
    generator: Box<dyn ReplyGenerator>,
}

impl ChatProcessor {
    pub fn new(
        classifier: impl MoodClassifier + 'static,
        generator: impl ReplyGenerator + 'static,
    ) -> Self {
        Self::from_boxed(Box::new(classifier), Box::new(generator))
    }

    pub fn from_boxed(
        classifier: Box<dyn MoodClassifier>,
        generator: Box<dyn ReplyGenerator>,
    ) -> Self {
        Self {
            classifier,
            generator,
        }
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    /// Process a batch of messages, returning one record per message,
    /// most recently processed first.
    pub async fn run(&self, messages: Vec<ChatMessage>) -> Result<Vec<OutputRecord>, ProcessError> {
        let (records, _) = self.fold(messages).await?;
        Ok(records)
    }

    /// Load `input`, process it, and write the result to `output`.
    pub async fn run_files(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<RunSummary, ProcessError> {
        let input = input.as_ref();
        let output = output.as_ref();

        let messages = persist::load_messages(input).await?;
        tracing::info!(count = messages.len(), path = %input.display(), "loaded messages");
        for m in messages.iter().take(SAMPLE_SIZE) {
            tracing::info!(player_id = %m.player_id, timestamp = %m.timestamp, text = %m.text, "sample");
        }

        let (records, players) = self.fold(messages).await?;
        persist::save_records(output, &records).await?;

        let summary = RunSummary {
            records: records.len(),
            players: players.len(),
        };
        tracing::info!(
            records = summary.records,
            players = summary.players,
            path = %output.display(),
            "wrote npc log"
        );
        Ok(summary)
    }

    async fn fold(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<(Vec<OutputRecord>, PlayerBook), ProcessError> {
        let mut timed = messages
            .into_iter()
            .enumerate()
            .map(|(index, m)| match parse_timestamp(&m.timestamp) {
                Some(at) => Ok((at, m)),
                None => Err(MessageError::InvalidTimestamp {
                    index,
                    value: m.timestamp.clone(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        // sort_by_key is stable: equal timestamps keep input order
        timed.sort_by_key(|(at, _)| *at);

        tracing::info!(
            count = timed.len(),
            classifier = self.classifier_name(),
            generator = self.generator_name(),
            "processing messages"
        );

        let mut book = PlayerBook::new();
        let mut records = Vec::with_capacity(timed.len());

        for (_, message) in timed {
            let update = book
                .update(&message.player_id, &message.text, self.classifier.as_ref())
                .await;
            if update.mood != update.previous_mood {
                tracing::debug!(
                    player_id = %message.player_id,
                    from = %update.previous_mood,
                    to = %update.mood,
                    "mood changed"
                );
            }

            let npc_reply = match self
                .generator
                .generate(&message.player_id, &message.text, update.mood, &update.history)
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(
                        player_id = %message.player_id,
                        generator = self.generator_name(),
                        error = %e,
                        "reply generation failed"
                    );
                    error_reply(&e)
                }
            };

            records.push(OutputRecord {
                player_id: message.player_id,
                message: message.text,
                npc_reply,
                last_3_messages: update.history,
                npc_mood: update.mood,
                timestamp: message.timestamp,
            });
        }

        records.reverse();
        Ok((records, book))
    }
}
