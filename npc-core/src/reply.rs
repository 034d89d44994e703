//! NPC reply generation.

use crate::mood::Mood;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from a reply generator. The caller substitutes [`error_reply`].
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("remote generation failed: {0}")]
    Remote(#[from] claude::Error),

    #[error("generator returned an empty reply")]
    EmptyResponse,
}

/// Produces the NPC's line for one player message.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// `history` is the player's recent messages, oldest first, already
    /// including `message` as its last entry.
    async fn generate(
        &self,
        player_id: &str,
        message: &str,
        mood: Mood,
        history: &[String],
    ) -> Result<String, ReplyError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: ReplyGenerator + ?Sized> ReplyGenerator for std::sync::Arc<T> {
    async fn generate(
        &self,
        player_id: &str,
        message: &str,
        mood: Mood,
        history: &[String],
    ) -> Result<String, ReplyError> {
        (**self).generate(player_id, message, mood, history).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// The reply emitted in place of a generated one when generation fails.
pub fn error_reply(err: &ReplyError) -> String {
    format!("(Error generating reply: {err})")
}

/// Placeholder generator that echoes the mood and the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateReplier;

impl TemplateReplier {
    pub fn render(message: &str, mood: Mood) -> String {
        format!("(NPC in {mood} mood replies to: '{message}')")
    }
}

#[async_trait]
impl ReplyGenerator for TemplateReplier {
    async fn generate(
        &self,
        _player_id: &str,
        message: &str,
        mood: Mood,
        _history: &[String],
    ) -> Result<String, ReplyError> {
        Ok(Self::render(message, mood))
    }

    fn name(&self) -> &'static str {
        "template"
    }
}
