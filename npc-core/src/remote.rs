//! Claude-backed mood classification and reply generation.
//!
//! Both calls are single request/response round trips. Failures come back
//! as errors; the processor decides what to do with them.

use crate::mood::{ClassifyError, Mood, MoodClassifier};
use crate::reply::{ReplyError, ReplyGenerator};
use async_trait::async_trait;
use claude::{Claude, Message, Request};

/// Tokens allowed for a mood label. One word is all we want back.
const CLASSIFY_MAX_TOKENS: usize = 10;

/// Tokens allowed for an NPC line (one or two short sentences).
const REPLY_MAX_TOKENS: usize = 60;

const REPLY_TEMPERATURE: f32 = 0.7;

/// Builds the classifier system prompt from the closed label set.
pub fn classify_system_prompt() -> String {
    let labels: Vec<&str> = Mood::ALL.iter().map(|m| m.as_str()).collect();
    format!(
        "You are a mood detection AI. Given a player's message, classify their mood as one of: \
         [{}]. Only return the mood word.",
        labels.join(", ")
    )
}

pub fn classify_user_prompt(message: &str, previous: Mood) -> String {
    format!("Message: \"{message}\"\nPrevious mood: {previous}")
}

/// Turn raw model output into a label. Tolerates stray punctuation around
/// the word ("Angry." / "`sad`"), nothing more.
pub fn parse_mood_response(raw: &str) -> Result<Mood, ClassifyError> {
    let trimmed = raw
        .trim()
        .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());
    if trimmed.is_empty() {
        return Err(ClassifyError::EmptyResponse);
    }
    Ok(trimmed.parse::<Mood>()?)
}

pub fn reply_system_prompt(mood: Mood) -> String {
    format!(
        "You are a Non-Player Character (NPC) in a role-playing game.\n\
         Your current mood is: {mood}.\n\
         Reply briefly (1-2 short sentences) and stay consistent with your mood."
    )
}

pub fn reply_user_prompt(message: &str, history: &[String]) -> String {
    let context = history
        .iter()
        .map(|m| format!("Player: {m}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Player just said: \"{message}\"\nRecent conversation:\n{context}\n\
         Generate your NPC reply now."
    )
}

/// Mood classifier that asks Claude for one label.
#[derive(Debug, Clone)]
pub struct RemoteClassifier {
    client: Claude,
}

impl RemoteClassifier {
    pub fn new(client: Claude) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MoodClassifier for RemoteClassifier {
    async fn classify(&self, message: &str, previous: Mood) -> Result<Mood, ClassifyError> {
        let request = Request::new(vec![Message::user(classify_user_prompt(message, previous))])
            .with_system(classify_system_prompt())
            .with_max_tokens(CLASSIFY_MAX_TOKENS)
            .with_temperature(0.0);

        let response = self.client.complete(request).await?;
        parse_mood_response(&response.text())
    }

    fn name(&self) -> &'static str {
        "claude"
    }
}

/// Reply generator that asks Claude to speak as the NPC.
#[derive(Debug, Clone)]
pub struct RemoteReplier {
    client: Claude,
}

impl RemoteReplier {
    pub fn new(client: Claude) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReplyGenerator for RemoteReplier {
    async fn generate(
        &self,
        _player_id: &str,
        message: &str,
        mood: Mood,
        history: &[String],
    ) -> Result<String, ReplyError> {
        let request = Request::new(vec![Message::user(reply_user_prompt(message, history))])
            .with_system(reply_system_prompt(mood))
            .with_max_tokens(REPLY_MAX_TOKENS)
            .with_temperature(REPLY_TEMPERATURE);

        let response = self.client.complete(request).await?;
        let reply = response.text().trim().to_string();
        if reply.is_empty() {
            return Err(ReplyError::EmptyResponse);
        }
        Ok(reply)
    }

    fn name(&self) -> &'static str {
        "claude"
    }
}
