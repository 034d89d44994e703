//! Test doubles for the classifier and generator seams.
//!
//! - `ScriptedClassifier` returns queued results in order
//! - `FailingClassifier` / `FailingReplier` always fail, for fallback paths
//! - `RecordingReplier` answers with a template and remembers every call

use crate::mood::{ClassifyError, Mood, MoodClassifier};
use crate::reply::{ReplyError, ReplyGenerator, TemplateReplier};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// A scripted classifier outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scripted {
    Mood(Mood),
    /// Simulate a failed call.
    Fail,
}

/// A classifier that returns scripted results in order.
///
/// Once the script runs out it keeps the previous mood.
#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    script: Mutex<VecDeque<Scripted>>,
}

impl ScriptedClassifier {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    /// Queue another outcome.
    pub async fn push(&self, outcome: Scripted) {
        self.script.lock().await.push_back(outcome);
    }

    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl MoodClassifier for ScriptedClassifier {
    async fn classify(&self, _message: &str, previous: Mood) -> Result<Mood, ClassifyError> {
        match self.script.lock().await.pop_front() {
            Some(Scripted::Mood(mood)) => Ok(mood),
            Some(Scripted::Fail) => Err(ClassifyError::EmptyResponse),
            None => Ok(previous),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// A classifier whose every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingClassifier;

#[async_trait]
impl MoodClassifier for FailingClassifier {
    async fn classify(&self, _message: &str, _previous: Mood) -> Result<Mood, ClassifyError> {
        Err(ClassifyError::Remote(claude::Error::Network(
            "connection refused".to_string(),
        )))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// A generator whose every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingReplier;

#[async_trait]
impl ReplyGenerator for FailingReplier {
    async fn generate(
        &self,
        _player_id: &str,
        _message: &str,
        _mood: Mood,
        _history: &[String],
    ) -> Result<String, ReplyError> {
        Err(ReplyError::Remote(claude::Error::Api {
            status: 529,
            message: "overloaded".to_string(),
        }))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// One call seen by [`RecordingReplier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyCall {
    pub player_id: String,
    pub message: String,
    pub mood: Mood,
    pub history: Vec<String>,
}

/// Template replies, plus a log of what the generator was asked.
#[derive(Debug, Default)]
pub struct RecordingReplier {
    calls: Mutex<Vec<ReplyCall>>,
}

impl RecordingReplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn calls(&self) -> Vec<ReplyCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ReplyGenerator for RecordingReplier {
    async fn generate(
        &self,
        player_id: &str,
        message: &str,
        mood: Mood,
        history: &[String],
    ) -> Result<String, ReplyError> {
        self.calls.lock().await.push(ReplyCall {
            player_id: player_id.to_string(),
            message: message.to_string(),
            mood,
            history: history.to_vec(),
        });
        Ok(TemplateReplier::render(message, mood))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
