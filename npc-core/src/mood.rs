//! Mood labels and mood classification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The inferred mood of a player, as seen by the NPC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Friendly,
    Sad,
    Angry,
    Excited,
    Confused,
    #[default]
    Neutral,
}

impl Mood {
    /// Every label, in the order offered to the remote classifier.
    pub const ALL: [Mood; 6] = [
        Mood::Friendly,
        Mood::Sad,
        Mood::Angry,
        Mood::Excited,
        Mood::Confused,
        Mood::Neutral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Friendly => "friendly",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Excited => "excited",
            Mood::Confused => "confused",
            Mood::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mood label: {0:?}")]
pub struct UnknownMood(pub String);

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

/// Errors from a mood classifier. The caller keeps the previous mood.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("remote classification failed: {0}")]
    Remote(#[from] claude::Error),

    #[error("classifier returned an empty response")]
    EmptyResponse,

    #[error(transparent)]
    UnknownLabel(#[from] UnknownMood),
}

/// Infers a player's mood from one message.
///
/// Implementations don't touch player state; they only read the previous
/// mood. Committing the result is the caller's job.
#[async_trait]
pub trait MoodClassifier: Send + Sync {
    async fn classify(&self, message: &str, previous: Mood) -> Result<Mood, ClassifyError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: MoodClassifier + ?Sized> MoodClassifier for std::sync::Arc<T> {
    async fn classify(&self, message: &str, previous: Mood) -> Result<Mood, ClassifyError> {
        (**self).classify(message, previous).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Keyword matcher: friendly words win over hostile ones, and no match
/// leaves the mood where it was.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    friendly: Vec<String>,
    hostile: Vec<String>,
}

pub const FRIENDLY_KEYWORDS: [&str; 3] = ["help", "please", "thanks"];
pub const HOSTILE_KEYWORDS: [&str; 3] = ["stupid", "hate", "idiot"];

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(FRIENDLY_KEYWORDS, HOSTILE_KEYWORDS)
    }
}

impl KeywordClassifier {
    pub fn new<F, H>(friendly: F, hostile: H) -> Self
    where
        F: IntoIterator,
        F::Item: AsRef<str>,
        H: IntoIterator,
        H::Item: AsRef<str>,
    {
        let lower = |w: &str| w.to_lowercase();
        Self {
            friendly: friendly.into_iter().map(|w| lower(w.as_ref())).collect(),
            hostile: hostile.into_iter().map(|w| lower(w.as_ref())).collect(),
        }
    }

    /// The synchronous rule, shared by the trait impl.
    pub fn detect(&self, message: &str, previous: Mood) -> Mood {
        let text = message.to_lowercase();
        if self.friendly.iter().any(|w| text.contains(w.as_str())) {
            Mood::Friendly
        } else if self.hostile.iter().any(|w| text.contains(w.as_str())) {
            Mood::Angry
        } else {
            previous
        }
    }
}

#[async_trait]
impl MoodClassifier for KeywordClassifier {
    async fn classify(&self, message: &str, previous: Mood) -> Result<Mood, ClassifyError> {
        Ok(self.detect(message, previous))
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}
