//! Per-player conversational state for one run.

use crate::mood::{Mood, MoodClassifier};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

/// How many recent messages are remembered per player.
pub const HISTORY_CAPACITY: usize = 3;

/// Fixed-capacity FIFO of a player's most recent messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl History {
    /// A capacity of zero is bumped to one; the current message is always kept.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a message, evicting the oldest when full.
    pub fn push(&mut self, text: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(text.into());
    }

    /// Entries oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// What the NPC remembers about one player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerState {
    pub history: History,
    pub mood: Mood,
}

/// Result of folding one message into a player's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub previous_mood: Mood,
    pub mood: Mood,
    /// History after the message was appended, oldest first.
    pub history: Vec<String>,
}

/// All player states seen in a run, created on first sight of each id.
#[derive(Debug, Default)]
pub struct PlayerBook {
    players: HashMap<String, PlayerState>,
}

impl PlayerBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a player, creating a fresh state the first time.
    pub fn entry(&mut self, player_id: &str) -> &mut PlayerState {
        match self.players.entry(player_id.to_string()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                tracing::debug!(player_id, "new player");
                e.insert(PlayerState::default())
            }
        }
    }

    pub fn get(&self, player_id: &str) -> Option<&PlayerState> {
        self.players.get(player_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Fold one message into the player's state.
    ///
    /// The message is appended to history before the classifier runs, and
    /// the new mood is committed before returning. If the classifier fails
    /// the previous mood stays and the failure is logged.
    pub async fn update(
        &mut self,
        player_id: &str,
        text: &str,
        classifier: &dyn MoodClassifier,
    ) -> Update {
        let state = self.entry(player_id);
        state.history.push(text);

        let previous_mood = state.mood;
        let mood = match classifier.classify(text, previous_mood).await {
            Ok(mood) => mood,
            Err(e) => {
                tracing::warn!(
                    player_id,
                    classifier = classifier.name(),
                    error = %e,
                    "mood classification failed, keeping {previous_mood}"
                );
                previous_mood
            }
        };
        state.mood = mood;

        Update {
            previous_mood,
            mood,
            history: state.history.snapshot(),
        }
    }
}
