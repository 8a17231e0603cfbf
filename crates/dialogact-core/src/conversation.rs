//! Append-only record of the turns exchanged between agent and human.

use crate::tag::DialogueActTag;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Agent,
    Human,
}

/// One utterance together with its dialogue-act tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub tag: DialogueActTag,
}

impl Turn {
    pub fn agent(text: impl Into<String>, tag: DialogueActTag) -> Self {
        Self {
            speaker: Speaker::Agent,
            text: text.into(),
            tag,
        }
    }

    pub fn human(text: impl Into<String>, tag: DialogueActTag) -> Self {
        Self {
            speaker: Speaker::Human,
            text: text.into(),
            tag,
        }
    }
}

/// The conversation so far. Turns can only be appended.
///
/// By convention the agent opens and the speakers alternate, so the human
/// authored every odd position. Policies decide for themselves whether to rely
/// on that convention or on [`Turn::speaker`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn push_agent(&mut self, text: impl Into<String>, tag: DialogueActTag) {
        self.push(Turn::agent(text, tag));
    }

    pub fn push_human(&mut self, text: impl Into<String>, tag: DialogueActTag) {
        self.push(Turn::human(text, tag));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Turn texts joined by newlines, oldest first.
    #[must_use]
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
