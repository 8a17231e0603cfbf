//! The Markov state: the human's last two dialogue acts.
//!
//! A conversation is viewed as
//!
//! ```text
//! t0  agent   opening
//! t1  human
//! t2  agent
//! t3  human   <- earlier
//! t4  agent
//! t5  human   <- later
//! ```
//!
//! and the state is the pair `(earlier, later)` of human tags, with
//! [`DialogueActTag::Null`] standing in for turns that have not happened yet.
//! [`TagPairSpace`] numbers every ordered pair densely so the pair can index a
//! row of the value table.

use crate::error::{PolicyError, Result};
use dialogact_core::{Conversation, DialogueActTag, Speaker};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct State {
    pub earlier: DialogueActTag,
    pub later: DialogueActTag,
}

impl State {
    pub const EMPTY: Self = Self {
        earlier: DialogueActTag::Null,
        later: DialogueActTag::Null,
    };

    #[must_use]
    pub const fn new(earlier: DialogueActTag, later: DialogueActTag) -> Self {
        Self { earlier, later }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.earlier, self.later)
    }
}

/// How human-authored turns are told apart from the agent's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnOrder {
    /// The agent opens and the speakers strictly alternate, so only the turn
    /// count matters: an odd count means the agent spoke last.
    #[default]
    AgentFirst,
    /// Each turn's recorded speaker decides. The human may open and may speak
    /// several times in a row; only the last turn has to be theirs.
    BySpeaker,
}

impl TurnOrder {
    /// Fails with [`PolicyError::IllegalState`] when the agent holds the turn.
    pub fn ensure_human_last(self, conversation: &Conversation) -> Result<()> {
        let agent_last = match self {
            Self::AgentFirst => conversation.len() % 2 == 1,
            Self::BySpeaker => conversation
                .last()
                .is_some_and(|turn| turn.speaker == Speaker::Agent),
        };
        if agent_last {
            return Err(PolicyError::IllegalState(format!(
                "the agent authored the last of {} turns",
                conversation.len()
            )));
        }
        Ok(())
    }

    /// The state the conversation is in right now.
    pub fn current_state(self, conversation: &Conversation) -> Result<State> {
        self.ensure_human_last(conversation)?;
        let turns = conversation.turns();
        let state = match self {
            Self::AgentFirst => {
                let n = turns.len();
                match n {
                    0 => State::EMPTY,
                    2 => State::new(DialogueActTag::Null, turns[1].tag),
                    _ => State::new(turns[n - 3].tag, turns[n - 1].tag),
                }
            }
            Self::BySpeaker => {
                let mut human = turns
                    .iter()
                    .rev()
                    .filter(|turn| turn.speaker == Speaker::Human)
                    .map(|turn| turn.tag);
                let later = human.next().unwrap_or(DialogueActTag::Null);
                let earlier = human.next().unwrap_or(DialogueActTag::Null);
                State::new(earlier, later)
            }
        };
        Ok(state)
    }
}

/// Dense numbering of all ordered tag pairs over a fixed tag set.
///
/// Ids are assigned with the first tag in the outer loop and the second in
/// the inner loop, both in the order the tags were given. That order is part
/// of the persisted table format.
#[derive(Debug, Clone)]
pub struct TagPairSpace {
    tags: Vec<DialogueActTag>,
    /// Position of each tag in `tags`, indexed by tag ordinal.
    slots: Vec<Option<usize>>,
    turn_order: TurnOrder,
}

impl Default for TagPairSpace {
    fn default() -> Self {
        Self::full()
    }
}

impl TagPairSpace {
    /// Space over every dialogue-act tag, in declaration order.
    #[must_use]
    pub fn full() -> Self {
        Self {
            tags: DialogueActTag::ALL.to_vec(),
            slots: (0..DialogueActTag::COUNT).map(Some).collect(),
            turn_order: TurnOrder::default(),
        }
    }

    /// Space over a subset of tags. The subset must contain
    /// [`DialogueActTag::Null`] and no tag twice.
    pub fn new(tags: &[DialogueActTag]) -> Result<Self> {
        if !tags.contains(&DialogueActTag::Null) {
            return Err(PolicyError::InvalidStateSpace(
                "tag set must contain NULL",
            ));
        }
        let mut slots = vec![None; DialogueActTag::COUNT];
        for (position, tag) in tags.iter().enumerate() {
            let slot = &mut slots[tag.ordinal()];
            if slot.is_some() {
                return Err(PolicyError::InvalidStateSpace("tag set contains duplicates"));
            }
            *slot = Some(position);
        }
        Ok(Self {
            tags: tags.to_vec(),
            slots,
            turn_order: TurnOrder::default(),
        })
    }

    #[must_use]
    pub fn with_turn_order(mut self, turn_order: TurnOrder) -> Self {
        self.turn_order = turn_order;
        self
    }

    #[must_use]
    pub fn turn_order(&self) -> TurnOrder {
        self.turn_order
    }

    #[must_use]
    pub fn tags(&self) -> &[DialogueActTag] {
        &self.tags
    }

    /// Always the square of the tag count.
    #[must_use]
    pub fn num_states(&self) -> usize {
        self.tags.len() * self.tags.len()
    }

    fn position(&self, tag: DialogueActTag) -> Result<usize> {
        self.slots[tag.ordinal()].ok_or(PolicyError::UnknownTag(tag))
    }

    pub fn encode(&self, state: State) -> Result<usize> {
        let earlier = self.position(state.earlier)?;
        let later = self.position(state.later)?;
        Ok(earlier * self.tags.len() + later)
    }

    #[must_use]
    pub fn decode(&self, id: usize) -> Option<State> {
        if id >= self.num_states() {
            return None;
        }
        let n = self.tags.len();
        Some(State::new(self.tags[id / n], self.tags[id % n]))
    }

    /// Printable form of the state behind `id`, `None` when out of range.
    #[must_use]
    pub fn id_to_state(&self, id: usize) -> Option<String> {
        self.decode(id).map(|state| state.to_string())
    }

    pub fn current_state(&self, conversation: &Conversation) -> Result<State> {
        self.turn_order.current_state(conversation)
    }

    /// Id of the state the conversation is in right now.
    ///
    /// Fails with [`PolicyError::IllegalState`] when the agent spoke last.
    pub fn state_id(&self, conversation: &Conversation) -> Result<usize> {
        self.encode(self.current_state(conversation)?)
    }
}
