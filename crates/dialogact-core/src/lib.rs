//! Core vocabulary shared by the dialogact crates: dialogue-act tags, agent
//! actions, the conversation record and the traits at which the learning
//! policy meets its collaborators.

pub mod action;
pub mod conversation;
pub mod label;
pub mod tag;

pub use action::Action;
pub use conversation::{Conversation, Speaker, Turn};
pub use label::LabelError;
pub use tag::{split_coded, DialogueActTag};

use std::io::{BufRead, Write};

/// Anything that picks the agent's next action from the conversation so far.
///
/// Implementations assume the last turn was authored by the human.
pub trait DecisionMaker {
    type Error;

    fn get_action(&mut self, conversation: &Conversation) -> Result<Action, Self::Error>;
    fn save(&self, out: &mut dyn Write) -> Result<(), Self::Error>;
    fn load(&mut self, input: &mut dyn BufRead) -> Result<(), Self::Error>;
}

/// Language analysis: assigns a dialogue-act tag to an utterance.
pub trait TagClassifier {
    fn classify(&mut self, text: &str, conversation: &Conversation) -> DialogueActTag;
}

/// Text generation: realizes a chosen action as an utterance.
pub trait ResponseGenerator {
    fn generate(&mut self, conversation: &Conversation, action: Action) -> String;
}
