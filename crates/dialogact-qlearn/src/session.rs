//! The dialogue loop around a [`QLearner`].

use crate::error::Result;
use crate::learner::{Decision, QLearner};
use crate::reward::RewardSource;
use dialogact_core::{
    Action, Conversation, DialogueActTag, ResponseGenerator, TagClassifier,
};

/// What the agent said in one round and why.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub decision: Decision,
    pub text: String,
}

/// Drives one conversation: tags human input, asks the policy for an
/// action, realizes it as text and records both turns.
///
/// The session is over once the agent has said goodbye.
#[derive(Debug)]
pub struct DialogueSession<C, G, R> {
    classifier: C,
    generator: G,
    policy: QLearner<R>,
    conversation: Conversation,
    over: bool,
}

impl<C, G, R> DialogueSession<C, G, R>
where
    C: TagClassifier,
    G: ResponseGenerator,
    R: RewardSource,
{
    pub fn new(classifier: C, generator: G, policy: QLearner<R>) -> Self {
        Self {
            classifier,
            generator,
            policy,
            conversation: Conversation::new(),
            over: false,
        }
    }

    /// The agent's opening line, before the human has said anything.
    pub fn open(&mut self) -> Result<Reply> {
        let conversation = self.conversation.clone();
        self.take_turn(conversation)
    }

    /// Tags `text` with the classifier and answers it.
    pub fn respond(&mut self, text: &str) -> Result<Reply> {
        let tag = self.classifier.classify(text, &self.conversation);
        self.respond_tagged(text, tag)
    }

    /// Answers a human turn whose tag is already known.
    ///
    /// The human turn is only recorded once the round succeeds, so a failed
    /// round leaves the conversation as it was and the turn can be retried.
    pub fn respond_tagged(&mut self, text: &str, tag: DialogueActTag) -> Result<Reply> {
        let mut conversation = self.conversation.clone();
        conversation.push_human(text, tag);
        self.take_turn(conversation)
    }

    fn take_turn(&mut self, conversation: Conversation) -> Result<Reply> {
        let decision = self.policy.decide(&conversation)?;
        self.conversation = conversation;
        let text = self.generator.generate(&self.conversation, decision.action);
        let tag = self.agent_tag(&text, decision.action);
        self.conversation.push_agent(text.clone(), tag);
        if decision.action == Action::ConventionalClosing {
            self.over = true;
        }
        tracing::debug!(turns = self.conversation.len(), %tag, "agent turn recorded");
        Ok(Reply { decision, text })
    }

    fn agent_tag(&mut self, text: &str, action: Action) -> DialogueActTag {
        action
            .dialogue_act()
            .unwrap_or_else(|| self.classifier.classify(text, &self.conversation))
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn policy(&self) -> &QLearner<R> {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut QLearner<R> {
        &mut self.policy
    }

    /// Ends the session and hands the learner back, with the last round
    /// still pending as its episode.
    pub fn finish(self) -> QLearner<R> {
        self.policy
    }
}
