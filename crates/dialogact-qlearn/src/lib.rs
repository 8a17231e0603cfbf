//! Tabular Q-learning policy choosing a dialogue agent's next response act.
//!
//! The state is the pair of the two most recent dialogue-act tags the human
//! produced ([`state`]). A dense value table ([`table`]) scores every action in
//! every state, and a human rater supplies the reward for each choice
//! ([`reward`]). [`QLearner`] ties these together and [`DialogueSession`] runs
//! whole conversations against it.
//!
//! ```no_run
//! use dialogact_core::{Conversation, DecisionMaker, DialogueActTag};
//! use dialogact_qlearn::{ConsoleRewardSource, HyperParameters, QLearner};
//!
//! # fn main() -> dialogact_qlearn::Result<()> {
//! let params = HyperParameters::new(0.1, 1000)?;
//! let mut policy = QLearner::new(params, ConsoleRewardSource);
//!
//! let mut convo = Conversation::new();
//! convo.push_agent("Hello!", DialogueActTag::ConventionalOpening);
//! convo.push_human("Do you like cats?", DialogueActTag::QuestionYesNo);
//! let action = policy.get_action(&convo)?;
//! println!("{action}");
//! # Ok(())
//! # }
//! ```

#![warn(clippy::unwrap_used, clippy::expect_used)]

pub mod codec;
pub mod error;
pub mod hyper;
pub mod learner;
pub mod reward;
pub mod session;
pub mod state;
pub mod table;

pub use error::{PolicyError, Result};
pub use hyper::HyperParameters;
pub use learner::{Decision, Episode, PolicyEntry, QLearner, Why};
pub use reward::{
    solicit_reward, ConsoleRewardSource, RatingRequest, RewardRange, RewardSource,
    ScriptedRewardSource,
};
pub use session::{DialogueSession, Reply};
pub use state::{State, TagPairSpace, TurnOrder};
pub use table::QTable;
