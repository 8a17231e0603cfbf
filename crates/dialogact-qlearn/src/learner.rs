//! Q-learning over the two-tag conversation state.
//!
//! The reward for an action is only known once the rater has scored it, and
//! the state it leads to only once the human has answered. Each call to
//! [`QLearner::decide`] therefore learns from the *previous* round's
//! [`Episode`] before choosing, and leaves a new episode for the next call.

use crate::codec;
use crate::error::{PolicyError, Result};
use crate::hyper::HyperParameters;
use crate::reward::{solicit_reward, RewardRange, RewardSource};
use crate::state::TagPairSpace;
use crate::table::QTable;
use dialogact_core::{Action, Conversation, DecisionMaker, DialogueActTag};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// One scored round: the action taken in a state and the rating it got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub state_id: usize,
    pub action: Action,
    pub reward: i32,
}

/// Why [`QLearner::decide`] returned what it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Why {
    /// Nothing has been said yet.
    Opening,
    /// The human said goodbye; say it back.
    Closing,
    Explore,
    Exploit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub why: Why,
    /// The scored round this decision produced. `None` for the opening and
    /// closing short-circuits, which are neither rated nor learned from.
    pub episode: Option<Episode>,
    /// Exploration probability at the time of the choice.
    pub anneal: f64,
}

/// Greedy choice for one state, see [`QLearner::policy`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyEntry {
    pub state_id: usize,
    pub state: String,
    pub action: Action,
    pub value: f64,
    pub visited: bool,
}

/// Tabular Q-learner choosing the agent's next [`Action`].
///
/// Not reentrant: one conversation at a time drives an instance.
#[derive(Debug)]
pub struct QLearner<R> {
    params: HyperParameters,
    states: TagPairSpace,
    table: QTable,
    episode: Option<Episode>,
    rewards: R,
    range: RewardRange,
    rng: StdRng,
}

impl<R: RewardSource> QLearner<R> {
    /// Learner over every dialogue-act tag with a zeroed table.
    pub fn new(params: HyperParameters, rewards: R) -> Self {
        Self::with_state_space(params, TagPairSpace::full(), rewards)
    }

    pub fn with_state_space(params: HyperParameters, states: TagPairSpace, rewards: R) -> Self {
        let table = QTable::new(states.num_states(), Action::COUNT);
        Self {
            params,
            states,
            table,
            episode: None,
            rewards,
            range: RewardRange::default(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Replaces the entropy-seeded generator with a deterministic one.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn with_reward_range(mut self, range: RewardRange) -> Self {
        self.range = range;
        self
    }

    pub fn params(&self) -> &HyperParameters {
        &self.params
    }

    pub fn states(&self) -> &TagPairSpace {
        &self.states
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn rewards(&self) -> &R {
        &self.rewards
    }

    pub fn rewards_mut(&mut self) -> &mut R {
        &mut self.rewards
    }

    /// The round waiting to be learned from on the next call.
    pub fn episode(&self) -> Option<Episode> {
        self.episode
    }

    /// Reinstates a pending round, e.g. one saved at the end of a session.
    pub fn restore_episode(&mut self, episode: Option<Episode>) -> Result<()> {
        if let Some(ep) = episode {
            if ep.state_id >= self.states.num_states() {
                return Err(PolicyError::IllegalState(format!(
                    "episode state {} outside {} states",
                    ep.state_id,
                    self.states.num_states()
                )));
            }
            if ep.action.is_null() {
                return Err(PolicyError::IllegalState(
                    "episode action must not be NULL".into(),
                ));
            }
        }
        self.episode = episode;
        Ok(())
    }

    /// Runs one round and returns the chosen action with its provenance.
    pub fn decide(&mut self, conversation: &Conversation) -> Result<Decision> {
        let anneal = self.params.anneal();
        if conversation.is_empty() {
            return Ok(Decision {
                action: Action::ConventionalOpening,
                why: Why::Opening,
                episode: None,
                anneal,
            });
        }

        self.states.turn_order().ensure_human_last(conversation)?;

        if conversation
            .last()
            .is_some_and(|turn| turn.tag == DialogueActTag::ConventionalClosing)
        {
            return Ok(Decision {
                action: Action::ConventionalClosing,
                why: Why::Closing,
                episode: None,
                anneal,
            });
        }

        let state_id = self.states.state_id(conversation)?;
        let state = self.states.id_to_state(state_id).unwrap_or_default();
        tracing::debug!(
            previous = ?self.episode,
            remaining = self.params.remaining_iters(),
            explore = self.params.explore(),
            anneal,
            state_id,
            %state,
            "starting round"
        );

        if let Some(previous) = self.episode.take() {
            self.update(previous, state_id);
        }

        let (action, why) = self.select(state_id);
        tracing::debug!(%action, ?why, "chose action");

        let reward = solicit_reward(&mut self.rewards, state_id, &state, action, self.range)?;
        let episode = Episode {
            state_id,
            action,
            reward,
        };
        self.episode = Some(episode);
        self.params.decrement();

        Ok(Decision {
            action,
            why,
            episode: Some(episode),
            anneal,
        })
    }

    /// Applies `Q[s][a] += anneal * (r + gamma * max Q[s'] - Q[s][a])` for the
    /// round `episode` that led to `next_state`.
    ///
    /// The annealing coefficient doubles as the learning rate.
    pub fn update(&mut self, episode: Episode, next_state: usize) {
        let alpha = self.params.anneal();
        let action = episode.action.ordinal();
        let current = self.table.get(episode.state_id, action);
        let future = self.table.best_value(next_state);
        let target = f64::from(episode.reward) + self.params.gamma() * future;
        let updated = current + alpha * (target - current);
        tracing::trace!(
            state_id = episode.state_id,
            action = %episode.action,
            current,
            updated,
            "value update"
        );
        self.table.set(episode.state_id, action, updated);
    }

    /// Explores or exploits until a non-NULL action comes up. The explore
    /// coin is tossed again on every retry.
    fn select(&mut self, state_id: usize) -> (Action, Why) {
        loop {
            if self.params.should_explore(&mut self.rng) {
                let action = self.explore();
                if !action.is_null() {
                    return (action, Why::Explore);
                }
            } else {
                return (self.exploit(state_id), Why::Exploit);
            }
        }
    }

    /// Uniform draw over every action, NULL included.
    fn explore(&mut self) -> Action {
        Action::ALL[self.rng.gen_range(0..Action::COUNT)]
    }

    /// First maximum of the state's row. The NULL column is skipped, which
    /// is exactly where a resample after picking NULL would end up.
    fn exploit(&self, state_id: usize) -> Action {
        self.table
            .best_action(state_id, |column| !Action::ALL[column].is_null())
            .and_then(Action::from_ordinal)
            .unwrap_or(Action::ALL[0])
    }

    /// Greedy action and its value for every state, in id order.
    pub fn policy(&self) -> Vec<PolicyEntry> {
        (0..self.states.num_states())
            .map(|state_id| {
                let action = self.exploit(state_id);
                PolicyEntry {
                    state_id,
                    state: self.states.id_to_state(state_id).unwrap_or_default(),
                    action,
                    value: self.table.get(state_id, action.ordinal()),
                    visited: self.table.is_visited(state_id),
                }
            })
            .collect()
    }

    pub fn save_to<W: Write>(&self, out: W) -> Result<()> {
        codec::write_table(out, &self.params, &self.table)
    }

    /// Replaces hyper-parameters and table with the ones in `input`.
    ///
    /// All or nothing: on error the learner is left exactly as it was.
    pub fn load_from<B: BufRead>(&mut self, input: B) -> Result<()> {
        let (params, table) =
            codec::read_table(input, self.states.num_states(), Action::COUNT)?;
        self.params = params;
        self.table = table;
        Ok(())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.save_to(BufWriter::new(file))?;
        tracing::info!(
            path = %path.display(),
            remaining = self.params.remaining_iters(),
            "saved value table"
        );
        Ok(())
    }

    pub fn load_from_path(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path)?;
        self.load_from(BufReader::new(file))?;
        tracing::info!(
            path = %path.display(),
            remaining = self.params.remaining_iters(),
            "loaded value table"
        );
        Ok(())
    }

    /// Writes the pending episode (or `null`) as JSON.
    pub fn save_episode(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &self.episode)?;
        Ok(())
    }

    /// Restores the pending episode written by [`Self::save_episode`].
    /// A missing file leaves the learner without one.
    pub fn load_episode(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return self.restore_episode(None);
        }
        let file = File::open(path)?;
        let episode: Option<Episode> = serde_json::from_reader(BufReader::new(file))?;
        self.restore_episode(episode)
    }
}

impl<R: RewardSource> DecisionMaker for QLearner<R> {
    type Error = PolicyError;

    fn get_action(&mut self, conversation: &Conversation) -> Result<Action> {
        self.decide(conversation).map(|decision| decision.action)
    }

    fn save(&self, out: &mut dyn Write) -> Result<()> {
        self.save_to(out)
    }

    fn load(&mut self, input: &mut dyn BufRead) -> Result<()> {
        self.load_from(input)
    }
}
