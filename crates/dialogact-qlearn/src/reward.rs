//! The reward channel: a rater scores each action the policy picks.
//!
//! Sources only deliver raw responses. Validation and re-prompting live in
//! [`solicit_reward`], so every source gets the same contract: a response is
//! either an integer inside the [`RewardRange`] or it is discarded and asked
//! for again. Nothing is clamped or defaulted.

use crate::error::{PolicyError, Result};
use dialogact_core::Action;
use std::collections::VecDeque;
use std::io::{self, Write};

/// Inclusive bounds for a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardRange {
    min: i32,
    max: i32,
}

impl Default for RewardRange {
    fn default() -> Self {
        Self { min: 1, max: 5 }
    }
}

impl RewardRange {
    /// `None` when `min > max`.
    #[must_use]
    pub fn new(min: i32, max: i32) -> Option<Self> {
        (min <= max).then_some(Self { min, max })
    }

    #[must_use]
    pub fn min(&self) -> i32 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> i32 {
        self.max
    }

    #[must_use]
    pub fn contains(&self, reward: i32) -> bool {
        (self.min..=self.max).contains(&reward)
    }

    /// The rating in `raw`, if it is a whole number inside the range.
    #[must_use]
    pub fn parse(&self, raw: &str) -> Option<i32> {
        raw.trim()
            .parse::<i32>()
            .ok()
            .filter(|reward| self.contains(*reward))
    }
}

/// What the rater is asked to score.
#[derive(Debug, Clone, Copy)]
pub struct RatingRequest<'a> {
    pub state_id: usize,
    pub state: &'a str,
    pub action: Action,
    pub range: RewardRange,
    /// Zero on the first ask, incremented after every rejected response.
    pub attempt: u32,
}

pub trait RewardSource {
    /// Blocks until the rater answers. `Ok(None)` means the channel is closed
    /// and no answer will ever come.
    fn request(&mut self, request: &RatingRequest<'_>) -> io::Result<Option<String>>;

    /// Called for every response that was not a valid rating.
    fn reject(&mut self, _response: &str, _range: RewardRange) {}
}

/// Asks `source` until it produces a valid rating.
pub fn solicit_reward<S: RewardSource + ?Sized>(
    source: &mut S,
    state_id: usize,
    state: &str,
    action: Action,
    range: RewardRange,
) -> Result<i32> {
    let mut attempt = 0;
    loop {
        let request = RatingRequest {
            state_id,
            state,
            action,
            range,
            attempt,
        };
        let Some(response) = source.request(&request)? else {
            return Err(PolicyError::RewardChannelClosed);
        };
        if let Some(reward) = range.parse(&response) {
            return Ok(reward);
        }
        tracing::warn!(
            response = %response.trim(),
            min = range.min(),
            max = range.max(),
            "discarding invalid rating"
        );
        source.reject(&response, range);
        attempt += 1;
    }
}

/// A human rater on stdin/stdout.
#[derive(Debug, Default)]
pub struct ConsoleRewardSource;

impl RewardSource for ConsoleRewardSource {
    fn request(&mut self, request: &RatingRequest<'_>) -> io::Result<Option<String>> {
        let mut stdout = io::stdout().lock();
        if request.attempt == 0 {
            writeln!(stdout, "===================================================")?;
            writeln!(stdout, "I am in state {}", request.state)?;
            writeln!(stdout, "I will respond with a {}", request.action)?;
            writeln!(
                stdout,
                "On a scale of {}-{}, how accurate is this response?",
                request.range.max(),
                request.range.min()
            )?;
        }
        stdout.flush()?;
        drop(stdout);

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn reject(&mut self, _response: &str, range: RewardRange) {
        println!(
            "Error: Please enter an integer between {} and {}",
            range.min(),
            range.max()
        );
    }
}

/// Replays canned responses in order, then reports the channel closed.
#[derive(Debug, Default)]
pub struct ScriptedRewardSource {
    responses: VecDeque<String>,
    requests: usize,
    rejected: Vec<String>,
}

impl ScriptedRewardSource {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, response: impl Into<String>) {
        self.responses.push_back(response.into());
    }

    /// How often the source was asked, rejected asks included.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests
    }

    #[must_use]
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses.len()
    }
}

impl RewardSource for ScriptedRewardSource {
    fn request(&mut self, _request: &RatingRequest<'_>) -> io::Result<Option<String>> {
        self.requests += 1;
        Ok(self.responses.pop_front())
    }

    fn reject(&mut self, response: &str, _range: RewardRange) {
        self.rejected.push(response.to_string());
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn range_parses_only_whole_numbers_inside_bounds() {
        let range = RewardRange::default();
        assert_eq!(range.parse("3"), Some(3));
        assert_eq!(range.parse(" 5\n"), Some(5));
        assert_eq!(range.parse("1"), Some(1));
        assert_eq!(range.parse("0"), None);
        assert_eq!(range.parse("6"), None);
        assert_eq!(range.parse("2.5"), None);
        assert_eq!(range.parse("four"), None);
        assert_eq!(range.parse(""), None);
        assert!(RewardRange::new(3, 2).is_none());
        assert_eq!(RewardRange::new(-2, 2).and_then(|r| r.parse("-2")), Some(-2));
    }

    #[test]
    fn malformed_responses_are_asked_again_without_penalty() {
        let mut source = ScriptedRewardSource::new(["abc", "9", "", "4", "2"]);
        let reward = solicit_reward(
            &mut source,
            7,
            "[NULL, STATEMENT]",
            Action::Statement,
            RewardRange::default(),
        )
        .expect("eventually valid");

        assert_eq!(reward, 4);
        assert_eq!(source.requests(), 4);
        assert_eq!(source.rejected(), ["abc", "9", ""]);
        assert_eq!(source.remaining(), 1);
    }

    #[test]
    fn closed_channel_is_an_error_not_a_default() {
        let mut source = ScriptedRewardSource::new(["x"]);
        let err = solicit_reward(
            &mut source,
            0,
            "[NULL, NULL]",
            Action::Thanks,
            RewardRange::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::RewardChannelClosed));
        assert_eq!(source.requests(), 2);
    }

    #[test]
    fn attempts_are_counted_per_solicitation() {
        struct Recorder(Vec<u32>);
        impl RewardSource for Recorder {
            fn request(&mut self, request: &RatingRequest<'_>) -> io::Result<Option<String>> {
                self.0.push(request.attempt);
                Ok(Some(if self.0.len() < 3 { "nope" } else { "5" }.to_string()))
            }
        }

        let mut recorder = Recorder(Vec::new());
        let reward = solicit_reward(
            &mut recorder,
            1,
            "[NULL, YES]",
            Action::Welcome,
            RewardRange::default(),
        )
        .expect("valid on third ask");
        assert_eq!(reward, 5);
        assert_eq!(recorder.0, vec![0, 1, 2]);
    }
}
