//! Discount factor and the exploration schedule.

use crate::error::{PolicyError, Result};
use rand::Rng;
use serde::Serialize;

/// `GAMMA`, the `EXPLORE` horizon and the iterations left in it.
///
/// The annealing coefficient is derived on demand as
/// `remaining_iters / explore`, so it can never drift from the counter. It
/// starts at `1.0` and reaches `0.0` after `explore` rounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HyperParameters {
    gamma: f64,
    remaining_iters: u32,
    explore: u32,
}

impl HyperParameters {
    /// Fresh schedule: all `explore` iterations still ahead.
    pub fn new(gamma: f64, explore: u32) -> Result<Self> {
        Self::restore(gamma, explore, explore)
    }

    /// Schedule resumed part-way, e.g. from a saved table.
    pub fn restore(gamma: f64, remaining_iters: u32, explore: u32) -> Result<Self> {
        if !(0.0..=1.0).contains(&gamma) {
            return Err(PolicyError::InvalidHyperParameters(format!(
                "gamma must lie in [0, 1], got {gamma}"
            )));
        }
        if explore == 0 {
            return Err(PolicyError::InvalidHyperParameters(
                "explore horizon must be positive".into(),
            ));
        }
        if remaining_iters > explore {
            return Err(PolicyError::InvalidHyperParameters(format!(
                "remaining iterations ({remaining_iters}) exceed the explore horizon ({explore})"
            )));
        }
        Ok(Self {
            gamma,
            remaining_iters,
            explore,
        })
    }

    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    #[must_use]
    pub fn explore(&self) -> u32 {
        self.explore
    }

    #[must_use]
    pub fn remaining_iters(&self) -> u32 {
        self.remaining_iters
    }

    /// Both the exploration probability and the learning rate.
    #[must_use]
    pub fn anneal(&self) -> f64 {
        f64::from(self.remaining_iters) / f64::from(self.explore)
    }

    /// Consumes one iteration of the horizon. Stops at zero.
    pub fn decrement(&mut self) {
        self.remaining_iters = self.remaining_iters.saturating_sub(1);
    }

    /// Draws whether this round explores, with probability [`Self::anneal`].
    pub fn should_explore<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen_range(0..self.explore) < self.remaining_iters
    }
}
