//! Dense state × action value table.

/// Row-major `num_states × num_actions` matrix stored in one flat buffer,
/// cell `(s, a)` at `s * num_actions + a`.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    num_states: usize,
    num_actions: usize,
    values: Vec<f64>,
}

impl QTable {
    /// All-zero table.
    #[must_use]
    pub fn new(num_states: usize, num_actions: usize) -> Self {
        Self {
            num_states,
            num_actions,
            values: vec![0.0; num_states * num_actions],
        }
    }

    /// Table over an existing buffer. `None` when the buffer length does not
    /// match the dimensions.
    #[must_use]
    pub fn from_values(num_states: usize, num_actions: usize, values: Vec<f64>) -> Option<Self> {
        (values.len() == num_states * num_actions).then_some(Self {
            num_states,
            num_actions,
            values,
        })
    }

    #[must_use]
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    #[must_use]
    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn index(&self, state: usize, action: usize) -> usize {
        debug_assert!(state < self.num_states, "state {state} out of range");
        debug_assert!(action < self.num_actions, "action {action} out of range");
        state * self.num_actions + action
    }

    #[must_use]
    pub fn get(&self, state: usize, action: usize) -> f64 {
        self.values[self.index(state, action)]
    }

    pub fn set(&mut self, state: usize, action: usize, value: f64) {
        let i = self.index(state, action);
        self.values[i] = value;
    }

    #[must_use]
    pub fn row(&self, state: usize) -> &[f64] {
        let start = self.index(state, 0);
        &self.values[start..start + self.num_actions]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.num_actions.max(1))
    }

    /// `max_a Q[state][a]` over every column.
    #[must_use]
    pub fn best_value(&self, state: usize) -> f64 {
        self.row(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Column of the first maximum among the columns `allowed` accepts, or
    /// `None` when it accepts none.
    pub fn best_action(&self, state: usize, allowed: impl Fn(usize) -> bool) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (action, &value) in self.row(state).iter().enumerate() {
            if !allowed(action) {
                continue;
            }
            if best.map_or(true, |(_, top)| value > top) {
                best = Some((action, value));
            }
        }
        best.map(|(action, _)| action)
    }

    /// Whether any cell of the row has moved off zero.
    #[must_use]
    pub fn is_visited(&self, state: usize) -> bool {
        self.row(state).iter().any(|&v| v != 0.0)
    }
}
