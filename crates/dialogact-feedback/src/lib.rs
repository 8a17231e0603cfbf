#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Rating journal and retrospective reward analysis.
//!
//! Every rated choice of the dialogue policy can be appended to a JSON-lines
//! journal. The analyzer reads it back, aggregates rewards per action or per
//! state and points out actions the raters consistently score low. It only
//! reports; the value table is never touched from here.

use dialogact_core::Action;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

// Pattern detection thresholds
/// Minimum number of ratings for a specific action before it is judged
const PATTERN_MIN_RATINGS_PER_ACTION: usize = 5;
/// Share of exploratory rounds above which the journal is flagged as noisy
const PATTERN_EXPLORE_SHARE_THRESHOLD: f64 = 0.8;

/// Fallback timestamp when formatting fails
const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("journal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("rating record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("journal line {line} is not a rating record: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, FeedbackError>;

/// One rated choice of the policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    /// When the rating was given (RFC 3339)
    pub ts: String,
    pub state_id: usize,
    /// Rendered state, e.g. `[NULL, QUESTION_YES_NO]`
    pub state: String,
    pub action: Action,
    pub reward: i32,
    /// Exploration probability at the time of the choice
    pub anneal: f64,
    /// Whether the action was drawn at random rather than read off the table
    #[serde(default)]
    pub explored: bool,
}

impl RatingRecord {
    /// Record stamped with the current time.
    #[must_use]
    pub fn now(
        state_id: usize,
        state: impl Into<String>,
        action: Action,
        reward: i32,
        anneal: f64,
        explored: bool,
    ) -> Self {
        Self {
            ts: iso8601_now(),
            state_id,
            state: state.into(),
            action,
            reward,
            anneal,
            explored,
        }
    }
}

/// Appends `record` as one JSON line, creating the journal if needed.
pub fn append_record(path: &Path, record: &RatingRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let line = serde_json::to_string(record)?;
    writeln!(file, "{line}")?;
    Ok(())
}

/// Reads every record of a journal. Blank lines are skipped; any other line
/// that does not parse fails the whole read with its 1-based line number.
pub fn read_journal(path: &Path) -> Result<Vec<RatingRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| FeedbackError::Json {
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Rewards aggregated over a group of ratings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RewardStatistics {
    pub count: usize,
    pub explored: usize,
    pub total_reward: i64,
    pub min: Option<i32>,
    pub max: Option<i32>,
}

impl RewardStatistics {
    pub fn record(&mut self, reward: i32, explored: bool) {
        self.count += 1;
        if explored {
            self.explored += 1;
        }
        self.total_reward += i64::from(reward);
        self.min = Some(self.min.map_or(reward, |m| m.min(reward)));
        self.max = Some(self.max.map_or(reward, |m| m.max(reward)));
    }

    /// Average reward, `0.0` for an empty group.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.total_reward as f64 / self.count as f64
        }
    }

    /// Share of exploratory rounds (0.0 to 1.0).
    #[must_use]
    pub fn explore_share(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.explored as f64 / self.count as f64
        }
    }
}

/// Summarizes a rating journal.
#[derive(Debug)]
pub struct RatingAnalyzer {
    /// Minimum number of ratings before any pattern is reported
    min_ratings: usize,
    /// Mean reward below which an action counts as poorly received
    low_reward_threshold: f64,
}

impl Default for RatingAnalyzer {
    fn default() -> Self {
        Self {
            min_ratings: 10,
            low_reward_threshold: 2.5,
        }
    }
}

impl RatingAnalyzer {
    #[must_use]
    pub fn new(min_ratings: usize, low_reward_threshold: f64) -> Self {
        Self {
            min_ratings,
            low_reward_threshold,
        }
    }

    /// Aggregate ratings by a grouping key (e.g. action, state).
    #[must_use]
    pub fn aggregate(
        &self,
        records: &[RatingRecord],
        key_fn: impl Fn(&RatingRecord) -> Option<String>,
    ) -> BTreeMap<String, RewardStatistics> {
        let mut stats: BTreeMap<String, RewardStatistics> = BTreeMap::new();
        for record in records {
            if let Some(key) = key_fn(record) {
                stats
                    .entry(key)
                    .or_default()
                    .record(record.reward, record.explored);
            }
        }
        stats
    }

    #[must_use]
    pub fn by_action(&self, records: &[RatingRecord]) -> BTreeMap<String, RewardStatistics> {
        self.aggregate(records, |r| Some(r.action.name().to_string()))
    }

    #[must_use]
    pub fn by_state(&self, records: &[RatingRecord]) -> BTreeMap<String, RewardStatistics> {
        self.aggregate(records, |r| Some(r.state.clone()))
    }

    #[must_use]
    pub fn summarize(&self, records: &[RatingRecord]) -> RewardStatistics {
        let mut stats = RewardStatistics::default();
        for record in records {
            stats.record(record.reward, record.explored);
        }
        stats
    }

    /// Heuristic findings worth a rater's attention. Empty until the journal
    /// holds at least `min_ratings` records.
    #[must_use]
    pub fn analyze_patterns(&self, records: &[RatingRecord]) -> Vec<String> {
        let mut patterns = Vec::new();
        if records.len() < self.min_ratings {
            return patterns;
        }

        for (action, stats) in &self.by_action(records) {
            if stats.count >= PATTERN_MIN_RATINGS_PER_ACTION
                && stats.mean() < self.low_reward_threshold
            {
                patterns.push(format!(
                    "Low mean reward ({:.2}) for action '{}' over {} ratings",
                    stats.mean(),
                    action,
                    stats.count
                ));
            }
        }

        let overall = self.summarize(records);
        if overall.mean() < self.low_reward_threshold {
            patterns.push(format!("Overall mean reward is low ({:.2})", overall.mean()));
        }
        if overall.explore_share() > PATTERN_EXPLORE_SHARE_THRESHOLD {
            patterns.push(format!(
                "Most ratings ({:.1}%) scored random exploration",
                overall.explore_share() * 100.0
            ));
        }

        patterns
    }
}

/// Current UTC time in RFC 3339.
#[must_use]
pub fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rating(action: Action, state: &str, reward: i32, explored: bool) -> RatingRecord {
        RatingRecord::now(0, state, action, reward, 0.5, explored)
    }

    #[test]
    fn statistics_track_extremes_and_mean() {
        let mut stats = RewardStatistics::default();
        for (reward, explored) in [(4, true), (1, false), (5, false), (2, true)] {
            stats.record(reward, explored);
        }
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min, Some(1));
        assert_eq!(stats.max, Some(5));
        #[allow(clippy::float_cmp)]
        {
            assert_eq!(stats.mean(), 3.0);
            assert_eq!(stats.explore_share(), 0.5);
            assert_eq!(RewardStatistics::default().mean(), 0.0);
        }
    }

    #[test]
    fn analyzer_aggregates_by_action_and_state() {
        let analyzer = RatingAnalyzer::default();
        let records = vec![
            rating(Action::Thanks, "[NULL, THANKS]", 5, false),
            rating(Action::Thanks, "[NULL, STATEMENT]", 3, false),
            rating(Action::Apology, "[NULL, STATEMENT]", 1, true),
        ];

        let by_action = analyzer.by_action(&records);
        assert_eq!(by_action.len(), 2);
        assert_eq!(by_action["THANKS"].count, 2);
        assert_eq!(by_action["THANKS"].total_reward, 8);

        let by_state = analyzer.by_state(&records);
        assert_eq!(by_state["[NULL, STATEMENT]"].count, 2);
        assert_eq!(by_state["[NULL, STATEMENT]"].min, Some(1));
    }

    #[test]
    fn analyzer_flags_poorly_rated_actions() {
        let analyzer = RatingAnalyzer::default();
        let mut records: Vec<RatingRecord> = (0..6)
            .map(|_| rating(Action::QuestionWh, "[NULL, STATEMENT]", 1, false))
            .collect();
        records.extend((0..6).map(|_| rating(Action::Thanks, "[NULL, THANKS]", 5, false)));

        let patterns = analyzer.analyze_patterns(&records);
        assert_eq!(patterns.len(), 1, "{patterns:?}");
        assert!(patterns[0].contains("'QUESTION_WH'"));
    }

    #[test]
    fn analyzer_flags_overall_and_exploration() {
        let analyzer = RatingAnalyzer::new(3, 2.5);
        let records: Vec<RatingRecord> = (0..4)
            .map(|i| rating(Action::ALL[i], "[NULL, NULL]", 2, true))
            .collect();
        let patterns = analyzer.analyze_patterns(&records);
        assert!(patterns.iter().any(|p| p.contains("Overall mean reward is low")));
        assert!(patterns.iter().any(|p| p.contains("random exploration")));
    }

    #[test]
    fn analyzer_requires_minimum_ratings() {
        let analyzer = RatingAnalyzer::default();
        let records = vec![rating(Action::Statement, "[NULL, NULL]", 1, false)];
        assert!(analyzer.analyze_patterns(&records).is_empty());
    }

    #[test]
    fn journal_appends_and_reads_back() {
        let path = std::env::temp_dir()
            .join(format!("dialogact_journal_{}", std::process::id()))
            .join("ratings.jsonl");
        let _ = fs::remove_file(&path);

        let first = rating(Action::Welcome, "[THANKS, NULL]", 4, true);
        let second = rating(Action::Statement, "[NULL, STATEMENT]", 2, false);
        append_record(&path, &first).unwrap();
        append_record(&path, &second).unwrap();

        let records = read_journal(&path).unwrap();
        assert_eq!(records, vec![first, second]);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains(r#""action":"WELCOME""#));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn journal_reports_the_broken_line() {
        let path = std::env::temp_dir().join(format!(
            "dialogact_broken_journal_{}.jsonl",
            std::process::id()
        ));
        let good = serde_json::to_string(&rating(Action::Thanks, "[NULL, NULL]", 3, false))
            .unwrap();
        fs::write(&path, format!("{good}\n\n{{not json\n")).unwrap();

        match read_journal(&path) {
            Err(FeedbackError::Json { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected {other:?}"),
        }
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn records_without_explored_flag_still_parse() {
        let json = r#"{"ts":"2024-01-01T00:00:00Z","state_id":3,"state":"[NULL, NULL]","action":"THANKS","reward":5,"anneal":0.25}"#;
        let record: RatingRecord = serde_json::from_str(json).unwrap();
        assert!(!record.explored);
        assert_eq!(record.action, Action::Thanks);
    }
}
