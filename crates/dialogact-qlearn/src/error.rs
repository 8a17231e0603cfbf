use dialogact_core::DialogueActTag;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    /// The caller asked for a state or action while the agent holds the turn.
    #[error("Illegal conversation state: {0}")]
    IllegalState(String),
    #[error("Tag {0} is not part of the state space")]
    UnknownTag(DialogueActTag),
    #[error("Invalid state space: {0}")]
    InvalidStateSpace(&'static str),
    #[error("Invalid hyper-parameters: {0}")]
    InvalidHyperParameters(String),
    #[error("Malformed value table at line {line}: {reason}")]
    Format { line: usize, reason: String },
    #[error("Value table I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Reward channel closed before a valid rating was given")]
    RewardChannelClosed,
    #[error("Episode snapshot (de)serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PolicyError>;
