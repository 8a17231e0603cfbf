//! Response categories the agent may choose between.

use crate::label::labelled_enum;
use crate::tag::DialogueActTag;

labelled_enum! {
    /// What kind of utterance the agent should produce next.
    ///
    /// Like [`DialogueActTag`], the declaration order fixes the column layout
    /// of a persisted value table.
    pub enum Action as "action" {
        Apology = ("APOLOGY", "fa"),
        Backchannel = ("BACKCHANNEL", "b"),
        ConventionalClosing = ("CONVENTIONAL_CLOSING", "fc"),
        ConventionalOpening = ("CONVENTIONAL_OPENING", "fp"),
        QuestionYesNo = ("QUESTION_YES_NO", "qy"),
        QuestionWh = ("QUESTION_WH", "qw"),
        SignalNonUnderstanding = ("SIGNAL_NON_UNDERSTANDING", "br"),
        Statement = ("STATEMENT", "s"),
        SympatheticComment = ("SYMPATHETIC_COMMENT", "by"),
        Thanks = ("THANKS", "ft"),
        Welcome = ("WELCOME", "fw"),
        YesNoAnswer = ("YES_NO_ANSWER", "ayn"),
        /// Never returned by a policy. Occupies the last value-table column.
        Null = ("NULL", "null"),
    }
}

impl Action {
    #[must_use]
    pub const fn is_null(self) -> bool {
        matches!(self, Self::Null)
    }

    /// The dialogue-act tag an utterance realizing this action carries.
    ///
    /// `YesNoAnswer` has no single tag in the corpus set and `Null` has no
    /// utterance at all; both yield `None`.
    #[must_use]
    pub const fn dialogue_act(self) -> Option<DialogueActTag> {
        match self {
            Self::Apology => Some(DialogueActTag::Apology),
            Self::Backchannel => Some(DialogueActTag::Backchannel),
            Self::ConventionalClosing => Some(DialogueActTag::ConventionalClosing),
            Self::ConventionalOpening => Some(DialogueActTag::ConventionalOpening),
            Self::QuestionYesNo => Some(DialogueActTag::QuestionYesNo),
            Self::QuestionWh => Some(DialogueActTag::QuestionWh),
            Self::SignalNonUnderstanding => Some(DialogueActTag::SignalNonUnderstanding),
            Self::Statement => Some(DialogueActTag::Statement),
            Self::SympatheticComment => Some(DialogueActTag::SympatheticComment),
            Self::Thanks => Some(DialogueActTag::Thanks),
            Self::Welcome => Some(DialogueActTag::Welcome),
            Self::YesNoAnswer | Self::Null => None,
        }
    }
}
