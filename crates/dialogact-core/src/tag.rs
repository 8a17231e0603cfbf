//! Switchboard dialogue-act tags observed on conversation turns.

use crate::label::labelled_enum;

labelled_enum! {
    /// Communicative function of a single utterance.
    ///
    /// The declaration order is part of the persisted value-table layout:
    /// state ids are derived from ordinals, so members must never be
    /// reordered, inserted or removed.
    pub enum DialogueActTag as "dialogue act tag" {
        AboutCommunication = ("ABOUT_COMMUNICATION", "^c"),
        AboutTask = ("ABOUT_TASK", "^t"),
        /// "ok", "i agree"
        Accept = ("ACCEPT", "aa"),
        AcceptPart = ("ACCEPT_PART", "aap"),
        /// "Oh, okay"
        AcknowledgeAnswer = ("ACKNOWLEDGE_ANSWER", "bk"),
        /// "Go ahead"
        ActionDirective = ("ACTION_DIRECTIVE", "ad"),
        Agreements = ("AGREEMENTS", "a"),
        /// "Well..."
        AnswerDispreferred = ("ANSWER_DISPREFERRED", "nd"),
        /// An apology proper, not the sympathetic "I'm sorry" (`by`).
        Apology = ("APOLOGY", "fa"),
        /// "I can imagine"
        AssessmentAppreciation = ("ASSESSMENT_APPRECIATION", "ba"),
        Backchannel = ("BACKCHANNEL", "b"),
        CollaborativeCompletion = ("COLLABORATIVE_COMPLETION", "^2"),
        Commit = ("COMMIT", "cc"),
        ConventionalClosing = ("CONVENTIONAL_CLOSING", "fc"),
        ConventionalOpening = ("CONVENTIONAL_OPENING", "fp"),
        Comment = ("COMMENT", "*"),
        ContinuedFromPrevious = ("CONTINUED_FROM_PREVIOUS", "+"),
        /// "uh-huh", "right". Shares the `b` code with [`Self::Backchannel`],
        /// so code lookup never yields this member.
        Continuer = ("CONTINUER", "b"),
        DeclarativeQuestion = ("DECLARATIVE_QUESTION", "^d"),
        DescriptiveAffirmativeAnswer = ("DESCRIPTIVE_AFFIRMATIVE_ANSWER", "na"),
        DescriptiveNegativeAnswer = ("DESCRIPTIVE_NEGATIVE_ANSWER", "ng"),
        /// "That's all right"
        DownplayingSympathy = ("DOWNPLAYING_SYMPATHY", "bd"),
        ElaboratedReplyYesNoQuestion = ("ELABORATED_REPLY_Y_N_QUESTION", "^e"),
        /// "Ouch"
        Exclamation = ("EXCLAMATION", "fe"),
        ExplicitPerformative = ("EXPLICIT_PERFORMATIVE", "fx"),
        ForwardLooking = ("FORWARD_LOOKING", "f"),
        /// "let me think"
        Hold = ("HOLD", "^h"),
        /// Neither yes nor no, often "I don't know".
        IndeterminateResponse = ("INDETERMINATE_RESPONSE", "no"),
        MimicOther = ("MIMIC_OTHER", "^m"),
        Maybe = ("MAYBE", "am"),
        NarrativeDescriptive = ("NARRATIVE_DESCRIPTIVE", "sd"),
        No = ("NO", "nn"),
        /// Placeholder for history that does not exist yet.
        Null = ("NULL", ""),
        Offer = ("OFFER", "co"),
        /// "We could have lamb or chicken"
        OpenOption = ("OPEN_OPTION", "oo"),
        Other = ("OTHER", "o"),
        Question = ("QUESTION", "q"),
        QuestionAlternative = ("QUESTION_ALTERNATIVE", "qr"),
        QuestionOpenEnded = ("QUESTION_OPEN_ENDED", "qo"),
        QuestionRhetorical = ("QUESTION_RHETORICAL", "qh"),
        QuestionWh = ("QUESTION_WH", "qw"),
        QuestionYesNo = ("QUESTION_YES_NO", "qy"),
        QuestionYesNoOr = ("QUESTION_YES_NO_OR", "qrr"),
        Quotation = ("QUOTATION", "^q"),
        ReformulateSummarize = ("REFORMULATE_SUMMARIZE", "bf"),
        Reject = ("REJECT", "ar"),
        RejectPart = ("REJECT_PART", "arp"),
        Statement = ("STATEMENT", "s"),
        SignalNonUnderstanding = ("SIGNAL_NON_UNDERSTANDING", "br"),
        /// "I'm sorry to hear about that"
        SympatheticComment = ("SYMPATHETIC_COMMENT", "by"),
        TagQuestion = ("TAG_QUESTION", "^g"),
        /// "Thank you"
        Thanks = ("THANKS", "ft"),
        Viewpoint = ("VIEWPOINT", "sv"),
        /// "You're welcome"
        Welcome = ("WELCOME", "fw"),
        Yes = ("YES", "ny"),
    }
}

impl Default for DialogueActTag {
    fn default() -> Self {
        Self::Null
    }
}

/// Splits an annotated line such as `qy: do you like cats?` into the tag
/// code and the utterance. A line without `:` is all code.
#[must_use]
pub fn split_coded(line: &str) -> (&str, &str) {
    match line.split_once(':') {
        Some((code, text)) => (code.trim(), text.trim()),
        None => (line.trim(), ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::LabelError;
    use std::collections::HashSet;

    #[test]
    fn coded_lines_split_at_the_first_colon() {
        assert_eq!(split_coded("qy: do you like cats?"), ("qy", "do you like cats?"));
        assert_eq!(split_coded(" s "), ("s", ""));
        assert_eq!(split_coded("sd: time: noon"), ("sd", "time: noon"));
    }

    #[test]
    fn enumeration_has_fifty_five_members_with_unique_names() {
        assert_eq!(DialogueActTag::COUNT, 55);
        let names: HashSet<_> = DialogueActTag::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), DialogueActTag::COUNT);
    }

    #[test]
    fn ordinals_follow_declaration_order() {
        for (i, tag) in DialogueActTag::ALL.iter().enumerate() {
            assert_eq!(tag.ordinal(), i);
            assert_eq!(DialogueActTag::from_ordinal(i), Some(*tag));
        }
        assert_eq!(DialogueActTag::from_ordinal(DialogueActTag::COUNT), None);
        assert_eq!(DialogueActTag::Null.ordinal(), 32);
    }

    #[test]
    fn code_lookup_is_case_insensitive_and_prefers_first_declared() {
        assert_eq!(
            DialogueActTag::from_code("QY"),
            Ok(DialogueActTag::QuestionYesNo)
        );
        assert_eq!(DialogueActTag::from_code("b"), Ok(DialogueActTag::Backchannel));
        assert_eq!(DialogueActTag::from_code(""), Ok(DialogueActTag::Null));
        assert_eq!(" ^c ".parse::<DialogueActTag>(), Ok(DialogueActTag::AboutCommunication));
    }

    #[test]
    fn unknown_code_is_reported_not_panicked() {
        let err = DialogueActTag::from_code("zz").unwrap_err();
        assert_eq!(
            err,
            LabelError::UnknownCode {
                kind: "dialogue act tag",
                code: "zz".into()
            }
        );
        assert!(err.to_string().contains("\"zz\""));
    }

    #[test]
    fn name_lookup_and_display_agree() {
        for tag in DialogueActTag::ALL {
            assert_eq!(DialogueActTag::from_name(&tag.to_string()), Ok(*tag));
        }
        assert!(DialogueActTag::from_name("QUESTION_MAYBE").is_err());
    }

    #[test]
    fn serializes_by_name() {
        let json = serde_json::to_string(&DialogueActTag::QuestionWh).expect("serialize");
        assert_eq!(json, "\"QUESTION_WH\"");
        let back: DialogueActTag = serde_json::from_str("\"NULL\"").expect("deserialize");
        assert_eq!(back, DialogueActTag::Null);
    }
}
