//! Deterministic classification of questions before they reach the model.
//!
//! Picking the governing section from free text stays with the language model. This module
//! only recognises the two shapes the answer template treats differently: a question that
//! names a section, and a question asking whether something is an offence.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

// "Section 302", "sec. 498A", "s. 376D", "section 120-B".
static SECTION_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:sections?|sec\.?|s\.)\s*(\d{1,3})(?:\s*-\s*)?([a-z]{0,2})\b")
        .expect("section reference pattern is valid")
});

// Questions opening with an auxiliary verb expect a yes or no.
static YES_NO_OPENING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:is|are|was|were|am|can|could|will|would|should|shall|does|do|did|has|have|had|may|might|must)\b",
    )
    .expect("yes/no pattern is valid")
});

// Words that make a yes/no question about legality rather than anything else.
static OFFENCE_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:illegal|unlawful|(?:legal|lawful|allowed|permitted)\s+(?:to|for)|offen[cs]es?|crimes?|criminal|punishable|punished|prohibited|forbidden|liable|guilty|jail|prison|arrested)\b",
    )
    .expect("offence cue pattern is valid")
});

/// How a question should shape the structured answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    /// The question names a section; that section is authoritative and no yes/no line is
    /// wanted.
    ExplicitSection {
        /// Normalised section number, e.g. `302` or `498A`.
        section: String,
    },
    /// The question asks whether an action is an offence.
    YesNo,
    /// Anything else.
    General,
}

impl QuestionKind {
    /// Classifies `question`. A named section wins over a yes/no opening.
    ///
    /// A question is [`YesNo`](Self::YesNo) only when it opens with an auxiliary verb
    /// and asks about legality, so "Can you explain theft?" stays general.
    #[must_use]
    pub fn classify(question: &str) -> Self {
        if let Some(captures) = SECTION_REFERENCE.captures(question) {
            let number = &captures[1];
            let suffix = captures.get(2).map_or("", |m| m.as_str());
            return Self::ExplicitSection {
                section: format!("{number}{}", suffix.to_ascii_uppercase()),
            };
        }
        if YES_NO_OPENING.is_match(question) && OFFENCE_CUE.is_match(question) {
            Self::YesNo
        } else {
            Self::General
        }
    }

    /// The section named by the question, if any.
    #[must_use]
    pub fn section(&self) -> Option<&str> {
        match self {
            Self::ExplicitSection { section } => Some(section),
            Self::YesNo | Self::General => None,
        }
    }

    /// Whether the answer should open with a yes/no line.
    #[must_use]
    pub const fn wants_verdict(&self) -> bool {
        matches!(self, Self::YesNo)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExplicitSection { section } => write!(f, "section {section}"),
            Self::YesNo => f.write_str("yes/no"),
            Self::General => f.write_str("general"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(s: &str) -> QuestionKind {
        QuestionKind::ExplicitSection {
            section: s.to_string(),
        }
    }

    #[test]
    fn named_sections_are_detected() {
        assert_eq!(QuestionKind::classify("What is Section 302 IPC?"), section("302"));
        assert_eq!(QuestionKind::classify("Explain section 498a"), section("498A"));
        assert_eq!(QuestionKind::classify("punishment under sec. 376D"), section("376D"));
        assert_eq!(QuestionKind::classify("What does s. 420 say?"), section("420"));
        assert_eq!(QuestionKind::classify("Section 120-B conspiracy"), section("120B"));
        assert_eq!(QuestionKind::classify("Section 302 is murder?"), section("302"));
    }

    #[test]
    fn named_section_beats_yes_no_opening() {
        assert_eq!(
            QuestionKind::classify("Is Section 497 still valid?"),
            section("497")
        );
    }

    #[test]
    fn offence_questions_want_a_verdict() {
        let kind = QuestionKind::classify("Is it illegal to trespass on a burial ground?");
        assert_eq!(kind, QuestionKind::YesNo);
        assert!(kind.wants_verdict());
        assert!(kind.section().is_none());
        assert_eq!(
            QuestionKind::classify("Can I be punished for hitting someone?"),
            QuestionKind::YesNo
        );
    }

    #[test]
    fn other_questions_are_general() {
        assert_eq!(
            QuestionKind::classify("What is the punishment for theft?"),
            QuestionKind::General
        );
        assert_eq!(
            QuestionKind::classify("This is about 302 people"),
            QuestionKind::General
        );
        assert_eq!(QuestionKind::classify("Island disputes"), QuestionKind::General);
    }

    #[test]
    fn yes_no_opening_without_legality_is_general() {
        for question in [
            "Can you explain the punishment for theft?",
            "Does IPC define legal guardianship?",
            "Do you know what cheating means?",
        ] {
            assert_eq!(QuestionKind::classify(question), QuestionKind::General, "{question}");
        }
        for question in [
            "Is it a crime to carry a knife?",
            "Is it legal to record a phone call?",
            "Would I go to jail for slapping someone?",
        ] {
            assert_eq!(QuestionKind::classify(question), QuestionKind::YesNo, "{question}");
        }
    }
}
