//! Output validation module.
//!
//! Decides whether a candidate produced by a provider is acceptable for a
//! target language. The checks are cheap heuristics tuned for precision:
//! a false reject only costs a retry, a false accept returns wrong-language
//! text to the user.

use crate::i18n::registry::is_japanese_char;
use crate::i18n::Language;
use serde::Serialize;
use std::fmt;

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// Nothing but whitespace
    Empty,
    /// Same text as the source once punctuation and whitespace are ignored
    Echo,
    /// Japanese characters leaked into a non-Japanese target
    WrongScript,
    /// None of the target language's characteristic glyphs appear
    MissingTargetMarkers,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RejectReason::Empty => "EMPTY",
            RejectReason::Echo => "ECHO",
            RejectReason::WrongScript => "WRONG_SCRIPT",
            RejectReason::MissingTargetMarkers => "MISSING_TARGET_MARKERS",
        };
        f.write_str(label)
    }
}

/// Result of validating one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationVerdict {
    pub accepted: bool,
    pub reason: Option<RejectReason>,
}

impl ValidationVerdict {
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    pub fn reject(reason: RejectReason) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
        }
    }
}

/// Sentence punctuation ignored by the echo comparison, ASCII and CJK forms.
const ECHO_PUNCTUATION: &str = ".,!?;:'\"()[]{}-…。、！？；：「」『』（）【】・～〜，．“”‘’";

/// Validator for provider output.
pub struct OutputValidator;

impl OutputValidator {
    /// Validate a candidate against its source text and target language.
    ///
    /// Rules run in order and the first failing rule decides the verdict:
    /// empty, echo, wrong script, missing target markers.
    pub fn validate(candidate: &str, source_text: &str, target: Language) -> ValidationVerdict {
        if candidate.trim().is_empty() {
            return ValidationVerdict::reject(RejectReason::Empty);
        }

        if Self::is_echo(candidate, source_text) {
            return ValidationVerdict::reject(RejectReason::Echo);
        }

        if target != Language::Ja && candidate.chars().any(is_japanese_char) {
            return ValidationVerdict::reject(RejectReason::WrongScript);
        }

        let profile = target.profile();
        if profile.requires_glyphs() && !profile.has_glyph(candidate) {
            return ValidationVerdict::reject(RejectReason::MissingTargetMarkers);
        }

        ValidationVerdict::accept()
    }

    /// Whether `candidate` is the source repeated back.
    ///
    /// Two punctuation-only texts both reduce to an empty key and count as
    /// an echo of each other.
    pub fn is_echo(candidate: &str, source_text: &str) -> bool {
        Self::echo_key(candidate) == Self::echo_key(source_text)
    }

    /// Lowercased text with whitespace and sentence punctuation removed.
    fn echo_key(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_whitespace() && !ECHO_PUNCTUATION.contains(*c))
            .flat_map(char::to_lowercase)
            .collect()
    }
}
