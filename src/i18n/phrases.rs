//! Banned phrases and canned replies.
//!
//! Both tables are immutable configuration shared by every request.

use crate::i18n::Language;

/// Generic direction phrases that must never be offered as a reply.
///
/// Languages are mixed on purpose: a provider asked for Vietnamese output
/// sometimes answers in English or Japanese anyway.
const DEFAULT_BANNED_PHRASES: &[&str] = &[
    "go straight",
    "turn left",
    "turn right",
    "follow the signs",
    "ask the staff",
    "まっすぐ行って",
    "まっすぐ進んで",
    "右に曲が",
    "左に曲が",
    "スタッフに聞いて",
    "đi thẳng",
    "rẽ trái",
    "rẽ phải",
    "hỏi nhân viên",
    "dumiretso",
    "kumaliwa",
    "kumanan",
];

/// Deny list of generic phrases, matched by substring.
///
/// Matching ignores case and all whitespace, so "Go  Straight." is caught by
/// "go straight". Substring containment can also catch a legitimate sentence
/// that happens to contain a phrase and misses paraphrases.
#[derive(Debug, Clone)]
pub struct BannedPhraseSet {
    keys: Vec<String>,
}

/// An extra banned phrase that would block one of the built-in replies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Banned phrase '{phrase}' would block the built-in reply '{reply}'")]
pub struct BannedPhraseConflict {
    pub phrase: String,
    pub reply: &'static str,
}

impl BannedPhraseSet {
    /// Build a set from the built-in phrases plus `extra`.
    ///
    /// Fallback suggestions, clarifying questions and canned replies are the
    /// last resort when provider output is banned, so an extra phrase that
    /// matches any of them is refused.
    pub fn with_extra<I, S>(extra: I) -> Result<Self, BannedPhraseConflict>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::built_in();
        for phrase in extra {
            let phrase = phrase.as_ref();
            let key = match_key(phrase);
            if key.is_empty() {
                continue;
            }
            if let Some(reply) = safe_replies().find(|reply| match_key(reply).contains(&key)) {
                return Err(BannedPhraseConflict {
                    phrase: phrase.trim().to_string(),
                    reply,
                });
            }
            set.keys.push(key);
        }
        set.keys.sort();
        set.keys.dedup();
        Ok(set)
    }

    fn built_in() -> Self {
        Self {
            keys: DEFAULT_BANNED_PHRASES.iter().map(|p| match_key(p)).collect(),
        }
    }

    /// Whether `text` contains any banned phrase.
    pub fn is_banned(&self, text: &str) -> bool {
        let key = match_key(text);
        self.keys.iter().any(|banned| key.contains(banned.as_str()))
    }

    pub fn phrase_count(&self) -> usize {
        self.keys.len()
    }
}

impl Default for BannedPhraseSet {
    fn default() -> Self {
        Self::built_in()
    }
}

/// Every fixed string the suggestion pipeline may fall back to.
fn safe_replies() -> impl Iterator<Item = &'static str> {
    Language::ALL.into_iter().flat_map(|language| {
        let strings = language.strings();
        strings
            .fallback_suggestions
            .iter()
            .copied()
            .chain(std::iter::once(strings.clarifying_question))
            .chain(
                Intent::ALL
                    .into_iter()
                    .map(move |intent| CannedReplyTable::reply(intent, language)),
            )
    })
}

fn match_key(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Conversational intent recognized in the last dialogue turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Thanks,
    Apology,
    RequestSlow,
}

const THANKS_PATTERNS: &[&str] = &[
    "thank", "ありがと", "感謝", "cảm ơn", "cám ơn", "salamat",
];

const APOLOGY_PATTERNS: &[&str] = &[
    "sorry", "apolog", "すみません", "ごめん", "申し訳", "xin lỗi", "pasensya", "paumanhin",
];

const SLOW_PATTERNS: &[&str] = &[
    "slow", "ゆっくり", "chậm", "dahan",
];

impl Intent {
    pub const ALL: [Intent; 3] = [Intent::Thanks, Intent::Apology, Intent::RequestSlow];

    /// Detect the intent of a dialogue turn.
    ///
    /// Patterns are checked in priority order: thanks, then apology, then a
    /// request to slow down.
    pub fn detect(text: &str) -> Option<Intent> {
        let lowered = text.to_lowercase();
        let contains_any = |patterns: &[&str]| patterns.iter().any(|p| lowered.contains(p));

        if contains_any(THANKS_PATTERNS) {
            Some(Intent::Thanks)
        } else if contains_any(APOLOGY_PATTERNS) {
            Some(Intent::Apology)
        } else if contains_any(SLOW_PATTERNS) {
            Some(Intent::RequestSlow)
        } else {
            None
        }
    }
}

/// Fixed replies keyed by intent and target language.
pub struct CannedReplyTable;

impl CannedReplyTable {
    pub fn reply(intent: Intent, language: Language) -> &'static str {
        match (intent, language) {
            (Intent::Thanks, Language::Ja) => "どういたしまして。",
            (Intent::Thanks, Language::En) => "You're welcome.",
            (Intent::Thanks, Language::Vi) => "Không có gì ạ.",
            (Intent::Thanks, Language::Tl) => "Walang anuman po.",
            (Intent::Apology, Language::Ja) => "大丈夫ですよ。",
            (Intent::Apology, Language::En) => "That's all right.",
            (Intent::Apology, Language::Vi) => "Không sao đâu ạ.",
            (Intent::Apology, Language::Tl) => "Ayos lang po.",
            (Intent::RequestSlow, Language::Ja) => "はい、ゆっくり話しますね。",
            (Intent::RequestSlow, Language::En) => "Sure, I'll speak more slowly.",
            (Intent::RequestSlow, Language::Vi) => "Vâng, tôi sẽ nói chậm hơn.",
            (Intent::RequestSlow, Language::Tl) => "Sige po, dahan-dahan akong magsasalita.",
        }
    }
}
