//! Language registry: Single source of truth for per-language detection data.
//!
//! This module provides a centralized registry of every language the pipeline
//! can target. It uses a singleton pattern with `OnceLock` so the profiles are
//! built once and shared read-only by every request.

use crate::i18n::Language;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Detection and display metadata for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageProfile {
    /// The language this profile describes
    pub language: Language,

    /// Short language code (e.g., "ja", "vi")
    pub code: &'static str,

    /// English name, used when building prompts (e.g., "Vietnamese")
    pub name: &'static str,

    /// Native name of the language (e.g., "Tiếng Việt")
    pub native_name: &'static str,

    /// Script-range test. Languages written in the Latin alphabet have none
    /// and fall back to `hint_words`.
    pub script: Option<fn(char) -> bool>,

    /// Lowercase function words used for lexical detection
    pub hint_words: &'static [&'static str],

    /// Characteristic glyphs. When non-empty, an accepted candidate must
    /// contain at least one of them.
    pub glyphs: &'static str,
}

impl LanguageProfile {
    /// Whether `text` looks like it is (at least partly) in this language.
    pub fn matches(&self, text: &str) -> bool {
        if let Some(in_script) = self.script {
            return text.chars().any(in_script);
        }

        if self.has_glyph(text) {
            return true;
        }

        let lowered = text.to_lowercase();
        lowered
            .split(|c: char| !c.is_alphabetic())
            .filter(|token| !token.is_empty())
            .any(|token| self.hint_words.contains(&token))
    }

    /// Whether this language demands characteristic glyphs in its output.
    pub fn requires_glyphs(&self) -> bool {
        !self.glyphs.is_empty()
    }

    /// Whether `text` contains at least one characteristic glyph.
    pub fn has_glyph(&self, text: &str) -> bool {
        if self.glyphs.is_empty() {
            return false;
        }
        text.chars()
            .flat_map(char::to_lowercase)
            .any(|c| self.glyphs.contains(c))
    }
}

/// Japanese script ranges: kana, half-width katakana, the iteration and
/// closing marks, and CJK ideographs including the compatibility block and
/// the supplementary-plane extensions.
pub fn is_japanese_char(c: char) -> bool {
    matches!(
        c,
        '\u{3005}'..='\u{3007}'
            | '\u{3040}'..='\u{309F}'
            | '\u{30A0}'..='\u{30FF}'
            | '\u{31F0}'..='\u{31FF}'
            | '\u{FF66}'..='\u{FF9F}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2FA1F}'
            | '\u{30000}'..='\u{3134F}'
    )
}

/// Vietnamese letters outside plain ASCII, lowercase only.
const VIETNAMESE_GLYPHS: &str = "ăâđêôơư\
àáảãạằắẳẵặầấẩẫậ\
èéẻẽẹềếểễệ\
ìíỉĩị\
òóỏõọồốổỗộờớởỡợ\
ùúủũụừứửữự\
ỳýỷỹỵ";

const ENGLISH_HINTS: &[&str] = &[
    "the", "a", "an", "is", "are", "am", "was", "i", "you", "he", "she", "it", "we", "they",
    "my", "your", "to", "of", "and", "in", "on", "please", "thank", "thanks", "what", "where",
    "how", "can", "do", "does", "not", "this", "that",
];

const VIETNAMESE_HINTS: &[&str] = &[
    "toi", "ban", "khong", "la", "cua", "co", "va", "anh", "chi", "em", "duoc", "nay",
];

const TAGALOG_HINTS: &[&str] = &[
    "ang", "ng", "mga", "sa", "po", "ako", "ikaw", "ka", "siya", "kami", "kayo", "sila",
    "ito", "hindi", "oo", "opo", "salamat", "namin", "natin", "ba",
];

/// Registry of all language profiles.
///
/// Initialized once on first access and immutable thereafter.
pub struct LanguageRegistry {
    profiles: Vec<LanguageProfile>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            profiles: default_profiles(),
        })
    }

    /// Get the profile of a language.
    ///
    /// # Panics
    /// Panics if the registry was built without a profile for `language`,
    /// which is a programming error in `default_profiles`.
    pub fn profile(&self, language: Language) -> &LanguageProfile {
        self.profiles
            .iter()
            .find(|profile| profile.language == language)
            .unwrap_or_else(|| panic!("No profile registered for {:?}", language))
    }

    /// Every language whose heuristics match `text`.
    ///
    /// Latin-script text is frequently ambiguous, so several languages may
    /// match at once. Callers must not assume a single winner.
    pub fn detect(&self, text: &str) -> BTreeSet<Language> {
        self.profiles
            .iter()
            .filter(|profile| profile.matches(text))
            .map(|profile| profile.language)
            .collect()
    }

    /// English display name of a language.
    pub fn name(&self, language: Language) -> &'static str {
        self.profile(language).name
    }
}

fn default_profiles() -> Vec<LanguageProfile> {
    vec![
        LanguageProfile {
            language: Language::Ja,
            code: "ja",
            name: "Japanese",
            native_name: "日本語",
            script: Some(is_japanese_char),
            hint_words: &[],
            glyphs: "",
        },
        LanguageProfile {
            language: Language::En,
            code: "en",
            name: "English",
            native_name: "English",
            script: None,
            hint_words: ENGLISH_HINTS,
            glyphs: "",
        },
        LanguageProfile {
            language: Language::Vi,
            code: "vi",
            name: "Vietnamese",
            native_name: "Tiếng Việt",
            script: None,
            hint_words: VIETNAMESE_HINTS,
            glyphs: VIETNAMESE_GLYPHS,
        },
        LanguageProfile {
            language: Language::Tl,
            code: "tl",
            name: "Tagalog",
            native_name: "Filipino",
            script: None,
            hint_words: TAGALOG_HINTS,
            glyphs: "",
        },
    ]
}
