//! Language type: closed set of languages the pipeline can target.

use crate::i18n::{LanguageProfile, LanguageRegistry};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A supported language.
///
/// Tagalog and Filipino share one variant; the codes `tl` and `fil` are
/// interchangeable on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Language {
    Ja,
    En,
    Vi,
    Tl,
}

/// Error returned when a language code is not supported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported language code: '{0}'")]
pub struct UnknownLanguage(pub String);

impl Language {
    /// Every supported language, in registry order.
    pub const ALL: [Language; 4] = [Language::Ja, Language::En, Language::Vi, Language::Tl];

    /// Parse a short code or BCP-47-like tag (e.g., "vi", "vi-VN", "fil-PH").
    ///
    /// Matching is case-insensitive and only the primary subtag is
    /// significant, so "en-GB" is English.
    pub fn from_code(code: &str) -> Result<Language, UnknownLanguage> {
        let trimmed = code.trim();
        let primary = trimmed
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match primary.as_str() {
            "ja" => Ok(Language::Ja),
            "en" => Ok(Language::En),
            "vi" => Ok(Language::Vi),
            "tl" | "fil" => Ok(Language::Tl),
            _ => Err(UnknownLanguage(trimmed.to_string())),
        }
    }

    /// Short language code (e.g., "ja").
    pub fn code(&self) -> &'static str {
        match self {
            Language::Ja => "ja",
            Language::En => "en",
            Language::Vi => "vi",
            Language::Tl => "tl",
        }
    }

    /// Detection and display profile from the registry.
    pub fn profile(&self) -> &'static LanguageProfile {
        LanguageRegistry::get().profile(*self)
    }

    /// English name of the language (e.g., "Vietnamese").
    pub fn name(&self) -> &'static str {
        self.profile().name
    }

    /// Native name of the language (e.g., "日本語").
    pub fn native_name(&self) -> &'static str {
        self.profile().native_name
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s)
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Language::from_code(&code).map_err(serde::de::Error::custom)
    }
}
