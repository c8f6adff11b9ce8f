//! Internationalization (i18n) module for multi-language support.
//!
//! Everything that depends on *which* language a text is in lives here:
//! detection heuristics, display names, output validation and the fixed
//! per-language phrase tables.
//!
//! # Architecture
//!
//! - `registry`: Per-language detection profiles (script ranges, hint words, glyphs)
//! - `language`: Closed `Language` enum parsed from short codes and BCP-47 tags
//! - `validator`: Acceptance check for provider output
//! - `phrases`: Banned phrases, intent patterns and canned replies
//! - `strings`: Fallback suggestions and other fixed user-facing strings
//!
//! # Example
//!
//! ```rust,ignore
//! use carebot_lingua::i18n::{Language, OutputValidator};
//!
//! let target = Language::from_code("vi-VN")?;
//! let verdict = OutputValidator::validate("Tôi muốn uống nước", "水が飲みたい", target);
//! assert!(verdict.accepted);
//! ```

mod language;
mod phrases;
mod registry;
mod strings;
mod validator;

pub use language::{Language, UnknownLanguage};
pub use phrases::{BannedPhraseConflict, BannedPhraseSet, CannedReplyTable, Intent};
pub use registry::{is_japanese_char, LanguageProfile, LanguageRegistry};
pub use strings::LanguageStrings;
pub use validator::{OutputValidator, RejectReason, ValidationVerdict};
