use crate::i18n::Language;

/// Fixed user-facing strings for a language
///
/// Every string here is authored directly in its language and never goes
/// through a provider, so these are always available even when every
/// provider is down.
#[derive(Debug, Clone)]
pub struct LanguageStrings {
    /// Suggestions offered when the provider fails or every generated
    /// suggestion was filtered out. Never empty.
    pub fallback_suggestions: &'static [&'static str],

    /// Reply used when the generated reply was banned and no intent matched
    pub clarifying_question: &'static str,

    /// Message returned when every provider failed with a transport error
    pub provider_failure: &'static str,
}

pub const JAPANESE_STRINGS: LanguageStrings = LanguageStrings {
    fallback_suggestions: &[
        "もう一度言ってください。",
        "ゆっくり話してください。",
        "ありがとうございます。",
    ],
    clarifying_question: "今どこにいますか？",
    provider_failure: "申し訳ありません。ただいま翻訳できません。しばらくしてからもう一度お試しください。",
};

pub const ENGLISH_STRINGS: LanguageStrings = LanguageStrings {
    fallback_suggestions: &[
        "Could you say that again?",
        "Please speak more slowly.",
        "Thank you.",
    ],
    clarifying_question: "Where are you now?",
    provider_failure: "Sorry, translation is unavailable right now. Please try again in a moment.",
};

pub const VIETNAMESE_STRINGS: LanguageStrings = LanguageStrings {
    fallback_suggestions: &[
        "Bạn có thể nói lại được không?",
        "Xin hãy nói chậm hơn.",
        "Cảm ơn bạn.",
    ],
    clarifying_question: "Bây giờ bạn đang ở đâu?",
    provider_failure: "Xin lỗi, hiện tại không thể dịch. Vui lòng thử lại sau.",
};

pub const TAGALOG_STRINGS: LanguageStrings = LanguageStrings {
    fallback_suggestions: &[
        "Pakiulit po?",
        "Pakibagalan po ang pagsasalita.",
        "Salamat po.",
    ],
    clarifying_question: "Nasaan ka ngayon?",
    provider_failure: "Paumanhin po, hindi makapagsalin ngayon. Pakisubukan ulit mamaya.",
};

impl Language {
    /// Fixed strings for this language.
    pub fn strings(&self) -> &'static LanguageStrings {
        match self {
            Language::Ja => &JAPANESE_STRINGS,
            Language::En => &ENGLISH_STRINGS,
            Language::Vi => &VIETNAMESE_STRINGS,
            Language::Tl => &TAGALOG_STRINGS,
        }
    }
}
