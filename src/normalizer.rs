use crate::i18n::Language;
use crate::providers::{CompletionProvider, CompletionRequest};
use std::sync::Arc;
use tracing::{debug, warn};

/// Quote pairs stripped from normalized output, one layer only.
const QUOTE_PAIRS: &[(char, char)] = &[
    ('"', '"'),
    ('\'', '\''),
    ('“', '”'),
    ('‘', '’'),
    ('「', '」'),
    ('『', '』'),
];

fn build_normalize_system_prompt(target: Language) -> String {
    format!(
        "Rewrite the user's text so that it is entirely in {name}. \
         Output only normalized {name}, no explanations, no quotes.",
        name = target.name()
    )
}

/// Strip one layer of surrounding quotation marks, if present.
pub fn strip_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return trimmed;
    };

    if QUOTE_PAIRS.contains(&(first, last)) {
        trimmed[first.len_utf8()..trimmed.len() - last.len_utf8()].trim()
    } else {
        trimmed
    }
}

/// Final pass coercing free text into a single target language.
///
/// Normalization is a best-effort polish: provider failures leave the text
/// untouched.
#[derive(Clone)]
pub struct LanguageNormalizer {
    provider: Arc<dyn CompletionProvider>,
}

impl LanguageNormalizer {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    pub async fn normalize(&self, text: &str, target: Language) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        let request = CompletionRequest::new(build_normalize_system_prompt(target), text, 0.0);
        match self.provider.complete(request).await {
            Ok(output) => {
                let normalized = strip_quotes(&output);
                if normalized.is_empty() {
                    debug!("Normalization to {} returned nothing, keeping input", target.name());
                    text.to_string()
                } else {
                    normalized.to_string()
                }
            }
            Err(e) => {
                warn!("Normalization to {} failed, keeping input: {}", target.name(), e);
                text.to_string()
            }
        }
    }
}
