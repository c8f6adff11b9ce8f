use crate::error::PipelineError;
use crate::providers::{CompletionProvider, CompletionRequest};
use std::sync::Arc;
use tracing::warn;

pub const DEFAULT_EXPLANATION_LENGTH: usize = 30;
const MIN_EXPLANATION_LENGTH: usize = 10;
const MAX_EXPLANATION_LENGTH: usize = 200;

fn build_explain_prompt(term: &str, max_len: usize) -> String {
    format!(
        "以下の用語を高齢者にも分かるように日本語で{}文字以内で説明してください。\n用語: {}",
        max_len, term
    )
}

fn fallback_explanation(term: &str) -> String {
    format!("{}: かんたんな説明です", term)
}

/// Cut `text` to at most `max_chars` characters without splitting one.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Plain-Japanese explanations of care terms.
#[derive(Clone)]
pub struct TermExplainer {
    provider: Arc<dyn CompletionProvider>,
}

impl TermExplainer {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Explain `term` in at most `max_len` characters (clamped to 10..=200).
    pub async fn explain(&self, term: &str, max_len: Option<usize>) -> Result<String, PipelineError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(PipelineError::InvalidInput("用語が空です".to_string()));
        }
        let max_len = max_len
            .unwrap_or(DEFAULT_EXPLANATION_LENGTH)
            .clamp(MIN_EXPLANATION_LENGTH, MAX_EXPLANATION_LENGTH);

        let request = CompletionRequest::new(
            "あなたは介護の現場で使う言葉をやさしく説明する係です。",
            build_explain_prompt(term, max_len),
            0.2,
        );

        let explanation = match self.provider.complete(request).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => fallback_explanation(term),
            Err(e) => {
                warn!("Explanation of '{}' failed: {}", term, e);
                fallback_explanation(term)
            }
        };

        Ok(truncate_chars(&explanation, max_len).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::ScriptedCompletion;

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("誤嚥性肺炎", 2), "誤嚥");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[tokio::test]
    async fn test_explain_success() {
        let provider = Arc::new(ScriptedCompletion::replying(&["  食べ物が気管に入ることです。 "]));
        let explainer = TermExplainer::new(provider.clone());

        let result = explainer.explain("誤嚥", None).await.unwrap();

        assert_eq!(result, "食べ物が気管に入ることです。");
        let request = provider.request(0);
        assert!(request.user.contains("30文字以内"));
        assert!(request.user.contains("用語: 誤嚥"));
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_explain_empty_term_is_invalid() {
        let provider = Arc::new(ScriptedCompletion::replying(&["unused"]));
        let explainer = TermExplainer::new(provider.clone());

        let err = explainer.explain("   ", None).await.unwrap_err();

        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_explain_provider_failure_falls_back() {
        let explainer = TermExplainer::new(Arc::new(ScriptedCompletion::failing()));

        let result = explainer.explain("褥瘡", None).await.unwrap();

        assert_eq!(result, "褥瘡: かんたんな説明です");
    }

    #[tokio::test]
    async fn test_explain_clamps_and_truncates() {
        let long = "あ".repeat(50);
        let provider = Arc::new(ScriptedCompletion::replying(&[long.as_str()]));
        let explainer = TermExplainer::new(provider.clone());

        let result = explainer.explain("用語", Some(3)).await.unwrap();

        assert_eq!(result.chars().count(), MIN_EXPLANATION_LENGTH);
        assert!(provider.request(0).user.contains("10文字以内"));
    }
}
