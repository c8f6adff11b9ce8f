use crate::i18n::{BannedPhraseSet, CannedReplyTable, Intent, Language};
use crate::normalizer::LanguageNormalizer;
use crate::providers::{CompletionProvider, CompletionRequest};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Number of trailing dialogue turns kept as context.
pub const CONTEXT_WINDOW: usize = 6;
pub const DEFAULT_SUGGESTION_COUNT: usize = 3;
pub const MAX_SUGGESTION_COUNT: usize = 5;

/// One line of the conversation so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub speaker: String,
    pub text: String,
    /// Free-form language tag as sent by the client
    #[serde(default)]
    pub lang: String,
}

impl DialogueTurn {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            lang: lang.into(),
        }
    }
}

/// Trailing dialogue context, at most [`CONTEXT_WINDOW`] turns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionContext {
    turns: Vec<DialogueTurn>,
}

impl SuggestionContext {
    pub fn new(mut turns: Vec<DialogueTurn>) -> Self {
        if turns.len() > CONTEXT_WINDOW {
            turns.drain(..turns.len() - CONTEXT_WINDOW);
        }
        Self { turns }
    }

    pub fn turns(&self) -> &[DialogueTurn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&DialogueTurn> {
        self.turns.last()
    }

    fn render(&self) -> String {
        if self.turns.is_empty() {
            return "(no conversation yet)".to_string();
        }
        self.turns
            .iter()
            .map(|turn| {
                if turn.lang.is_empty() {
                    format!("{}: {}", turn.speaker, turn.text)
                } else {
                    format!("{} [{}]: {}", turn.speaker, turn.lang, turn.text)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What the candidates are for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestMode {
    /// Things the last speaker could say next
    #[default]
    Suggest,
    /// The best response to the last turn
    Reply,
}

#[derive(Debug, Clone)]
pub struct SuggestRequest {
    pub context: SuggestionContext,
    pub target: Language,
    pub count: usize,
    pub mode: SuggestMode,
}

impl SuggestRequest {
    /// `count` is clamped to `1..=MAX_SUGGESTION_COUNT`, defaulting to
    /// [`DEFAULT_SUGGESTION_COUNT`].
    pub fn new(
        turns: Vec<DialogueTurn>,
        target: Language,
        count: Option<usize>,
        mode: SuggestMode,
    ) -> Self {
        Self {
            context: SuggestionContext::new(turns),
            target,
            count: count
                .unwrap_or(DEFAULT_SUGGESTION_COUNT)
                .clamp(1, MAX_SUGGESTION_COUNT),
            mode,
        }
    }
}

/// Output of the suggestion pipeline. `suggestions` is never empty and
/// `reply` is never empty nor banned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    pub suggestions: Vec<String>,
    pub reply: String,
}

#[derive(Debug, Deserialize)]
struct RawSuggestions {
    #[serde(default)]
    reply: String,
    #[serde(default)]
    suggestions: Vec<String>,
}

fn code_fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("code fence regex is valid")
    })
}

/// Remove a surrounding markdown code fence, if any.
fn strip_code_fences(text: &str) -> &str {
    match code_fence_regex().captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

fn parse_suggestions(output: &str) -> Result<RawSuggestions, serde_json::Error> {
    serde_json::from_str(strip_code_fences(output))
}

fn build_suggest_system_prompt(target: Language, count: usize, mode: SuggestMode) -> String {
    let task = match mode {
        SuggestMode::Suggest => format!(
            "Propose {} short things the last speaker could say next.",
            count
        ),
        SuggestMode::Reply => format!(
            "Propose the best response to the last line, plus {} short alternatives.",
            count
        ),
    };

    format!(
        "You help care workers and elderly residents talk with each other.\n\
         {task}\n\
         Rules:\n\
         - Write every string in {lang} only.\n\
         - Keep each string short, polite and easy to say aloud.\n\
         - Never give walking directions.\n\
         Answer with JSON only, no markdown: {{\"reply\": \"...\", \"suggestions\": [\"...\"]}}",
        task = task,
        lang = target.name()
    )
}

/// Generates reply and suggestion candidates for a dialogue.
#[derive(Clone)]
pub struct SuggestionPipeline {
    provider: Arc<dyn CompletionProvider>,
    normalizer: LanguageNormalizer,
    banned: Arc<BannedPhraseSet>,
}

impl SuggestionPipeline {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        normalizer: LanguageNormalizer,
        banned: Arc<BannedPhraseSet>,
    ) -> Self {
        Self {
            provider,
            normalizer,
            banned,
        }
    }

    /// Produce suggestions for `request`. Never fails: provider trouble
    /// degrades to the fixed per-language fallback list.
    pub async fn suggest(&self, request: &SuggestRequest) -> Suggestions {
        let target = request.target;
        let completion = CompletionRequest::new(
            build_suggest_system_prompt(target, request.count, request.mode),
            request.context.render(),
            0.7,
        );

        let raw = match self.provider.complete(completion).await {
            Ok(output) => match parse_suggestions(&output) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Suggestion output for {} was not valid JSON: {}", target, e);
                    return fallback(target, request.count);
                }
            },
            Err(e) => {
                warn!("Suggestion provider failed for {}: {}", target, e);
                return fallback(target, request.count);
            }
        };

        let filtered = self.filter(raw, request);
        let normalized = self.normalize(filtered, request).await;

        info!(
            "Generated {} suggestion(s) in {}",
            normalized.suggestions.len(),
            target
        );
        normalized
    }

    /// Ban filter plus contextual replacement of the reply and empty lists.
    fn filter(&self, raw: RawSuggestions, request: &SuggestRequest) -> Suggestions {
        let target = request.target;

        let mut suggestions: Vec<String> = Vec::new();
        for candidate in raw.suggestions {
            let candidate = candidate.trim();
            if candidate.is_empty() {
                continue;
            }
            if self.banned.is_banned(candidate) {
                debug!("Dropping banned suggestion: {}", candidate);
                continue;
            }
            if !suggestions.iter().any(|s| s == candidate) {
                suggestions.push(candidate.to_string());
            }
        }

        let reply = raw.reply.trim();
        let reply = if reply.is_empty() || self.banned.is_banned(reply) {
            debug!("Replacing unusable reply: {:?}", reply);
            contextual_reply(&request.context, target).to_string()
        } else {
            reply.to_string()
        };

        if suggestions.is_empty() {
            suggestions = fallback_list(target, usize::MAX);
        }

        Suggestions { suggestions, reply }
    }

    /// Normalize the reply and at most `request.count` suggestions, so one
    /// request costs no more than `count + 1` normalizer calls.
    async fn normalize(&self, mut filtered: Suggestions, request: &SuggestRequest) -> Suggestions {
        let target = request.target;
        let reply = self.normalize_one(filtered.reply, target).await;

        filtered.suggestions.truncate(request.count);
        let mut suggestions: Vec<String> = Vec::with_capacity(filtered.suggestions.len());
        for suggestion in filtered.suggestions {
            let normalized = self.normalize_one(suggestion, target).await;
            if !suggestions.contains(&normalized) {
                suggestions.push(normalized);
            }
        }

        Suggestions { suggestions, reply }
    }

    /// Normalize one text, keeping the original when normalization would
    /// empty it or reintroduce a banned phrase.
    async fn normalize_one(&self, text: String, target: Language) -> String {
        let normalized = self.normalizer.normalize(&text, target).await;
        let trimmed = normalized.trim();
        if trimmed.is_empty() || self.banned.is_banned(trimmed) {
            text
        } else {
            trimmed.to_string()
        }
    }
}

/// Canned reply for the last turn's intent, else the clarifying question.
fn contextual_reply(context: &SuggestionContext, target: Language) -> &'static str {
    context
        .last()
        .and_then(|turn| Intent::detect(&turn.text))
        .map(|intent| CannedReplyTable::reply(intent, target))
        .unwrap_or(target.strings().clarifying_question)
}

fn fallback_list(target: Language, count: usize) -> Vec<String> {
    target
        .strings()
        .fallback_suggestions
        .iter()
        .take(count)
        .map(|s| s.to_string())
        .collect()
}

fn fallback(target: Language, count: usize) -> Suggestions {
    let suggestions = fallback_list(target, count);
    let reply = suggestions.first().cloned().unwrap_or_default();
    Suggestions { suggestions, reply }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::ScriptedCompletion;

    fn pipeline(provider: Arc<ScriptedCompletion>, normalizer: Arc<ScriptedCompletion>) -> SuggestionPipeline {
        SuggestionPipeline::new(
            provider,
            LanguageNormalizer::new(normalizer),
            Arc::new(BannedPhraseSet::default()),
        )
    }

    /// Normalizer that always fails, so texts pass through unchanged.
    fn passthrough() -> Arc<ScriptedCompletion> {
        Arc::new(ScriptedCompletion::failing())
    }

    fn turns(lines: &[&str]) -> Vec<DialogueTurn> {
        lines
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let speaker = if i % 2 == 0 { "resident" } else { "staff" };
                DialogueTurn::new(speaker, *text, "en")
            })
            .collect()
    }

    fn request(lines: &[&str], target: Language, count: Option<usize>) -> SuggestRequest {
        SuggestRequest::new(turns(lines), target, count, SuggestMode::Suggest)
    }

    // ==================== Request Tests ====================

    #[test]
    fn test_context_keeps_last_six_turns() {
        let lines: Vec<String> = (0..9).map(|i| format!("line {}", i)).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let context = SuggestionContext::new(turns(&refs));

        assert_eq!(context.turns().len(), CONTEXT_WINDOW);
        assert_eq!(context.turns()[0].text, "line 3");
        assert_eq!(context.last().unwrap().text, "line 8");
    }

    #[test]
    fn test_count_is_clamped() {
        assert_eq!(request(&[], Language::En, None).count, 3);
        assert_eq!(request(&[], Language::En, Some(0)).count, 1);
        assert_eq!(request(&[], Language::En, Some(9)).count, 5);
        assert_eq!(request(&[], Language::En, Some(4)).count, 4);
    }

    #[test]
    fn test_mode_deserializes_lowercase() {
        let mode: SuggestMode = serde_json::from_str("\"reply\"").unwrap();
        assert_eq!(mode, SuggestMode::Reply);
        assert_eq!(SuggestMode::default(), SuggestMode::Suggest);
    }

    #[test]
    fn test_render_context() {
        let context = SuggestionContext::new(vec![
            DialogueTurn::new("resident", "お茶が欲しい", "ja"),
            DialogueTurn::new("staff", "Sure", ""),
        ]);
        assert_eq!(context.render(), "resident [ja]: お茶が欲しい\nstaff: Sure");
        assert_eq!(SuggestionContext::default().render(), "(no conversation yet)");
    }

    // ==================== Parsing Tests ====================

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_missing_fields_default() {
        let raw = parse_suggestions("{\"suggestions\": [\"Hi\"]}").unwrap();
        assert_eq!(raw.reply, "");
        assert_eq!(raw.suggestions, vec!["Hi"]);
        assert!(parse_suggestions("Sure! Here are some ideas").is_err());
    }

    #[test]
    fn test_prompt_mentions_mode_and_language() {
        let suggest = build_suggest_system_prompt(Language::Vi, 3, SuggestMode::Suggest);
        assert!(suggest.contains("Vietnamese"));
        assert!(suggest.contains("Propose 3 short things"));

        let reply = build_suggest_system_prompt(Language::Tl, 2, SuggestMode::Reply);
        assert!(reply.contains("Tagalog"));
        assert!(reply.contains("best response"));
    }

    // ==================== Pipeline Tests ====================

    #[tokio::test]
    async fn test_suggest_happy_path() {
        let provider = Arc::new(ScriptedCompletion::replying(&[
            "{\"reply\": \"Here is your tea.\", \"suggestions\": [\"Is it hot?\", \"Thank you.\", \"A little more, please.\"]}",
        ]));
        let normalizer = passthrough();
        let pipeline = pipeline(provider.clone(), normalizer.clone());

        let result = pipeline
            .suggest(&request(&["I'd like some tea."], Language::En, None))
            .await;

        assert_eq!(result.reply, "Here is your tea.");
        assert_eq!(
            result.suggestions,
            vec!["Is it hot?", "Thank you.", "A little more, please."]
        );
        assert_eq!(provider.calls(), 1);
        assert_eq!(provider.request(0).user, "resident [en]: I'd like some tea.");
        // reply plus three suggestions
        assert_eq!(normalizer.calls(), 4);
    }

    #[tokio::test]
    async fn test_banned_reply_replaced_with_canned_reply() {
        let provider = Arc::new(ScriptedCompletion::replying(&[
            "{\"reply\": \"Go straight.\", \"suggestions\": [\"You're welcome.\"]}",
        ]));
        let pipeline = pipeline(provider, passthrough());

        let result = pipeline
            .suggest(&request(&["Thank you so much!"], Language::En, None))
            .await;

        assert_eq!(result.reply, "You're welcome.");
    }

    #[tokio::test]
    async fn test_banned_reply_without_intent_asks_clarifying_question() {
        let provider = Arc::new(ScriptedCompletion::replying(&[
            "{\"reply\": \"Turn left at the corner.\", \"suggestions\": [\"OK\"]}",
        ]));
        let pipeline = pipeline(provider, passthrough());

        let result = pipeline
            .suggest(&request(&["トイレはどこ？"], Language::Ja, None))
            .await;

        assert_eq!(result.reply, "今どこにいますか？");
    }

    #[tokio::test]
    async fn test_all_suggestions_banned_uses_fallback_list() {
        let provider = Arc::new(ScriptedCompletion::replying(&[
            "{\"reply\": \"Cảm ơn bạn.\", \"suggestions\": [\"Đi thẳng\", \"rẽ trái\", \"  \"]}",
        ]));
        let pipeline = pipeline(provider, passthrough());

        let result = pipeline.suggest(&request(&["hello"], Language::Vi, None)).await;

        assert_eq!(
            result.suggestions,
            vec![
                "Bạn có thể nói lại được không?",
                "Xin hãy nói chậm hơn.",
                "Cảm ơn bạn."
            ]
        );
        assert_eq!(result.reply, "Cảm ơn bạn.");
    }

    #[tokio::test]
    async fn test_provider_failure_returns_exact_fallback() {
        let provider = Arc::new(ScriptedCompletion::failing());
        let normalizer = Arc::new(ScriptedCompletion::replying(&["unused"]));
        let pipeline = pipeline(provider, normalizer.clone());

        let result = pipeline
            .suggest(&request(&["Kumusta po?"], Language::Tl, Some(2)))
            .await;

        assert_eq!(result.suggestions, vec!["Pakiulit po?", "Pakibagalan po ang pagsasalita."]);
        assert_eq!(result.reply, result.suggestions[0]);
        assert_eq!(normalizer.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_json_returns_fallback() {
        let provider = Arc::new(ScriptedCompletion::replying(&["Sure! Try saying hello."]));
        let pipeline = pipeline(provider, passthrough());

        let result = pipeline.suggest(&request(&["hi"], Language::En, None)).await;

        assert_eq!(
            result.suggestions,
            vec!["Could you say that again?", "Please speak more slowly.", "Thank you."]
        );
        assert_eq!(result.reply, "Could you say that again?");
    }

    #[tokio::test]
    async fn test_code_fenced_json_is_accepted() {
        let provider = Arc::new(ScriptedCompletion::replying(&[
            "```json\n{\"reply\": \"Yes.\", \"suggestions\": [\"No.\"]}\n```",
        ]));
        let pipeline = pipeline(provider, passthrough());

        let result = pipeline.suggest(&request(&["Ready?"], Language::En, None)).await;

        assert_eq!(result.reply, "Yes.");
        assert_eq!(result.suggestions, vec!["No."]);
    }

    #[tokio::test]
    async fn test_duplicates_collapse_and_count_truncates() {
        let provider = Arc::new(ScriptedCompletion::replying(&[
            "{\"reply\": \"OK\", \"suggestions\": [\"A\", \"A\", \"B\", \"C\", \"D\"]}",
        ]));
        let pipeline = pipeline(provider, passthrough());

        let result = pipeline.suggest(&request(&["?"], Language::En, Some(2))).await;

        assert_eq!(result.suggestions, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_normalizer_calls_bounded_by_count() {
        let many: Vec<String> = (0..12).map(|i| format!("\"Option {}\"", i)).collect();
        let output = format!(
            "{{\"reply\": \"Okay.\", \"suggestions\": [{}]}}",
            many.join(", ")
        );
        let provider = Arc::new(ScriptedCompletion::replying(&[output.as_str()]));
        let normalizer = passthrough();
        let pipeline = pipeline(provider, normalizer.clone());

        let result = pipeline.suggest(&request(&["Hi"], Language::En, Some(1))).await;

        assert_eq!(result.suggestions, vec!["Option 0"]);
        assert!(normalizer.calls() <= 2, "{} normalizer calls", normalizer.calls());
    }

    #[tokio::test]
    async fn test_normalization_applied_to_reply_and_suggestions() {
        let provider = Arc::new(ScriptedCompletion::replying(&[
            "{\"reply\": \"Vâng, ok\", \"suggestions\": [\"Cảm ơn you\"]}",
        ]));
        let normalizer = Arc::new(ScriptedCompletion::replying(&["\"Vâng ạ\"", "Cảm ơn bạn"]));
        let pipeline = pipeline(provider, normalizer.clone());

        let result = pipeline.suggest(&request(&["Xin chào"], Language::Vi, None)).await;

        assert_eq!(result.reply, "Vâng ạ");
        assert_eq!(result.suggestions, vec!["Cảm ơn bạn"]);
        assert!(normalizer.request(0).system.contains("Vietnamese"));
    }

    #[tokio::test]
    async fn test_normalization_cannot_reintroduce_banned_phrase() {
        let provider = Arc::new(ScriptedCompletion::replying(&[
            "{\"reply\": \"Please wait here.\", \"suggestions\": [\"Thanks\"]}",
        ]));
        let normalizer = Arc::new(ScriptedCompletion::replying(&["Go straight and wait."]));
        let pipeline = pipeline(provider, normalizer);

        let result = pipeline.suggest(&request(&["Where?"], Language::En, None)).await;

        assert_eq!(result.reply, "Please wait here.");
        assert_eq!(result.suggestions, vec!["Thanks"]);
    }

    #[tokio::test]
    async fn test_empty_dialogue_uses_clarifying_question() {
        let provider = Arc::new(ScriptedCompletion::replying(&[
            "{\"reply\": \"\", \"suggestions\": [\"Hello\"]}",
        ]));
        let pipeline = pipeline(provider, passthrough());

        let result = pipeline
            .suggest(&SuggestRequest::new(vec![], Language::En, None, SuggestMode::Reply))
            .await;

        assert_eq!(result.reply, "Where are you now?");
        assert_eq!(result.suggestions, vec!["Hello"]);
    }
}
