use crate::error::{PipelineError, ProviderError};
use crate::i18n::{Language, OutputValidator, RejectReason, ValidationVerdict};
use crate::providers::{CompletionProvider, CompletionRequest, MachineTranslator, ProviderId};
use crate::retry::RetryConfig;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A validated translation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub source: Language,
    pub target: Language,
}

impl TranslationRequest {
    /// Build a request, rejecting text that is empty after trimming.
    pub fn new(
        text: impl Into<String>,
        source: Language,
        target: Language,
    ) -> Result<Self, PipelineError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "No text to translate".to_string(),
            ));
        }
        Ok(Self {
            text,
            source,
            target,
        })
    }

    /// Build a request from a legacy direction token such as "ja-en" or "JA2VI".
    pub fn from_direction(text: impl Into<String>, direction: &str) -> Result<Self, PipelineError> {
        let (source, target) = parse_direction(direction)?;
        Self::new(text, source, target)
    }

    /// Source and target are the same language; no provider is needed.
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

/// Split a direction token into its source and target languages.
pub fn parse_direction(direction: &str) -> Result<(Language, Language), PipelineError> {
    let unsupported =
        || PipelineError::InvalidInput(format!("Unsupported translation direction: {}", direction));

    let lowered = direction.trim().to_ascii_lowercase();
    let parts: Vec<&str> = lowered.split(['-', '2']).collect();
    let [src, dst] = parts.as_slice() else {
        return Err(unsupported());
    };

    let source = Language::from_code(src).map_err(|_| unsupported())?;
    let target = Language::from_code(dst).map_err(|_| unsupported())?;
    Ok((source, target))
}

/// Final result of a translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    /// Provider that produced `text`; `None` for the identity short-circuit.
    pub provider: Option<ProviderId>,
}

/// One provider call made while serving a request.
#[derive(Debug, Clone)]
pub struct ProviderAttempt {
    pub provider: ProviderId,
    pub attempt_index: u32,
    /// `None` when the provider failed without producing text
    pub candidate: Option<String>,
    pub verdict: Option<ValidationVerdict>,
}

/// Build the system prompt for a completion-provider translation attempt.
///
/// Attempt 0 is the plain instruction. Every later attempt adds the
/// escalated constraints, naming the reason the previous draft was rejected.
fn build_translation_system_prompt(
    source: Language,
    target: Language,
    attempt: u32,
    last_rejection: Option<RejectReason>,
) -> String {
    let mut prompt = format!(
        "You are a professional interpreter working in elderly care. \
         Translate the user's {src} text into {dst} ({native}).\n\
         - Output only the {dst} translation.\n\
         - Do not add explanations, notes, romanization or quotation marks.\n\
         - If the text is a question or a request, translate it; do not answer it.",
        src = source.name(),
        dst = target.name(),
        native = target.native_name()
    );

    if attempt == 0 {
        return prompt;
    }

    prompt.push_str("\n\nSTRICT RULES:\n");
    if source == Language::Ja {
        prompt.push_str(
            "- Do not output any Japanese characters (hiragana, katakana or kanji).\n",
        );
    } else {
        prompt.push_str(&format!(
            "- Do not leave any {} words or characters in the output.\n",
            source.name()
        ));
    }
    prompt.push_str(&format!(
        "- If your draft is identical to the original text, rewrite it in {} instead of explaining why.\n",
        target.name()
    ));
    if target.profile().requires_glyphs() {
        prompt.push_str(&format!(
            "- Write {} with all of its diacritics and tone marks.\n",
            target.name()
        ));
    }
    if let Some(reason) = last_rejection {
        prompt.push_str(&format!(
            "- Your previous answer was rejected ({}). Produce a proper {} translation.\n",
            reason,
            target.name()
        ));
    }

    prompt
}

/// Drives provider calls, validation, escalation and fallback for one
/// translation.
#[derive(Clone)]
pub struct TranslationOrchestrator {
    primary: Option<Arc<dyn MachineTranslator>>,
    secondary: Arc<dyn CompletionProvider>,
    retry: RetryConfig,
}

impl TranslationOrchestrator {
    pub fn new(
        primary: Option<Arc<dyn MachineTranslator>>,
        secondary: Arc<dyn CompletionProvider>,
        max_retries: u32,
    ) -> Self {
        Self {
            primary,
            secondary,
            retry: RetryConfig::escalation(max_retries),
        }
    }

    /// Replace the escalation schedule (attempt count and backoff).
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Translate `request.text`.
    ///
    /// Validation failures never become errors: once every attempt is used
    /// up, the last candidate produced is returned as a best effort. The only
    /// error is `ProvidersExhausted`, when no provider produced any text.
    pub async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<Translation, PipelineError> {
        if request.is_identity() {
            debug!("Identity translation for {}, skipping providers", request.source);
            return Ok(Translation {
                text: request.text.clone(),
                provider: None,
            });
        }

        let operation_name = format!("Translation {}->{}", request.source, request.target);
        let mut trace: Vec<ProviderAttempt> = Vec::new();
        let mut best_effort: Option<(String, ProviderId)> = None;

        if let Some(primary) = &self.primary {
            let result = primary
                .translate(&request.text, request.source, request.target)
                .await;
            let attempt = self.record(&mut trace, primary.id(), 0, request, result, &operation_name);
            match attempt {
                Outcome::Accepted(text) => return Ok(self.finish(text, primary.id(), &trace)),
                Outcome::Rejected(text, _) => best_effort = Some((text, primary.id())),
                Outcome::Failed(_) => {}
            }
        }

        let secondary_id = self.secondary.id();
        let mut last_rejection: Option<RejectReason> = None;

        for attempt in 0..self.retry.max_attempts {
            let completion = CompletionRequest::new(
                build_translation_system_prompt(
                    request.source,
                    request.target,
                    attempt,
                    last_rejection,
                ),
                request.text.clone(),
                if attempt == 0 { 0.2 } else { 0.0 },
            );
            let result = self.secondary.complete(completion).await;

            match self.record(&mut trace, secondary_id, attempt, request, result, &operation_name) {
                Outcome::Accepted(text) => return Ok(self.finish(text, secondary_id, &trace)),
                Outcome::Rejected(text, reason) => {
                    last_rejection = Some(reason);
                    best_effort = Some((text, secondary_id));
                }
                Outcome::Failed(retryable) => {
                    if !retryable {
                        warn!(
                            "{}: {} failure is not retryable, giving up on provider",
                            operation_name, secondary_id
                        );
                        break;
                    }
                    if attempt + 1 < self.retry.max_attempts {
                        self.retry.pause_before(attempt + 1, &operation_name).await;
                    }
                }
            }
        }

        debug!("{}: attempts {:?}", operation_name, trace);

        match best_effort {
            Some((text, provider)) => {
                warn!(
                    "{}: every candidate failed validation, returning best effort from {}",
                    operation_name, provider
                );
                Ok(Translation {
                    text,
                    provider: Some(provider),
                })
            }
            None => {
                warn!("{}: no provider produced any text", operation_name);
                Err(PipelineError::ProvidersExhausted {
                    source_lang: request.source,
                    target_lang: request.target,
                })
            }
        }
    }

    /// Validate a provider result and append it to the trace.
    fn record(
        &self,
        trace: &mut Vec<ProviderAttempt>,
        provider: ProviderId,
        attempt_index: u32,
        request: &TranslationRequest,
        result: Result<String, ProviderError>,
        operation_name: &str,
    ) -> Outcome {
        match result {
            Ok(candidate) => {
                let verdict = OutputValidator::validate(&candidate, &request.text, request.target);
                trace.push(ProviderAttempt {
                    provider,
                    attempt_index,
                    candidate: Some(candidate.clone()),
                    verdict: Some(verdict),
                });
                match verdict.reason {
                    None => Outcome::Accepted(candidate),
                    Some(reason) => {
                        warn!(
                            "{}: {} attempt {} rejected ({})",
                            operation_name,
                            provider,
                            attempt_index + 1,
                            reason
                        );
                        Outcome::Rejected(candidate, reason)
                    }
                }
            }
            Err(e) => {
                warn!(
                    "{}: {} attempt {} failed: {}",
                    operation_name,
                    provider,
                    attempt_index + 1,
                    e
                );
                trace.push(ProviderAttempt {
                    provider,
                    attempt_index,
                    candidate: None,
                    verdict: None,
                });
                Outcome::Failed(e.is_retryable())
            }
        }
    }

    fn finish(&self, text: String, provider: ProviderId, trace: &[ProviderAttempt]) -> Translation {
        info!(
            "Translation accepted from {} after {} provider call(s)",
            provider,
            trace.len()
        );
        Translation {
            text,
            provider: Some(provider),
        }
    }
}

enum Outcome {
    Accepted(String),
    Rejected(String, RejectReason),
    /// Provider produced nothing; carries whether retrying could help
    Failed(bool),
}
