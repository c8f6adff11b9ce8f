use crate::i18n::{Language, UnknownLanguage};
use thiserror::Error;

/// Failure of a single provider call.
///
/// Every variant is an expected, recoverable condition: the caller logs it
/// and moves on to the next attempt or provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} request timed out")]
    Timeout { provider: &'static str },

    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} response contained no text")]
    EmptyResponse { provider: &'static str },

    #[error("Failed to parse {provider} response: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    /// Map a reqwest error, separating timeouts from other transport failures.
    pub fn from_reqwest(provider: &'static str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ProviderError::Timeout { provider }
        } else {
            ProviderError::Transport {
                provider,
                message: error.to_string(),
            }
        }
    }

    /// Whether calling the same provider again could succeed.
    ///
    /// Rate limits (429) and server errors (5xx) are transient, as are
    /// network failures, timeouts and malformed responses. Other 4xx errors,
    /// notably authentication failures, repeat on every attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => true,
        }
    }
}

/// Failures a caller of the pipeline can observe.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad request: empty text, unsupported language or direction.
    #[error("{0}")]
    InvalidInput(String),

    /// Every provider and retry failed without producing any text.
    #[error("All providers failed for {source_lang}->{target_lang}")]
    ProvidersExhausted {
        source_lang: Language,
        target_lang: Language,
    },
}

impl PipelineError {
    /// Message safe to show to an end user.
    ///
    /// Provider exhaustion is reported in the language the user wrote in,
    /// never with the underlying error text.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::InvalidInput(message) => message.clone(),
            PipelineError::ProvidersExhausted { source_lang, .. } => {
                source_lang.strings().provider_failure.to_string()
            }
        }
    }
}

impl From<UnknownLanguage> for PipelineError {
    fn from(err: UnknownLanguage) -> Self {
        PipelineError::InvalidInput(err.to_string())
    }
}
