//! Provider capabilities consumed by the pipeline.
//!
//! The pipeline only ever sees these two traits, so the orchestration logic
//! never depends on which service or SDK sits behind a provider.

use crate::error::ProviderError;
use crate::i18n::Language;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Identifies which provider produced a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Google,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Google => "google",
            ProviderId::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One text-completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature,
        }
    }
}

/// General-purpose text completion service.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;
}

/// Dedicated machine-translation service.
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, ProviderError>;
}

/// Scripted in-memory providers for unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Completion provider that replays scripted results and records every
    /// request it receives. Once the script runs out, the last entry repeats.
    pub struct ScriptedCompletion {
        script: Mutex<VecDeque<Result<String, ProviderError>>>,
        last: Mutex<Option<Result<String, ProviderError>>>,
        pub requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedCompletion {
        pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn replying(texts: &[&str]) -> Self {
            Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
        }

        pub fn failing() -> Self {
            Self::new(vec![Err(transport_error())])
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn request(&self, index: usize) -> CompletionRequest {
            self.requests.lock().unwrap()[index].clone()
        }
    }

    pub fn transport_error() -> ProviderError {
        ProviderError::Transport {
            provider: "openai",
            message: "connection refused".to_string(),
        }
    }

    fn replay(result: &Result<String, ProviderError>) -> Result<String, ProviderError> {
        match result {
            Ok(text) => Ok(text.clone()),
            Err(ProviderError::Api {
                provider,
                status,
                body,
            }) => Err(ProviderError::Api {
                provider: *provider,
                status: *status,
                body: body.clone(),
            }),
            Err(_) => Err(transport_error()),
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedCompletion {
        fn id(&self) -> ProviderId {
            ProviderId::OpenAi
        }

        async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
            self.requests.lock().unwrap().push(request);
            let next = self.script.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            match next {
                Some(result) => {
                    let out = replay(&result);
                    *last = Some(result);
                    out
                }
                None => match last.as_ref() {
                    Some(result) => replay(result),
                    None => Err(transport_error()),
                },
            }
        }
    }

    /// Machine translator that always returns the same result.
    pub struct FixedTranslator {
        result: Result<String, ()>,
        pub calls: Mutex<usize>,
    }

    impl FixedTranslator {
        pub fn replying(text: &str) -> Self {
            Self {
                result: Ok(text.to_string()),
                calls: Mutex::new(0),
            }
        }

        pub fn failing() -> Self {
            Self {
                result: Err(()),
                calls: Mutex::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl MachineTranslator for FixedTranslator {
        fn id(&self) -> ProviderId {
            ProviderId::Google
        }

        async fn translate(
            &self,
            _text: &str,
            _source: Language,
            _target: Language,
        ) -> Result<String, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            self.result.clone().map_err(|_| ProviderError::Timeout {
                provider: "google",
            })
        }
    }
}
