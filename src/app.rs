use crate::config::Config;
use crate::explain::TermExplainer;
use crate::google::GoogleTranslateClient;
use crate::i18n::BannedPhraseSet;
use crate::normalizer::LanguageNormalizer;
use crate::openai::OpenAiClient;
use crate::providers::{CompletionProvider, MachineTranslator};
use crate::suggestion::SuggestionPipeline;
use crate::translation::TranslationOrchestrator;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build metadata reported by `/version`.
#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub service: String,
    pub version: &'static str,
    pub git: String,
    pub started_at: DateTime<Utc>,
}

/// Every pipeline component, built once at startup and shared by all
/// requests.
#[derive(Clone)]
pub struct AppContext {
    pub translator: TranslationOrchestrator,
    pub suggestions: SuggestionPipeline,
    pub explainer: TermExplainer,
    pub version: VersionInfo,
}

impl AppContext {
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.provider_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let completion: Arc<dyn CompletionProvider> =
            Arc::new(OpenAiClient::new(http.clone(), config));
        let primary = GoogleTranslateClient::from_config(http, config)
            .map(|client| Arc::new(client) as Arc<dyn MachineTranslator>);

        info!(
            "Providers: primary={}, completion={} ({})",
            if primary.is_some() { "google" } else { "none" },
            completion.id(),
            config.openai_model
        );

        let banned = Arc::new(
            BannedPhraseSet::with_extra(&config.banned_phrases_extra)
                .context("Invalid BANNED_PHRASES_EXTRA")?,
        );
        info!("Loaded {} banned phrases", banned.phrase_count());

        Ok(Self::with_providers(
            primary,
            completion,
            banned,
            config.translate_max_retries,
            VersionInfo {
                service: config.service_name.clone(),
                version: env!("CARGO_PKG_VERSION"),
                git: config.git_sha.clone(),
                started_at: Utc::now(),
            },
        ))
    }

    /// Wire components around already-built providers.
    pub fn with_providers(
        primary: Option<Arc<dyn MachineTranslator>>,
        completion: Arc<dyn CompletionProvider>,
        banned: Arc<BannedPhraseSet>,
        max_retries: u32,
        version: VersionInfo,
    ) -> Self {
        let normalizer = LanguageNormalizer::new(completion.clone());

        Self {
            translator: TranslationOrchestrator::new(primary, completion.clone(), max_retries),
            suggestions: SuggestionPipeline::new(completion.clone(), normalizer, banned),
            explainer: TermExplainer::new(completion),
            version,
        }
    }
}
