use crate::config::Config;
use crate::error::ProviderError;
use crate::i18n::Language;
use crate::providers::{MachineTranslator, ProviderId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "google";

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

/// Google Cloud Translation (v2) client, the optional primary provider.
#[derive(Debug, Clone)]
pub struct GoogleTranslateClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
}

impl GoogleTranslateClient {
    /// Build a client if the config enables Google Translate and carries a key.
    pub fn from_config(client: reqwest::Client, config: &Config) -> Option<Self> {
        if !config.google_enabled() {
            return None;
        }
        let api_key = config.google_api_key.clone()?;
        Some(Self {
            client,
            api_key,
            api_url: config.google_translate_url.clone(),
        })
    }
}

/// Google returns a few HTML entities even with `format: text`.
fn decode_entities(text: &str) -> String {
    text.replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[async_trait]
impl MachineTranslator for GoogleTranslateClient {
    fn id(&self) -> ProviderId {
        ProviderId::Google
    }

    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, ProviderError> {
        let body = TranslateRequest {
            q: text,
            source: source.code(),
            target: target.code(),
            format: "text",
        };

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: PROVIDER,
                status,
                body,
            });
        }

        let parsed: TranslateResponse = response.json().await.map_err(|e| ProviderError::Parse {
            provider: PROVIDER,
            message: e.to_string(),
        })?;

        parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| decode_entities(t.translated_text.trim()))
            .filter(|t| !t.is_empty())
            .ok_or(ProviderError::EmptyResponse { provider: PROVIDER })
    }
}
