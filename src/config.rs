use anyhow::{bail, Context, Result};

pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
/// Upper bound for `TRANSLATE_MAX_RETRIES`.
pub const MAX_TRANSLATE_RETRIES: u32 = 10;

pub const DEFAULT_GOOGLE_TRANSLATE_URL: &str =
    "https://translation.googleapis.com/language/translate/v2";

#[derive(Debug, Clone)]
pub struct Config {
    // OpenAI (completion provider)
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_url: String,

    // Google Translate (optional machine-translation provider)
    pub use_google_translate: bool,
    pub google_api_key: Option<String>,
    pub google_translate_url: String,

    // Pipeline
    pub provider_timeout_secs: u64,
    pub translate_max_retries: u32,
    pub banned_phrases_extra: Vec<String>,

    // Service
    pub service_name: String,
    pub git_sha: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let provider_timeout_secs = parse_env("PROVIDER_TIMEOUT_SECS", 15)?;
        if provider_timeout_secs == 0 {
            bail!("PROVIDER_TIMEOUT_SECS must be greater than zero");
        }

        let translate_max_retries = parse_env("TRANSLATE_MAX_RETRIES", 2)?;
        if translate_max_retries > MAX_TRANSLATE_RETRIES {
            bail!(
                "TRANSLATE_MAX_RETRIES must be at most {}, got {}",
                MAX_TRANSLATE_RETRIES,
                translate_max_retries
            );
        }

        Ok(Self {
            // OpenAI
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY not set")?,
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_API_URL.to_string()),

            // Google Translate
            use_google_translate: std::env::var("USE_GOOGLE_TRANSLATE")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false),
            google_api_key: std::env::var("GOOGLE_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            google_translate_url: std::env::var("GOOGLE_TRANSLATE_URL")
                .unwrap_or_else(|_| DEFAULT_GOOGLE_TRANSLATE_URL.to_string()),

            // Pipeline
            provider_timeout_secs,
            translate_max_retries,
            banned_phrases_extra: std::env::var("BANNED_PHRASES_EXTRA")
                .map(|v| {
                    v.split('|')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            // Service
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "carebot-lingua".to_string()),
            git_sha: std::env::var("GIT_SHA")
                .or_else(|_| std::env::var("RENDER_GIT_COMMIT"))
                .map(|sha| sha.chars().take(7).collect())
                .unwrap_or_default(),
            port: parse_env("PORT", 8080)?,
        })
    }

    /// Whether the machine-translation provider should be tried first.
    ///
    /// Requires both the feature flag and credentials.
    pub fn google_enabled(&self) -> bool {
        self.use_google_translate && self.google_api_key.is_some()
    }
}

/// Parse an optional numeric environment variable, rejecting garbage.
fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number, got '{}'", name, value)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "OPENAI_API_KEY",
        "OPENAI_MODEL",
        "OPENAI_API_URL",
        "USE_GOOGLE_TRANSLATE",
        "GOOGLE_API_KEY",
        "GOOGLE_TRANSLATE_URL",
        "PROVIDER_TIMEOUT_SECS",
        "TRANSLATE_MAX_RETRIES",
        "BANNED_PHRASES_EXTRA",
        "SERVICE_NAME",
        "GIT_SHA",
        "RENDER_GIT_COMMIT",
        "PORT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "sk-test");

        let config = Config::from_env().expect("Should load");
        assert_eq!(config.openai_api_key, "sk-test");
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.openai_api_url, DEFAULT_OPENAI_API_URL);
        assert!(!config.use_google_translate);
        assert!(config.google_api_key.is_none());
        assert_eq!(config.provider_timeout_secs, 15);
        assert_eq!(config.translate_max_retries, 2);
        assert!(config.banned_phrases_extra.is_empty());
        assert_eq!(config.service_name, "carebot-lingua");
        assert_eq!(config.port, 8080);
        assert!(!config.google_enabled());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_openai_key() {
        clear_env();

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    #[serial]
    fn test_google_requires_flag_and_key() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("USE_GOOGLE_TRANSLATE", "true");

        let config = Config::from_env().unwrap();
        assert!(config.use_google_translate);
        assert!(!config.google_enabled());

        std::env::set_var("GOOGLE_API_KEY", "g-key");
        let config = Config::from_env().unwrap();
        assert!(config.google_enabled());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_translate_max_retries_bounded() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "sk-test");

        std::env::set_var("TRANSLATE_MAX_RETRIES", "10");
        assert_eq!(Config::from_env().unwrap().translate_max_retries, 10);

        std::env::set_var("TRANSLATE_MAX_RETRIES", "4294967295");
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("TRANSLATE_MAX_RETRIES must be at most"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_banned_phrases_extra_split() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("BANNED_PHRASES_EXTRA", "wait here | | go upstairs");

        let config = Config::from_env().unwrap();
        assert_eq!(config.banned_phrases_extra, vec!["wait here", "go upstairs"]);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_git_sha_truncated() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("RENDER_GIT_COMMIT", "0123456789abcdef");

        let config = Config::from_env().unwrap();
        assert_eq!(config.git_sha, "0123456");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_numbers_rejected() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("PORT", "eighty");
        assert!(Config::from_env().is_err());

        std::env::set_var("PORT", "8080");
        std::env::set_var("PROVIDER_TIMEOUT_SECS", "0");
        assert!(Config::from_env().is_err());

        clear_env();
    }
}
