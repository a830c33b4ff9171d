use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

/// Settings for the chat-completion provider.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// `None` when `OPENAI_API_KEY` is unset or blank. Requests then fail
    /// with a configuration error instead of the process refusing to boot.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 4000,
            temperature: 0.2,
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // LLM provider
    pub llm: LlmSettings,

    // Upload handling
    pub max_upload_bytes: u64,
    pub pdf_text_char_budget: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env: Environment::Dev,
            server_addr: "0.0.0.0:8080".to_string(),
            cors_allow_origins: vec!["http://localhost:3000".to_string()],
            llm: LlmSettings::default(),
            max_upload_bytes: 200 * MIB,
            pdf_text_char_budget: 8000,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let defaults = Settings::default();

        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or(defaults.server_addr);

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // LLM provider
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let base_url = env::var("OPENAI_BASE_URL").unwrap_or(defaults.llm.base_url);
        url::Url::parse(&base_url)
            .with_context(|| format!("OPENAI_BASE_URL is not a valid URL: {}", base_url))?;

        let llm = LlmSettings {
            api_key,
            base_url,
            model: env::var("OPENAI_MODEL").unwrap_or(defaults.llm.model),
            max_tokens: parse_var("OPENAI_MAX_TOKENS")?.unwrap_or(defaults.llm.max_tokens),
            temperature: parse_var("OPENAI_TEMPERATURE")?.unwrap_or(defaults.llm.temperature),
            timeout_seconds: parse_var("OPENAI_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.llm.timeout_seconds),
        };

        // Upload handling (one ceiling shared by every validation point)
        let max_upload_bytes = parse_var::<u64>("MAX_UPLOAD_MB")?
            .map(|mb| mb.saturating_mul(MIB))
            .unwrap_or(defaults.max_upload_bytes);
        let pdf_text_char_budget =
            parse_var("PDF_TEXT_CHAR_BUDGET")?.unwrap_or(defaults.pdf_text_char_budget);

        Ok(Settings {
            env,
            server_addr,
            cors_allow_origins,
            llm,
            max_upload_bytes,
            pdf_text_char_budget,
        })
    }
}

/// Reads an optional numeric variable. Present but unparsable is an error.
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: {}", name, raw)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing_defaults_to_dev() {
        assert_eq!(Environment::from_str("production"), Environment::Prod);
        assert_eq!(Environment::from_str("STAGING"), Environment::Staging);
        assert_eq!(Environment::from_str("anything"), Environment::Dev);
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.max_upload_bytes, 200 * 1024 * 1024);
        assert_eq!(settings.pdf_text_char_budget, 8000);
        assert_eq!(settings.llm.model, "gpt-4o");
        assert_eq!(settings.llm.max_tokens, 4000);
        assert!(settings.llm.api_key.is_none());
    }
}
