use prompt_agent::{AnthropicChatModel, ChatModel, OpenAIChatModel, Orchestrator};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "FORTUNE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

const PLACEHOLDER_API_KEY: &str = "your-api-key-here";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-opus-20240229";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("no API key configured for {provider}; set llm.api_key, APP__LLM__API_KEY or {fallback_env}")]
    MissingApiKey {
        provider: Provider,
        fallback_env: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::OpenAI => "openai",
        }
    }

    fn api_key_env(self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Provider::Anthropic => DEFAULT_ANTHROPIC_MODEL,
            Provider::OpenAI => DEFAULT_OPENAI_MODEL,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(self.provider.default_model())
    }

    fn has_api_key(&self) -> bool {
        matches!(self.api_key.as_deref(), Some(key) if !key.trim().is_empty() && key != PLACEHOLDER_API_KEY)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
}

impl Config {
    /// Load from the file named by `FORTUNE_CONFIG` (default `config.toml`)
    pub fn from_file() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load(&path)
    }

    /// Defaults, then the optional file at `path`, then `APP__*` environment
    /// variables. The provider's own key variable fills a missing API key.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("llm.provider", "anthropic")?
            .set_default("llm.temperature", 0.7)?
            .set_default("llm.max_tokens", 4096)?
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let mut config: Config = settings.try_deserialize()?;

        if !config.llm.has_api_key() {
            config.llm.api_key = std::env::var(config.llm.provider.api_key_env()).ok();
        }
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Construct the configured provider client
pub fn build_chat_model(llm: &LlmConfig) -> Result<Arc<dyn ChatModel>, ConfigError> {
    if !llm.has_api_key() {
        return Err(ConfigError::MissingApiKey {
            provider: llm.provider,
            fallback_env: llm.provider.api_key_env(),
        });
    }
    let api_key = llm.api_key.clone().unwrap_or_default();
    let model: Arc<dyn ChatModel> = match llm.provider {
        Provider::Anthropic => Arc::new(
            AnthropicChatModel::new(api_key, llm.base_url.clone())
                .with_model(llm.model_name().to_string())
                .with_temperature(llm.temperature)
                .with_max_tokens(llm.max_tokens),
        ),
        Provider::OpenAI => Arc::new(
            OpenAIChatModel::new(api_key, llm.base_url.clone())
                .with_model(llm.model_name().to_string())
                .with_temperature(llm.temperature)
                .with_max_tokens(llm.max_tokens),
        ),
    };
    Ok(model)
}

// Application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub provider: String,
    pub model_name: String,
}

impl AppState {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        let provider = model.provider().to_string();
        let model_name = model.model_name().unwrap_or("unknown").to_string();
        Self {
            orchestrator: Arc::new(Orchestrator::new(model)),
            provider,
            model_name,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(build_chat_model(&config.llm)?))
    }

    pub fn model(&self) -> &Arc<dyn ChatModel> {
        self.orchestrator.model()
    }
}
