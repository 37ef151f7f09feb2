use crate::config::{build_chat_model, Config, ConfigError, Provider};

// Configuration layering: defaults, TOML file, APP__* environment and
// provider key fallback

#[cfg(test)]
mod tests {
    use super::*;
    use prompt_agent::ChatModel;
    use serial_test::serial;
    use std::io::Write;
    use std::path::PathBuf;

    const ENV_VARS: [&str; 6] = [
        "APP__SERVER__PORT",
        "APP__LLM__PROVIDER",
        "APP__LLM__API_KEY",
        "APP__LLM__MODEL",
        "ANTHROPIC_API_KEY",
        "OPENAI_API_KEY",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn missing_file() -> PathBuf {
        std::env::temp_dir().join("fortune-server-no-such-config.toml")
    }

    #[test]
    #[serial]
    fn test_defaults_without_file() {
        clear_env();
        let config = Config::load(&missing_file()).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.provider, Provider::Anthropic);
        assert_eq!(config.llm.model_name(), "claude-3-opus-20240229");
        assert_eq!(config.llm.max_tokens, 4096);
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    #[serial]
    fn test_config_from_file() {
        clear_env();
        let file = write_config(
            r#"
[server]
host = "127.0.0.1"
port = 8100

[llm]
provider = "openai"
api_key = "sk-test"
base_url = "http://localhost:11434/v1"
model = "gpt-4o-mini"
temperature = 0.2
"#,
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8100");
        assert_eq!(config.llm.provider, Provider::OpenAI);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(config.llm.model_name(), "gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 4096);

        let model = build_chat_model(&config.llm).unwrap();
        assert_eq!(model.provider(), "openai");
        assert_eq!(model.model_name(), Some("gpt-4o-mini"));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let file = write_config("[server]\nport = 8100\n\n[llm]\napi_key = \"from-file\"\n");
        std::env::set_var("APP__SERVER__PORT", "9300");
        std::env::set_var("APP__LLM__API_KEY", "from-env");

        let config = Config::load(file.path());
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.server.port, 9300);
        assert_eq!(config.llm.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    #[serial]
    fn test_provider_key_fallback() {
        clear_env();
        let file = write_config("[llm]\napi_key = \"your-api-key-here\"\n");
        std::env::set_var("ANTHROPIC_API_KEY", "sk-ant-fallback");

        let config = Config::load(file.path());
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-ant-fallback"));
        let model = build_chat_model(&config.llm).unwrap();
        assert_eq!(model.provider(), "anthropic");
    }

    #[test]
    #[serial]
    fn test_placeholder_key_is_rejected() {
        clear_env();
        let file = write_config("[llm]\nprovider = \"openai\"\napi_key = \"your-api-key-here\"\n");

        let config = Config::load(file.path()).unwrap();
        let err = build_chat_model(&config.llm).err().unwrap();
        assert!(matches!(
            err,
            ConfigError::MissingApiKey {
                provider: Provider::OpenAI,
                fallback_env: "OPENAI_API_KEY"
            }
        ));
    }

    #[test]
    #[serial]
    fn test_unknown_provider_fails_to_load() {
        clear_env();
        let file = write_config("[llm]\nprovider = \"mystery\"\n");
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Load(_))));
    }
}
