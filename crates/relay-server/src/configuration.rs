use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use relay::providers::configs::{AnthropicProviderConfig, ANTHROPIC_HOST, ANTHROPIC_MODEL};
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_host")]
    pub host: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i32,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub top_p: Option<f32>,
    #[serde(default)]
    pub top_k: Option<i32>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl ProviderSettings {
    // Convert to the relay provider config
    pub fn into_config(self) -> AnthropicProviderConfig {
        AnthropicProviderConfig {
            host: self.host,
            api_key: self.api_key,
            model: self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            system_prompt: self.system_prompt,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Server defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            // Provider defaults
            .set_default("provider.host", default_provider_host())?
            .set_default("provider.model", default_model())?
            .set_default("provider.max_tokens", default_max_tokens())?
            .set_default("provider.temperature", 0.0)?
            .set_default("provider.top_p", 0.999)?
            .set_default("provider.top_k", 256)?
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix("RELAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                // Missing fields surface as "missing field `api_key`"
                let error_str = err.to_string();
                if let Some(rest) = error_str.split("missing field `").nth(1) {
                    let field = rest.split('`').next().unwrap_or(rest);
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_provider_host() -> String {
    ANTHROPIC_HOST.to_string()
}

fn default_model() -> String {
    ANTHROPIC_MODEL.to_string()
}

fn default_max_tokens() -> i32 {
    4096
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("RELAY_") {
                env::remove_var(&key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();
        env::set_var("RELAY_PROVIDER__API_KEY", "test-key");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8000);

        let provider = settings.provider;
        assert_eq!(provider.host, "https://api.anthropic.com");
        assert_eq!(provider.api_key, "test-key");
        assert_eq!(provider.model, "claude-sonnet-4-20250514");
        assert_eq!(provider.max_tokens, 4096);
        assert_eq!(provider.temperature, Some(0.0));
        assert_eq!(provider.top_p, Some(0.999));
        assert_eq!(provider.top_k, Some(256));
        assert_eq!(provider.system_prompt, None);

        clean_env();
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        env::set_var("RELAY_SERVER__PORT", "8080");
        env::set_var("RELAY_PROVIDER__API_KEY", "test-key");
        env::set_var("RELAY_PROVIDER__HOST", "http://localhost:9000");
        env::set_var("RELAY_PROVIDER__MODEL", "claude-3-5-haiku-latest");
        env::set_var("RELAY_PROVIDER__TEMPERATURE", "0.7");
        env::set_var("RELAY_PROVIDER__MAX_TOKENS", "2000");
        env::set_var("RELAY_PROVIDER__SYSTEM_PROMPT", "Be brief.");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.port, 8080);

        let config = settings.provider.into_config();
        assert_eq!(config.host, "http://localhost:9000");
        assert_eq!(config.model, "claude-3-5-haiku-latest");
        assert_eq!(config.temperature, Some(0.7));
        assert_eq!(config.max_tokens, 2000);
        assert_eq!(config.system_prompt.as_deref(), Some("Be brief."));

        clean_env();
    }

    #[test]
    #[serial]
    fn test_missing_api_key() {
        clean_env();

        let error = Settings::new().unwrap_err();
        match error {
            ConfigError::MissingEnvVar { env_var } => {
                assert_eq!(env_var, "RELAY_PROVIDER__API_KEY")
            }
            other => panic!("Expected MissingEnvVar, got {:?}", other),
        }
    }

    #[test]
    fn test_socket_addr_conversion() {
        let server_settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 8000,
        };
        let addr = server_settings.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:8000");
    }

    #[test]
    fn test_invalid_socket_addr() {
        let server_settings = ServerSettings {
            host: "not a host".to_string(),
            port: 8000,
        };
        assert!(matches!(
            server_settings.socket_addr(),
            Err(ConfigError::InvalidAddress(_))
        ));
    }
}
