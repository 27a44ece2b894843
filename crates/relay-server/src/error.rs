use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),

    #[error("Invalid server address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),
}

/// Name of the environment variable that sets a configuration field.
///
/// Every required field lives in the provider section, so a bare field name
/// (as reported by a missing-field error) is resolved there.
pub fn to_env_var(field_path: &str) -> String {
    let path = if field_path.contains('.') {
        field_path.to_string()
    } else {
        format!("provider.{}", field_path)
    };

    let key = path
        .split('.')
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join("__");
    format!("RELAY_{}", key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_env_var() {
        assert_eq!(to_env_var("provider.api_key"), "RELAY_PROVIDER__API_KEY");
        assert_eq!(to_env_var("server.port"), "RELAY_SERVER__PORT");
        assert_eq!(to_env_var("api_key"), "RELAY_PROVIDER__API_KEY");
    }
}
