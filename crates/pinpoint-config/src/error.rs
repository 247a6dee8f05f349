//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = ConfigError::NotFound("pinpoint.toml".to_string());
        assert!(err.to_string().contains("pinpoint.toml"));

        let err = ConfigError::InvalidValue {
            field: "server.port".to_string(),
            message: "not a number".to_string(),
        };
        assert!(err.to_string().contains("server.port"));
        assert!(err.to_string().contains("not a number"));
    }
}
