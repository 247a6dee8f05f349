//! Configuration loader.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::schema::Config;
use crate::{ENV_AGENT_PORT, ENV_AGENT_TYPE};

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file and apply env overrides.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Load the file when it exists, else start from defaults. Env
    /// overrides apply either way.
    pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(path)?;
                Self::parse(&content)?
            }
            Some(path) => return Err(ConfigError::NotFound(path.display().to_string())),
            None => Config::default(),
        };
        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("static pattern");

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Process-level overrides win over the file.
    fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        if let Ok(port) = std::env::var(ENV_AGENT_PORT) {
            config.server.port =
                port.parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: "server.port".to_string(),
                        message: format!("{ENV_AGENT_PORT}={port} is not a port number"),
                    })?;
        }
        if let Ok(kind) = std::env::var(ENV_AGENT_TYPE) {
            config.agent.kind = kind;
        }
        Ok(())
    }

    /// Expand shell-style paths (e.g. `~/.pinpoint`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_empty_config_with_defaults() {
        let config = ConfigLoader::parse("").unwrap();
        assert_eq!(config.server.port, 5567);
        assert_eq!(config.agent.kind, "cursor");
    }

    #[test]
    fn parses_basic_config() {
        let content = r#"
            [server]
            host = "0.0.0.0"
            port = 3000

            [agent]
            kind = "cursor"
            extra_args = ["--model", "fast"]
        "#;
        let config = ConfigLoader::parse(content).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.agent.extra_args, vec!["--model", "fast"]);
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 6001").unwrap();
        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.server.port, 6001);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = ConfigLoader::load_or_default(Some(Path::new("/nonexistent/pinpoint.toml")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn no_file_falls_back_to_defaults() {
        let config = ConfigLoader::load_or_default(None).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn unset_env_var_in_file_is_an_error() {
        let err = ConfigLoader::parse("[server]\nhost = \"${PINPOINT_TEST_UNSET_VAR}\"")
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotSet(_)));
    }

    #[test]
    fn expand_path_resolves_tilde() {
        let expanded = ConfigLoader::expand_path("~/.pinpoint");
        assert!(!expanded.starts_with('~'));
    }
}
