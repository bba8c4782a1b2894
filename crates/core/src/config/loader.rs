use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
///
/// Nested keys are addressed with a double underscore, e.g.
/// `TRIAGE_API__SESSION_TOKEN`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("TRIAGE_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[api]
base_url = "https://desk.example.com/api"

[agent]
id = "agent-7"
name = "Grace"

[refresh]
dashboard_interval_ms = 15000
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.refresh.dashboard_interval_ms, 15000);
        assert_eq!(config.refresh.detail_interval_ms, 10000);
        assert_eq!(config.filters.search_debounce_ms, 500);
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn test_load_config_from_str_missing_agent() {
        let toml = r#"
[api]
base_url = "https://desk.example.com/api"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/triage.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[api]
base_url = "http://127.0.0.1:3000"
session_token = "abc"

[agent]
id = "agent-1"
name = "Linus"

[filters]
default_page_size = 50
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.api.session_token.as_deref(), Some("abc"));
        assert_eq!(config.filters.default_page_size, 50);
        assert_eq!(config.agent.name, "Linus");
    }
}
