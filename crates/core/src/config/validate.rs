use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - API base URL uses http or https
/// - Agent id is not empty
/// - Poll intervals and debounce delay are not 0
/// - Default page size is within 1..=max_page_size
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.api.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "api.base_url must start with http:// or https://, got {:?}",
            config.api.base_url
        )));
    }

    if config.agent.id.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "agent.id cannot be empty".to_string(),
        ));
    }

    if config.refresh.dashboard_interval_ms == 0 || config.refresh.detail_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "refresh intervals cannot be 0".to_string(),
        ));
    }

    if config.filters.search_debounce_ms == 0 {
        return Err(ConfigError::ValidationError(
            "filters.search_debounce_ms cannot be 0".to_string(),
        ));
    }

    let filters = &config.filters;
    if filters.default_page_size == 0 || filters.default_page_size > filters.max_page_size {
        return Err(ConfigError::ValidationError(format!(
            "filters.default_page_size must be between 1 and {}",
            filters.max_page_size
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AgentConfig, ApiConfig, FilterConfig, NotificationConfig, RefreshConfig,
    };

    fn valid_config() -> Config {
        Config {
            api: ApiConfig {
                base_url: "https://desk.example.com/api".to_string(),
                session_token: None,
                timeout_secs: 30,
            },
            agent: AgentConfig {
                id: "agent-7".to_string(),
                name: "Grace".to_string(),
            },
            refresh: RefreshConfig::default(),
            filters: FilterConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_bad_scheme_fails() {
        let mut config = valid_config();
        config.api.base_url = "ftp://desk.example.com".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_interval_fails() {
        let mut config = valid_config();
        config.refresh.detail_interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_page_size_above_max_fails() {
        let mut config = valid_config();
        config.filters.default_page_size = 500;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_agent_fails() {
        let mut config = valid_config();
        config.agent.id = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }
}
