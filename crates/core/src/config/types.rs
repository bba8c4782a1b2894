use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::notify::Severity;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub api: ApiConfig,
    pub agent: AgentConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Ticket API connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the ticket API (e.g., "https://desk.example.com/api")
    pub base_url: String,
    /// Session credential sent with every request
    #[serde(default)]
    pub session_token: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// The agent using the dashboard
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AgentConfig {
    pub id: String,
    pub name: String,
}

/// Background polling intervals
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshConfig {
    /// Poll interval for the dashboard queues (milliseconds).
    #[serde(default = "default_dashboard_interval")]
    pub dashboard_interval_ms: u64,
    /// Poll interval for an open ticket's comment thread (milliseconds).
    #[serde(default = "default_detail_interval")]
    pub detail_interval_ms: u64,
}

fn default_dashboard_interval() -> u64 {
    30_000
}

fn default_detail_interval() -> u64 {
    10_000
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            dashboard_interval_ms: default_dashboard_interval(),
            detail_interval_ms: default_detail_interval(),
        }
    }
}

impl RefreshConfig {
    pub fn dashboard_interval(&self) -> Duration {
        Duration::from_millis(self.dashboard_interval_ms)
    }

    pub fn detail_interval(&self) -> Duration {
        Duration::from_millis(self.detail_interval_ms)
    }
}

/// Filter and pagination defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    #[serde(default = "default_debounce")]
    pub search_debounce_ms: u64,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_debounce() -> u64 {
    500
}

fn default_page_size() -> u32 {
    25
}

fn default_max_page_size() -> u32 {
    100
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: default_debounce(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl FilterConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

/// How long notifications stay visible, per severity (milliseconds)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    #[serde(default = "default_short_toast")]
    pub success_ms: u64,
    #[serde(default = "default_short_toast")]
    pub info_ms: u64,
    #[serde(default = "default_warning_toast")]
    pub warning_ms: u64,
    #[serde(default = "default_error_toast")]
    pub error_ms: u64,
}

fn default_short_toast() -> u64 {
    3000
}

fn default_warning_toast() -> u64 {
    5000
}

fn default_error_toast() -> u64 {
    6000
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            success_ms: default_short_toast(),
            info_ms: default_short_toast(),
            warning_ms: default_warning_toast(),
            error_ms: default_error_toast(),
        }
    }
}

impl NotificationConfig {
    pub fn auto_dismiss(&self, severity: Severity) -> Duration {
        let ms = match severity {
            Severity::Success => self.success_ms,
            Severity::Info => self.info_ms,
            Severity::Warning => self.warning_ms,
            Severity::Error => self.error_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub api: SanitizedApiConfig,
    pub agent: AgentConfig,
    pub refresh: RefreshConfig,
    pub filters: FilterConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedApiConfig {
    pub base_url: String,
    pub session_token: Option<String>,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            api: SanitizedApiConfig {
                base_url: config.api.base_url.clone(),
                session_token: config
                    .api
                    .session_token
                    .as_ref()
                    .map(|_| "[REDACTED]".to_string()),
                timeout_secs: config.api.timeout_secs,
            },
            agent: config.agent.clone(),
            refresh: config.refresh.clone(),
            filters: config.filters.clone(),
            notifications: config.notifications.clone(),
        }
    }
}
