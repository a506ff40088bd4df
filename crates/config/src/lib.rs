use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "ecole.toml",
    "config/ecole.toml",
    "crates/config/ecole.toml",
    "../ecole.toml",
    "../config/ecole.toml",
    "../crates/config/ecole.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub school: SchoolConfig,
}

/// Which persistent store adapter backs the portal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    Sqlite,
    Rest,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub rest: RestStoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://ecole.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Connection settings for a PostgREST-compatible table service.
///
/// ```
/// use ecole_config::RestStoreConfig;
///
/// let rest = RestStoreConfig::default();
/// assert_eq!(rest.request_timeout_seconds, 15);
/// assert!(rest.api_key.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestStoreConfig {
    #[serde(default = "RestStoreConfig::default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "RestStoreConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl RestStoreConfig {
    fn default_base_url() -> String {
        "http://127.0.0.1:54321".to_string()
    }

    const fn default_request_timeout() -> u64 {
        15
    }
}

impl Default for RestStoreConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            api_key: None,
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "NotificationConfig::default_toast_ttl")]
    pub toast_ttl_ms: u64,
}

impl NotificationConfig {
    const fn default_toast_ttl() -> u64 {
        5_000
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            toast_ttl_ms: Self::default_toast_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "AuditConfig::default_retry_buffer_capacity")]
    pub retry_buffer_capacity: usize,
}

impl AuditConfig {
    const fn default_retry_buffer_capacity() -> usize {
        50
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            retry_buffer_capacity: Self::default_retry_buffer_capacity(),
        }
    }
}

/// Settings for the generative text service behind the assistant page and
/// the rewrite tool.
///
/// ```
/// use ecole_config::AssistantConfig;
///
/// let assistant = AssistantConfig::default();
/// assert_eq!(assistant.base_url, "https://generativelanguage.googleapis.com/v1beta");
/// assert_eq!(assistant.request_timeout_seconds, 30);
/// assert!(assistant.api_key.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "AssistantConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "AssistantConfig::default_model")]
    pub model: String,
    #[serde(default = "AssistantConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl AssistantConfig {
    fn default_base_url() -> String {
        "https://generativelanguage.googleapis.com/v1beta".to_string()
    }

    fn default_model() -> String {
        "gemini-2.5-flash".to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Self::default_base_url(),
            model: Self::default_model(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailMode {
    /// Hand the composed message to the local mail client.
    #[default]
    Mailto,
    /// Submit the message to a provider dispatch endpoint.
    Provider,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub mode: MailMode,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "MailConfig::default_sender_address")]
    pub sender_address: String,
    #[serde(default = "MailConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl MailConfig {
    fn default_sender_address() -> String {
        "no-reply@ecole.local".to_string()
    }

    const fn default_request_timeout() -> u64 {
        15
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            mode: MailMode::default(),
            endpoint: None,
            api_key: None,
            sender_address: Self::default_sender_address(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolConfig {
    #[serde(default = "SchoolConfig::default_name")]
    pub default_name: String,
}

impl SchoolConfig {
    fn default_name() -> String {
        "Mon École".to_string()
    }
}

impl Default for SchoolConfig {
    fn default() -> Self {
        Self {
            default_name: Self::default_name(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use ecole_config::load;
///
/// std::env::remove_var("ECOLE_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert_eq!(config.notifications.toast_ttl_ms, 5_000);
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("store.backend", "sqlite")?
        .set_default("store.database.url", defaults.store.database.url.clone())?
        .set_default(
            "store.database.max_connections",
            i64::from(defaults.store.database.max_connections),
        )?
        .set_default(
            "notifications.toast_ttl_ms",
            i64::try_from(defaults.notifications.toast_ttl_ms).unwrap_or(i64::MAX),
        )?
        .set_default(
            "audit.retry_buffer_capacity",
            i64::try_from(defaults.audit.retry_buffer_capacity).unwrap_or(i64::MAX),
        )?
        .set_default("school.default_name", defaults.school.default_name.clone())?;

    let environment_overrides = config::Environment::with_prefix("ECOLE").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("ECOLE_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via ECOLE_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.notifications.toast_ttl_ms == 0 {
        config.notifications.toast_ttl_ms = NotificationConfig::default_toast_ttl();
    }

    debug!(backend = ?config.store.backend, "loaded portal configuration");
    Ok(config)
}
