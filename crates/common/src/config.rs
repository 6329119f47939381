//! Application configuration.

use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Outgoing mail configuration. Notifications are disabled when absent.
    #[serde(default)]
    pub mail: Option<MailConfig>,
    /// Attachment upload configuration.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Subscription policy.
    #[serde(default)]
    pub subscriptions: SubscriptionConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance. Activation links are built from it.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// SMTP mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host.
    pub host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub password: Option<String>,
    /// Sender address.
    pub from_address: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Use STARTTLS instead of implicit TLS.
    #[serde(default = "default_true")]
    pub starttls: bool,
}

/// Attachment upload configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded files are written to.
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// URL prefix uploaded files are served under.
    #[serde(default = "default_upload_base_url")]
    pub base_url: String,
}

/// Subscription policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    /// Whether an account may subscribe to its own feed.
    #[serde(default = "default_true")]
    pub allow_self: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            base_url: default_upload_base_url(),
        }
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self { allow_self: true }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Sweater".to_string()
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_upload_base_url() -> String {
    "/files".to_string()
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `SWEATER_ENV`)
    /// 3. Environment variables with `SWEATER_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("SWEATER_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SWEATER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Result<Config, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(
            r#"
            [server]
            url = "https://sweater.example"

            [database]
            url = "postgres://localhost/sweater"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.max_connections, 100);
        assert!(config.mail.is_none());
        assert_eq!(config.upload.path, PathBuf::from("./uploads"));
        assert_eq!(config.upload.base_url, "/files");
        assert!(config.subscriptions.allow_self);
    }

    #[test]
    fn test_mail_section() {
        let config = parse(
            r#"
            [server]
            url = "https://sweater.example"

            [database]
            url = "postgres://localhost/sweater"

            [mail]
            host = "smtp.example.com"
            from_address = "noreply@sweater.example"

            [subscriptions]
            allow_self = false
            "#,
        )
        .unwrap();

        let mail = config.mail.unwrap();
        assert_eq!(mail.host, "smtp.example.com");
        assert_eq!(mail.port, 587);
        assert_eq!(mail.from_name, "Sweater");
        assert!(mail.starttls);
        assert!(mail.username.is_none());
        assert!(!config.subscriptions.allow_self);
    }

    #[test]
    fn test_missing_server_url_is_error() {
        let result = parse(
            r#"
            [server]
            port = 8080

            [database]
            url = "postgres://localhost/sweater"
            "#,
        );
        assert!(result.is_err());
    }
}
