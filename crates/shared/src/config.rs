//! Application configuration management.
//!
//! Layered loading: `config/default.toml`, a `RUN_MODE` file, `DECIFRAME__`
//! environment overrides, and finally the flat environment keys recognized by
//! the deployment contract (`DATABASE_URL`, `SECRET_KEY`, `FROM_EMAIL`, ...).

use serde::Deserialize;

use crate::types::DateFormat;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Auth / session configuration.
    pub auth: AuthConfig,
    /// Outbound email configuration. Absent section disables outbound email.
    #[serde(default)]
    pub email: Option<EmailConfig>,
    /// Tenant and workflow defaults.
    #[serde(default)]
    pub app: AppSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection recycle window in seconds.
    #[serde(default = "default_recycle_secs")]
    pub recycle_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_recycle_secs() -> u64 {
    300
}

/// Auth configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Session (access token) lifetime in hours.
    #[serde(default = "default_session_hours")]
    pub session_hours: i64,
}

fn default_session_hours() -> i64 {
    12
}

/// Outbound email (SMTP) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
    /// From address for all outbound mail.
    pub from_email: String,
    /// From display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Base URL used when building links in email bodies.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    1025
}

fn default_from_name() -> String {
    "DeciFrame".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@deciframe.app".to_string(),
            from_name: default_from_name(),
            frontend_url: default_frontend_url(),
        }
    }
}

/// Tenant defaults and feature gates.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// Monetary threshold above which a business case must be Full depth.
    #[serde(default = "default_full_case_threshold")]
    pub full_case_threshold: rust_decimal::Decimal,
    /// Permit a case to be both reactive and proactive.
    #[serde(default)]
    pub enable_hybrid_cases: bool,
    /// Gate for AI requirement generation.
    #[serde(default)]
    pub enable_ai_reqs: bool,
    /// Default organization currency code.
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// Default organization date format.
    #[serde(default)]
    pub default_date_format: DateFormat,
    /// Default organization timezone.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    /// Directory report PDFs are written to.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: String,
    /// Days ahead the milestone due-soon sweep looks.
    #[serde(default = "default_due_soon_days")]
    pub milestone_due_soon_days: i64,
    /// Workflow event queue capacity.
    #[serde(default = "default_queue_capacity")]
    pub event_queue_capacity: usize,
    /// Optional error-sink DSN.
    #[serde(default)]
    pub sentry_dsn: Option<String>,
    /// Optional AI-insight provider key. Absence disables AI review insights.
    #[serde(default)]
    pub openai_api_key: Option<String>,
}

fn default_full_case_threshold() -> rust_decimal::Decimal {
    rust_decimal::Decimal::new(25_000, 0)
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_reports_dir() -> String {
    "reports".to_string()
}

fn default_due_soon_days() -> i64 {
    1
}

fn default_queue_capacity() -> usize {
    1000
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_case_threshold: default_full_case_threshold(),
            enable_hybrid_cases: false,
            enable_ai_reqs: false,
            default_currency: default_currency(),
            default_date_format: DateFormat::default(),
            default_timezone: default_timezone(),
            reports_dir: default_reports_dir(),
            milestone_due_soon_days: default_due_soon_days(),
            event_queue_capacity: default_queue_capacity(),
            sentry_dsn: None,
            openai_api_key: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from config files and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or deserialized.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DECIFRAME").separator("__"));

        // Flat environment keys from the deployment contract.
        builder = builder
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("auth.secret", std::env::var("SECRET_KEY").ok())?
            .set_override_option("email.from_email", std::env::var("FROM_EMAIL").ok())?
            .set_override_option("app.sentry_dsn", std::env::var("SENTRY_DSN").ok())?
            .set_override_option("app.openai_api_key", std::env::var("OPENAI_API_KEY").ok())?
            .set_override_option(
                "app.full_case_threshold",
                std::env::var("FULL_CASE_THRESHOLD").ok(),
            )?
            .set_override_option(
                "app.enable_hybrid_cases",
                std::env::var("ENABLE_HYBRID_CASES").ok(),
            )?
            .set_override_option("app.enable_ai_reqs", std::env::var("ENABLE_AI_REQS").ok())?
            .set_override_option(
                "app.default_currency",
                std::env::var("DEFAULT_CURRENCY").ok(),
            )?
            .set_override_option(
                "app.default_date_format",
                std::env::var("DEFAULT_DATE_FORMAT").ok(),
            )?
            .set_override_option(
                "app.default_timezone",
                std::env::var("DEFAULT_TIMEZONE").ok(),
            )?;

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_settings_defaults() {
        let settings = AppSettings::default();
        assert_eq!(
            settings.full_case_threshold,
            rust_decimal::Decimal::new(25_000, 0)
        );
        assert_eq!(settings.default_currency, "USD");
        assert_eq!(settings.default_timezone, "UTC");
        assert_eq!(settings.milestone_due_soon_days, 1);
        assert_eq!(settings.event_queue_capacity, 1000);
        assert!(!settings.enable_hybrid_cases);
        assert!(settings.sentry_dsn.is_none());
    }

    #[test]
    fn test_session_default_is_twelve_hours() {
        assert_eq!(default_session_hours(), 12);
    }

    #[test]
    fn test_email_config_default() {
        let config = EmailConfig::default();
        assert_eq!(config.smtp_host, "localhost");
        assert_eq!(config.smtp_port, 1025);
    }
}
