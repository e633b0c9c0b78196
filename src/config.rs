use std::{fmt, time::Duration};

use lettre::message::Mailbox;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracing: TracingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub reset: ResetConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TracingConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// Administrative identity directory settings.
///
/// `base_url` and `service_key` are optional at boot: a deployment missing
/// either one still starts, and every reset request answers with a generic
/// configuration error until they are provided.
#[derive(Clone, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub service_key: Option<String>,
    /// Records requested per listing page (default: 1000)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Upper bound on listing pages walked for one lookup (default: 50)
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            service_key: None,
            page_size: default_page_size(),
            max_pages: default_max_pages(),
        }
    }
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("base_url", &self.base_url)
            .field("service_key", &self.service_key.as_ref().map(|_| "[REDACTED]"))
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("directory base url is not configured")]
    MissingDirectoryUrl,
    #[error("directory service key is not configured")]
    MissingServiceKey,
    #[error("directory base url is invalid: {0}")]
    InvalidDirectoryUrl(#[from] url::ParseError),
    #[error("directory base url cannot carry a path")]
    UnusableDirectoryUrl,
}

impl DirectoryConfig {
    /// Resolves the directory endpoint and service key, treating blank values as missing.
    ///
    /// The returned URL always ends with `/` so relative admin paths join below it.
    pub fn credentials(&self) -> Result<(Url, SecretString), ConfigurationError> {
        let base_url = non_blank(self.base_url.as_deref())
            .ok_or(ConfigurationError::MissingDirectoryUrl)?;
        let service_key = non_blank(self.service_key.as_deref())
            .ok_or(ConfigurationError::MissingServiceKey)?;

        let mut url = Url::parse(base_url)?;
        if url.cannot_be_a_base() {
            return Err(ConfigurationError::UnusableDirectoryUrl);
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok((url, SecretString::from(service_key.to_string())))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EmailConfig {
    /// Notification is switched off; every dispatch is a successful no-op
    #[default]
    Disabled,
    /// Mock mailer that captures emails for testing
    Mock,
    /// Resend transactional email HTTP API
    Resend {
        /// Missing key disables delivery
        #[serde(default)]
        api_key: Option<String>,
        #[serde(deserialize_with = "deserialize_mailbox")]
        sender: Mailbox,
        #[serde(default = "default_resend_endpoint")]
        endpoint: String,
    },
    /// Real SMTP configuration for sending emails
    Smtp {
        host: String,
        port: u16,
        #[serde(deserialize_with = "deserialize_mailbox")]
        sender: Mailbox,
        username: Option<String>,
        password: Option<String>,
        #[serde(default = "default_use_tls")]
        use_tls: bool,
    },
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("EmailConfig::Disabled"),
            Self::Mock => f.write_str("EmailConfig::Mock"),
            Self::Resend {
                api_key,
                sender,
                endpoint,
            } => f
                .debug_struct("EmailConfig::Resend")
                .field("api_key", &api_key.as_ref().map(|_| "[REDACTED]"))
                .field("sender", sender)
                .field("endpoint", endpoint)
                .finish(),
            Self::Smtp {
                host,
                port,
                sender,
                username,
                use_tls,
                ..
            } => f
                .debug_struct("EmailConfig::Smtp")
                .field("host", host)
                .field("port", port)
                .field("sender", sender)
                .field("username", username)
                .field("use_tls", use_tls)
                .finish_non_exhaustive(),
        }
    }
}

fn deserialize_mailbox<'de, D>(deserializer: D) -> Result<Mailbox, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

fn default_use_tls() -> bool {
    true
}

fn default_resend_endpoint() -> String {
    "https://api.resend.com/emails".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetConfig {
    /// Timeout applied to each upstream call in seconds (default: 10)
    #[serde(default = "default_step_timeout")]
    pub step_timeout_seconds: u64,
    /// Product name shown in the notification email
    #[serde(default = "default_product_name")]
    pub product_name: String,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            step_timeout_seconds: default_step_timeout(),
            product_name: default_product_name(),
        }
    }
}

impl ResetConfig {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_seconds)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_page_size() -> u32 {
    1000
}

const fn default_max_pages() -> u32 {
    50
}

const fn default_step_timeout() -> u64 {
    10
}

fn default_product_name() -> String {
    "CyberSec Academy".to_string()
}

#[cfg(test)]
mod tests {
    use config_rs::{Config as ConfigRs, File, FileFormat};

    use super::*;

    fn parse(yaml: &str) -> Config {
        ConfigRs::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .expect("Failed to build configuration")
            .try_deserialize()
            .expect("Failed to deserialize configuration")
    }

    #[test]
    fn test_empty_configuration_uses_defaults() {
        let config = parse("{}");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.tracing.log_level, "info");
        assert_eq!(config.reset.step_timeout(), Duration::from_secs(10));
        assert_eq!(config.directory.page_size, 1000);
        assert!(matches!(config.email, EmailConfig::Disabled));
    }

    #[test]
    fn test_missing_directory_values_are_reported() {
        let config = parse("{}");
        assert_eq!(
            config.directory.credentials().unwrap_err(),
            ConfigurationError::MissingDirectoryUrl
        );

        let config = parse("directory:\n  base_url: https://example.supabase.co\n");
        assert_eq!(
            config.directory.credentials().unwrap_err(),
            ConfigurationError::MissingServiceKey
        );
    }

    #[test]
    fn test_blank_directory_values_count_as_missing() {
        let config = parse("directory:\n  base_url: '  '\n  service_key: key\n");
        assert_eq!(
            config.directory.credentials().unwrap_err(),
            ConfigurationError::MissingDirectoryUrl
        );
    }

    #[test]
    fn test_directory_url_gets_trailing_slash() {
        let config = parse(
            "directory:
  base_url: https://example.supabase.co/proxy
  service_key: key
",
        );
        let (url, _) = config.directory.credentials().unwrap();
        assert_eq!(url.as_str(), "https://example.supabase.co/proxy/");
    }

    #[test]
    fn test_invalid_directory_url_is_rejected() {
        let config = parse("directory:\n  base_url: not a url\n  service_key: key\n");
        assert!(matches!(
            config.directory.credentials(),
            Err(ConfigurationError::InvalidDirectoryUrl(_))
        ));
    }

    #[test]
    fn test_resend_email_configuration() {
        let config = parse(
            "email:\n  type: resend\n  api_key: re_123\n  sender: Academy <noreply@example.com>\n",
        );

        match config.email {
            EmailConfig::Resend {
                api_key,
                sender,
                endpoint,
            } => {
                assert_eq!(api_key.as_deref(), Some("re_123"));
                assert_eq!(sender.email.to_string(), "noreply@example.com");
                assert_eq!(endpoint, "https://api.resend.com/emails");
            }
            other => panic!("unexpected email config: {other:?}"),
        }
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let config = parse(
            "directory:
  base_url: https://example.supabase.co
  service_key: super-secret
email:
  type: resend
  api_key: re_secret
  sender: noreply@example.com
",
        );
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("re_secret"));
    }
}
