use config::{Config, ConfigError, Environment, File};
use relay_core::{Contact, Directory, PhoneError, PhoneNumber, Role};
use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// SMS gateway configuration
    pub gateway: GatewayConfig,
    /// Mail transport for operator alerts; optional
    pub mail: Option<MailConfig>,
    /// Known contacts
    pub directory: DirectoryConfig,
    /// Broadcast notifier tuning
    pub notifier: NotifierConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
}

/// SMS gateway configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GatewayConfig {
    /// Twilio configuration
    pub twilio: Option<TwilioConfig>,
}

/// Twilio gateway configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TwilioConfig {
    /// Account SID
    pub account_sid: String,
    /// Auth Token
    pub auth_token: String,
    /// Service-owned number used as the From of every outbound send
    pub from_number: String,
}

/// Mail transport configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MailConfig {
    /// Mailgun API key
    pub api_key: String,
    /// Mailgun sending domain
    pub domain: String,
    /// Sender address for alert mail
    pub sender: String,
    /// Operator addresses that receive mail alerts
    pub operators: Vec<String>,
}

/// Contact directory configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DirectoryConfig {
    pub contacts: Vec<ContactEntry>,
}

/// One directory entry as written in configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContactEntry {
    pub phone: String,
    pub name: String,
    pub roles: Vec<Role>,
}

/// Broadcast notifier configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NotifierConfig {
    /// Per-recipient send timeout in seconds (default: 5)
    pub send_timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: json or pretty (default: json)
    pub format: String,
}

/// A directory entry whose phone number does not parse
#[derive(Debug, thiserror::Error)]
#[error("invalid directory entry {phone:?}: {source}")]
pub struct DirectoryConfigError {
    pub phone: String,
    #[source]
    pub source: PhoneError,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            timeout_seconds: 30,
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            send_timeout_seconds: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl DirectoryConfig {
    /// Build the runtime directory, failing on the first entry whose
    /// phone number does not normalize.
    pub fn build(&self) -> Result<Directory, DirectoryConfigError> {
        let mut contacts = Vec::with_capacity(self.contacts.len());
        for entry in &self.contacts {
            let phone = PhoneNumber::parse(&entry.phone).map_err(|source| DirectoryConfigError {
                phone: entry.phone.clone(),
                source,
            })?;
            contacts.push(Contact::new(phone, entry.name.clone(), entry.roles.clone()));
        }
        Ok(Directory::from_contacts(contacts))
    }
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(Config::try_from(&AppConfig::default())?)
            // Add configuration file based on environment
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local configuration file (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with SMSRELAY_)
            .add_source(Environment::with_prefix("SMSRELAY").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            gateway: GatewayConfig::default(),
            mail: None,
            directory: DirectoryConfig::default(),
            notifier: NotifierConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
