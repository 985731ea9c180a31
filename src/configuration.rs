use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};

use crate::domain::UserEmail;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub email_client: EmailClientSettings,
    pub mail: MailSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub base_url: String,
    /// Signs the session and flash message cookies; must be at least 64 bytes long.
    pub secret_key: Secret<String>,
    pub debug: bool,
    pub testing: bool,
    pub log_directory: String,
    pub admins: Vec<String>,
    pub languages: Vec<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub posts_per_page: u32,
}

impl ApplicationSettings {
    /// Production sinks (rotating file, mail alerts) only apply outside debug and testing.
    pub fn is_production(&self) -> bool {
        !self.debug && !self.testing
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub path: String,
    pub create_if_missing: bool,
}

impl DatabaseSettings {
    pub fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(self.create_if_missing)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    pub authorization_token: Secret<String>,
    pub timeout_milliseconds: u64,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<UserEmail, String> {
        UserEmail::parse(self.sender_email.clone())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

/// Outbound SMTP used for error alerts to the admins.
#[derive(serde::Deserialize, Clone)]
pub struct MailSettings {
    pub server: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<Secret<String>>,
    pub use_tls: bool,
}

impl MailSettings {
    /// The configured server, treating an empty value as unset.
    pub fn server(&self) -> Option<&str> {
        self.server.as_deref().filter(|server| !server.trim().is_empty())
    }

    /// Credentials are sent when either half is present, matching how most relays are configured.
    pub fn credentials(&self) -> Option<(String, Secret<String>)> {
        let username = self.username.clone().filter(|u| !u.is_empty());
        let password = self
            .password
            .clone()
            .filter(|p| !p.expose_secret().is_empty());
        if username.is_none() && password.is_none() {
            return None;
        }
        Some((
            username.unwrap_or_default(),
            password.unwrap_or_else(|| Secret::new(String::new())),
        ))
    }
}

/// Loads settings from `configuration/base.yaml`, the file for the current
/// `APP_ENVIRONMENT`, and `APP_`-prefixed environment variables, in that order.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT.");
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // e.g. `APP_MAIL__SERVER=smtp.example.com` sets `Settings.mail.server`
        // and `APP_APPLICATION__ADMINS=a@example.com,b@example.com` sets `Settings.application.admins`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("application.admins")
                .with_list_parse_key("application.languages"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}

/// The possible runtime environments for the application.
#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}
