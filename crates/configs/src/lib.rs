//! # Configs
//!
//! Layered settings for the help-desk server.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `config/{HELPDESK_ENV}.toml` (optional)
//! 4. `HELPDESK__SECTION__KEY` environment variables (a `.env` file is read first)
//! 5. `JWT_SECRET`, kept for existing deployments
//!
//! [`Settings::load`] also validates. A missing signing key is fatal unless
//! `auth.dev_mode` is set.

use config::{Config, Environment, File, FileFormat};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Used only when `auth.dev_mode = true` and no key is configured.
const DEV_SIGNING_KEY: &str = "helpdesk-dev-only-signing-key";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("auth.jwt_secret is not set; set HELPDESK__AUTH__JWT_SECRET or enable auth.dev_mode")]
    MissingSigningKey,

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Without a URL the server runs on the in-memory store.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<SecretString>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: Option<SecretString>,
    pub issuer: String,
    pub token_ttl_hours: i64,
    pub dev_mode: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            issuer: "helpdesk".into(),
            token_ttl_hours: 24,
            dev_mode: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive, e.g. `info,sqlx=warn`.
    pub filter: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            json: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Reads every source listed in the module docs, then validates.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let env_name = std::env::var("HELPDESK_ENV").unwrap_or_else(|_| "development".into());

        let settings: Settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{env_name}")).required(false))
            .add_source(
                Environment::with_prefix("HELPDESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("auth.jwt_secret", std::env::var("JWT_SECRET").ok())?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Parses a TOML document on top of the defaults. No environment input.
    pub fn from_toml(toml: &str) -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.token_ttl_hours <= 0 {
            return Err(SettingsError::Invalid(
                "auth.token_ttl_hours must be positive".into(),
            ));
        }
        if self.auth.issuer.trim().is_empty() {
            return Err(SettingsError::Invalid("auth.issuer must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(SettingsError::Invalid(
                "database.max_connections must be positive".into(),
            ));
        }
        self.signing_key().map(|_| ())
    }

    /// The configured signing key, or the development key in dev mode.
    pub fn signing_key(&self) -> Result<SecretString> {
        match &self.auth.jwt_secret {
            Some(secret) if !secret.expose_secret().trim().is_empty() => {
                Ok(SecretString::from(secret.expose_secret().to_string()))
            }
            _ if self.auth.dev_mode => {
                warn!("no signing key configured, using the development key");
                Ok(SecretString::from(DEV_SIGNING_KEY.to_string()))
            }
            _ => Err(SettingsError::MissingSigningKey),
        }
    }
}
