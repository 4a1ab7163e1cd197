//! Process configuration read from the environment.

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;

const DEV_TOKEN_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is not a valid port: {value:?}")]
    InvalidPort { name: &'static str, value: String },

    #[error("{0} is set but empty")]
    Empty(&'static str),
}

/// Everything the server needs at start-up.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub token_secret: String,
    /// `None` disables payment intents (requests answer 503).
    pub payment_secret_key: Option<String>,
    /// `None` selects the in-memory stores.
    pub database_url: Option<String>,
    pub bootstrap_admin_email: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source.
    ///
    /// Unset and blank optional values are treated alike, except for the token
    /// secret, where a blank value is an error rather than a silent fallback.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            None => DEFAULT_PORT,
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort {
                name: "PORT",
                value: raw.clone(),
            })?,
        };

        let token_secret = match lookup("ACCESS_TOKEN_SECRET") {
            Some(secret) if secret.trim().is_empty() => return Err(ConfigError::Empty("ACCESS_TOKEN_SECRET")),
            Some(secret) => secret,
            None => {
                tracing::warn!("ACCESS_TOKEN_SECRET not set; using insecure dev default");
                DEV_TOKEN_SECRET.to_string()
            }
        };

        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            port,
            token_secret,
            payment_secret_key: optional("PAYMENT_SECRET_KEY"),
            database_url: optional("DATABASE_URL"),
            bootstrap_admin_email: optional("BOOTSTRAP_ADMIN_EMAIL"),
        })
    }
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("token_secret", &"<redacted>")
            .field("payment_secret_key", &self.payment_secret_key.as_ref().map(|_| "<redacted>"))
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("bootstrap_admin_email", &self.bootstrap_admin_email)
            .finish()
    }
}
