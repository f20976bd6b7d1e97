//! Process configuration read from the environment at startup.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SHARE_TOKEN_SECRET must be set to a non-empty value")]
    MissingSecret,

    #[error("invalid PORT {0:?}")]
    InvalidPort(String),

    #[error("invalid HOST {0:?}")]
    InvalidHost(String),
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    /// HMAC key for share tokens. Must be the same on every instance.
    pub share_secret: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("share_secret", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Read `HOST`, `PORT` and `SHARE_TOKEN_SECRET`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = match lookup("HOST") {
            Some(raw) => raw
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidHost(raw))?,
            None => DEFAULT_HOST
                .parse()
                .map_err(|_| ConfigError::InvalidHost(DEFAULT_HOST.to_string()))?,
        };
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };
        let share_secret = lookup("SHARE_TOKEN_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        Ok(Self {
            addr: SocketAddr::new(host, port),
            share_secret,
        })
    }
}
