use std::net::{Ipv6Addr, SocketAddr, SocketAddrV6};

pub const DEFAULT_AVWX_BASE_URI: &str = "https://avwx.rest/api";
pub const DEFAULT_TWILIO_BASE_URI: &str = "https://api.twilio.com";

/// The port the webhook listens on.
pub const LISTEN_PORT: u16 = 8123;

/// Process-wide settings, read once at startup.
#[derive(Clone, Eq, PartialEq)]
pub struct Config {
    /// Sent verbatim as the `Authorization` header to the weather API
    pub avwx_token: String,

    /// Root of the weather API, without a trailing slash
    pub avwx_base_uri: String,

    /// The number replies are sent from
    pub sender: String,

    pub twilio_account_sid: String,
    pub twilio_auth_token: String,

    /// Root of the messaging API, without a trailing slash
    pub twilio_base_uri: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let optional = |name: &'static str, default: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            avwx_token: required("AVWX_TOKEN")?,
            avwx_base_uri: optional("AVWX_BASE_URI", DEFAULT_AVWX_BASE_URI),
            sender: required("TWILIO_PHONE_NUMBER")?,
            twilio_account_sid: required("TWILIO_ACCOUNT_SID")?,
            twilio_auth_token: required("TWILIO_AUTH_TOKEN")?,
            twilio_base_uri: optional("TWILIO_BASE_URI", DEFAULT_TWILIO_BASE_URI),
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, LISTEN_PORT, 0, 0).into()
    }
}

// Credentials stay out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("avwx_base_uri", &self.avwx_base_uri)
            .field("sender", &self.sender)
            .field("twilio_account_sid", &self.twilio_account_sid)
            .field("twilio_base_uri", &self.twilio_base_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{} must be set", name),
        }
    }
}

impl std::error::Error for ConfigError {}
