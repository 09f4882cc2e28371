//! Switch connection configuration

use std::time::Duration;

/// TCP port the switch listens on for TL1 sessions.
pub const TL1_PORT: u16 = 3082;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection parameters for one switch session.
///
/// # Example
///
/// ```
/// use polatis_rs::SwitchConfig;
///
/// let config = SwitchConfig::new("10.0.0.5", "admin", "secret");
/// assert_eq!(config.port, 3082);
/// ```
#[must_use]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SwitchConfig {
    /// Switch hostname or IP address
    pub host: String,

    /// TL1 port, 3082 on every observed switch
    #[serde(default = "default_port")]
    pub port: u16,

    /// Username for `act-user`
    pub username: String,

    /// Password for `act-user`
    pub password: String,

    /// TCP connect timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Socket read timeout; a silent switch surfaces as
    /// [`Tl1Error::TimedOut`](crate::Tl1Error::TimedOut) instead of blocking
    /// forever
    #[serde(default = "default_read_timeout")]
    pub read_timeout: Duration,
}

fn default_port() -> u16 {
    TL1_PORT
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_read_timeout() -> Duration {
    DEFAULT_READ_TIMEOUT
}

impl SwitchConfig {
    /// Configuration for the standard TL1 port with default timeouts.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: TL1_PORT,
            username: username.into(),
            password: password.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Override the TL1 port (used by the mock-switch tests).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Override the socket read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Override the TCP connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
