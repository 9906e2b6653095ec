//! Hub configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `LISTEN_ADDR` is set but is not a socket address.
    #[error("invalid LISTEN_ADDR: {0}")]
    ListenAddr(#[from] std::net::AddrParseError),

    /// `JWT_SECRET` is unset or empty.
    #[error("JWT_SECRET must be set and non-empty")]
    MissingSecret,

    /// A value is out of its allowed range.
    #[error("invalid {key}: {reason}")]
    Invalid {
        /// Offending variable.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Per-connection liveness timing.
///
/// The outbound pump pings every `heartbeat_interval`; the inbound pump
/// drops the connection if no pong arrives within `read_deadline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessConfig {
    /// Interval between ping frames.
    pub heartbeat_interval: Duration,
    /// Maximum silence tolerated after the last pong.
    pub read_deadline: Duration,
    /// Upper bound on a single frame write.
    pub write_timeout: Duration,
}

impl LivenessConfig {
    /// Checks that a ping can round-trip before the read deadline fires.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the read deadline is not
    /// strictly greater than the heartbeat interval, or any value is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "HUB_HEARTBEAT_INTERVAL_SECS",
                reason: "heartbeat interval must be non-zero".to_string(),
            });
        }
        if self.write_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "HUB_WRITE_TIMEOUT_SECS",
                reason: "write timeout must be non-zero".to_string(),
            });
        }
        if self.read_deadline <= self.heartbeat_interval {
            return Err(ConfigError::Invalid {
                key: "HUB_READ_DEADLINE_SECS",
                reason: format!(
                    "read deadline ({:?}) must exceed heartbeat interval ({:?})",
                    self.read_deadline, self.heartbeat_interval
                ),
            });
        }
        Ok(())
    }
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(54),
            read_deadline: Duration::from_secs(60),
            write_timeout: Duration::from_secs(10),
        }
    }
}

/// Everything a new connection needs from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    /// Capacity of the client's outbound queue.
    pub queue_capacity: usize,
    /// Largest inbound WebSocket message accepted, in bytes.
    pub max_message_size: usize,
    /// Heartbeat and deadline timing.
    pub liveness: LivenessConfig,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            max_message_size: 512,
            liveness: LivenessConfig::default(),
        }
    }
}

/// Top-level hub configuration.
///
/// Loaded once at startup via [`HubConfig::from_env`].
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// HMAC secret used to verify handshake and admin tokens.
    pub jwt_secret: String,

    /// Capacity of each client's outbound queue.
    pub client_queue_capacity: usize,

    /// Capacity of the hub control loop inbox.
    pub control_capacity: usize,

    /// Largest inbound WebSocket message accepted, in bytes.
    pub max_message_size: usize,

    /// Heartbeat and deadline timing.
    pub liveness: LivenessConfig,
}

impl HubConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults for everything except `JWT_SECRET`.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `LISTEN_ADDR` cannot be parsed,
    /// `JWT_SECRET` is missing, or a capacity or timing value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let client_queue_capacity = parse_env("HUB_CLIENT_QUEUE_CAPACITY", 256);
        let control_capacity = parse_env("HUB_CONTROL_CAPACITY", 1024);
        let max_message_size = parse_env("HUB_MAX_MESSAGE_SIZE", 512);

        let liveness = LivenessConfig {
            heartbeat_interval: Duration::from_secs(parse_env("HUB_HEARTBEAT_INTERVAL_SECS", 54)),
            read_deadline: Duration::from_secs(parse_env("HUB_READ_DEADLINE_SECS", 60)),
            write_timeout: Duration::from_secs(parse_env("HUB_WRITE_TIMEOUT_SECS", 10)),
        };

        let config = Self {
            listen_addr,
            jwt_secret,
            client_queue_capacity,
            control_capacity,
            max_message_size,
            liveness,
        };
        config.validate()?;
        Ok(config)
    }

    /// Returns the per-connection subset of this configuration.
    #[must_use]
    pub const fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            queue_capacity: self.client_queue_capacity,
            max_message_size: self.max_message_size,
            liveness: self.liveness,
        }
    }

    /// Checks capacities and liveness timing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for zero capacities or an invalid
    /// [`LivenessConfig`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("HUB_CLIENT_QUEUE_CAPACITY", self.client_queue_capacity),
            ("HUB_CONTROL_CAPACITY", self.control_capacity),
            ("HUB_MAX_MESSAGE_SIZE", self.max_message_size),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        self.liveness.validate()
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
