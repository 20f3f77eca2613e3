//! Endpoint message transport configuration.
//!
//! Configuration is loaded from environment variables. Every setting has a
//! default; a value that is present but cannot be parsed (or is zero) is
//! rejected rather than silently replaced.

use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default capacity of a socket's outbound frame queue.
pub const DEFAULT_SOCKET_SEND_BUFFER: usize = 256;

/// Default upper bound on inbound message text, in bytes.
///
/// Bridge channel messages are small JSON objects; anything larger is dropped
/// before it reaches the decoder.
pub const DEFAULT_MAX_INBOUND_MESSAGE_BYTES: usize = 64 * 1024;

/// Default max frame height assumed until the receiver sends a constraint.
pub const DEFAULT_MAX_FRAME_HEIGHT: i32 = 2160;

/// Endpoint message transport configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Capacity of each socket's outbound frame queue (default: 256).
    pub socket_send_buffer: usize,

    /// Inbound messages larger than this are dropped (default: 64 KiB).
    pub max_inbound_message_bytes: usize,

    /// Initial max frame height for the constraint inputs (default: 2160).
    pub default_max_frame_height: i32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            socket_send_buffer: DEFAULT_SOCKET_SEND_BUFFER,
            max_inbound_message_bytes: DEFAULT_MAX_INBOUND_MESSAGE_BYTES,
            default_max_frame_height: DEFAULT_MAX_FRAME_HEIGHT,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

impl TransportConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let socket_send_buffer = parse_positive(
            vars,
            "BRIDGE_SOCKET_SEND_BUFFER",
            DEFAULT_SOCKET_SEND_BUFFER,
        )?;

        let max_inbound_message_bytes = parse_positive(
            vars,
            "BRIDGE_MAX_INBOUND_MESSAGE_BYTES",
            DEFAULT_MAX_INBOUND_MESSAGE_BYTES,
        )?;

        let default_max_frame_height = parse_positive(
            vars,
            "BRIDGE_DEFAULT_MAX_FRAME_HEIGHT",
            DEFAULT_MAX_FRAME_HEIGHT,
        )?;

        Ok(TransportConfig {
            socket_send_buffer,
            max_inbound_message_bytes,
            default_max_frame_height,
        })
    }
}

fn parse_positive<T>(vars: &HashMap<String, String>, name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = vars.get(name) else {
        return Ok(default);
    };

    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw.clone(),
        }),
    }
}
