//! Error types for the remote command client.

use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors raised by the remote command client.
#[derive(Debug, Error)]
pub enum RconError {
    /// No password configured.
    #[error("RCON password not configured (set RCON_PASSWORD or [rcon] password)")]
    NotConfigured,

    /// TCP connect failed.
    #[error("Cannot connect to RCON at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The server rejected the password.
    #[error("RCON authentication failed")]
    AuthFailed,

    /// Read or write on an open connection failed.
    #[error("RCON I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server sent something that is not an RCON packet.
    #[error("Malformed RCON packet: {0}")]
    Protocol(String),
}

impl RconError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RconError::NotConfigured | RconError::AuthFailed => ErrorCategory::Configuration,
            _ => ErrorCategory::Network,
        }
    }
}
