//! Remote command collaborator.
//!
//! Used to ask a running server to shut down before destructive world
//! operations, and for ad-hoc operator commands.

mod client;
mod error;
mod packet;

pub use client::{RconClient, RCON_TIMEOUT};
pub use error::RconError;
pub use packet::{Packet, PacketType, MAX_PAYLOAD};

/// Sends one text command to the running server.
pub trait RemoteCommand: Send + Sync {
    /// Run `command` and return the server's reply text.
    fn send(&self, command: &str) -> Result<String, RconError>;
}
