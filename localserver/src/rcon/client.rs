//! Blocking RCON client.

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use tracing::debug;

use super::packet::{Packet, PacketType};
use super::{RconError, RemoteCommand};

/// Socket timeout for connect, read and write.
pub const RCON_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a fresh connection per command.
#[derive(Debug)]
pub struct RconClient {
    host: String,
    port: u16,
    password: Option<String>,
    next_id: AtomicI32,
}

impl RconClient {
    pub fn new(host: impl Into<String>, port: u16, password: Option<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password,
            next_id: AtomicI32::new(1),
        }
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn request_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn connect(&self) -> Result<TcpStream, RconError> {
        let addr = self.addr();
        let connect_err = |source: std::io::Error| RconError::Connect {
            addr: addr.clone(),
            source,
        };
        let socket = addr
            .to_socket_addrs()
            .map_err(connect_err)?
            .next()
            .ok_or_else(|| {
                connect_err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no address resolved",
                ))
            })?;
        let stream = TcpStream::connect_timeout(&socket, RCON_TIMEOUT).map_err(connect_err)?;
        stream.set_read_timeout(Some(RCON_TIMEOUT))?;
        stream.set_write_timeout(Some(RCON_TIMEOUT))?;
        Ok(stream)
    }

    fn authenticate(&self, stream: &mut TcpStream, password: &str) -> Result<(), RconError> {
        let id = self.request_id();
        Packet::new(id, PacketType::Auth, password).write_to(stream)?;
        // Some servers send an empty response value before the auth response
        loop {
            let reply = Packet::read_from(stream)?;
            if reply.id == -1 {
                return Err(RconError::AuthFailed);
            }
            if reply.kind == PacketType::ExecCommand {
                return if reply.id == id {
                    Ok(())
                } else {
                    Err(RconError::Protocol(format!(
                        "auth reply id {} != {}",
                        reply.id, id
                    )))
                };
            }
        }
    }
}

impl RemoteCommand for RconClient {
    fn send(&self, command: &str) -> Result<String, RconError> {
        let password = self.password.as_deref().ok_or(RconError::NotConfigured)?;
        let mut stream = self.connect()?;
        self.authenticate(&mut stream, password)?;

        let id = self.request_id();
        debug!(addr = %self.addr(), command, "Sending RCON command");
        Packet::new(id, PacketType::ExecCommand, command).write_to(&mut stream)?;
        let reply = Packet::read_from(&mut stream)?;
        Ok(reply.payload)
    }
}
