//! RCON wire format.
//!
//! ```text
//! i32 length (LE, counts everything after itself)
//! i32 request id (LE)
//! i32 type (LE)
//! payload bytes
//! 0x00 0x00
//! ```

use std::io::{Read, Write};

use super::RconError;

/// Largest payload a server sends in one packet.
pub const MAX_PAYLOAD: usize = 4096;

/// Packet types used by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Auth,
    ExecCommand,
    /// Server reply to a command.
    ResponseValue,
    Other(i32),
}

impl PacketType {
    pub fn code(self) -> i32 {
        match self {
            PacketType::Auth => 3,
            PacketType::ExecCommand => 2,
            PacketType::ResponseValue => 0,
            PacketType::Other(c) => c,
        }
    }

    /// Auth responses share code 2 with commands, so decoding maps 2 to
    /// `ExecCommand`.
    pub fn from_code(code: i32) -> Self {
        match code {
            3 => PacketType::Auth,
            2 => PacketType::ExecCommand,
            0 => PacketType::ResponseValue,
            c => PacketType::Other(c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub kind: PacketType,
    pub payload: String,
}

impl Packet {
    pub fn new(id: i32, kind: PacketType, payload: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            payload: payload.into(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let body = self.payload.as_bytes();
        let length = (4 + 4 + body.len() + 2) as i32;
        let mut buf = Vec::with_capacity(4 + length as usize);
        buf.extend_from_slice(&length.to_le_bytes());
        buf.extend_from_slice(&self.id.to_le_bytes());
        buf.extend_from_slice(&self.kind.code().to_le_bytes());
        buf.extend_from_slice(body);
        buf.extend_from_slice(&[0, 0]);
        buf
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), RconError> {
        writer.write_all(&self.encode())?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, RconError> {
        let mut word = [0u8; 4];
        reader.read_exact(&mut word)?;
        let length = i32::from_le_bytes(word);
        if length < 10 || length as usize > MAX_PAYLOAD + 10 {
            return Err(RconError::Protocol(format!("bad length {}", length)));
        }

        let mut body = vec![0u8; length as usize];
        reader.read_exact(&mut body)?;
        let id = i32::from_le_bytes([body[0], body[1], body[2], body[3]]);
        let kind = i32::from_le_bytes([body[4], body[5], body[6], body[7]]);
        let payload = &body[8..body.len() - 2];

        Ok(Self {
            id,
            kind: PacketType::from_code(kind),
            payload: String::from_utf8_lossy(payload).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_encode_layout() {
        let bytes = Packet::new(7, PacketType::ExecCommand, "stop").encode();
        assert_eq!(&bytes[0..4], &14i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &7i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &2i32.to_le_bytes());
        assert_eq!(&bytes[12..16], b"stop");
        assert_eq!(&bytes[16..], &[0, 0]);
    }

    #[test]
    fn test_decode_reply() {
        let sent = Packet::new(-1, PacketType::ExecCommand, "");
        let decoded = Packet::read_from(&mut Cursor::new(sent.encode())).unwrap();
        assert_eq!(decoded.id, -1);
        assert_eq!(decoded.payload, "");
    }

    #[test]
    fn test_rejects_bad_length() {
        let mut bytes = 3i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0; 3]);
        assert!(matches!(
            Packet::read_from(&mut Cursor::new(bytes)),
            Err(RconError::Protocol(_))
        ));
    }
}
