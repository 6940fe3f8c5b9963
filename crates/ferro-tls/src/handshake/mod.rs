//! TLS 1.2 handshake protocol: wire codec, defragmentation, state machine.

pub mod buffer;
pub mod client;
pub mod codec;
pub mod extensions;
pub mod signing;
pub mod verify;

use ferro_types::TlsError;

/// Handshake message types (RFC 5246 §7.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandshakeType {
    HelloRequest = 0,
    ClientHello = 1,
    ServerHello = 2,
    Certificate = 11,
    ServerKeyExchange = 12,
    CertificateRequest = 13,
    ServerHelloDone = 14,
    CertificateVerify = 15,
    ClientKeyExchange = 16,
    Finished = 20,
}

impl HandshakeType {
    pub fn from_u8(v: u8) -> Result<Self, TlsError> {
        match v {
            0 => Ok(HandshakeType::HelloRequest),
            1 => Ok(HandshakeType::ClientHello),
            2 => Ok(HandshakeType::ServerHello),
            11 => Ok(HandshakeType::Certificate),
            12 => Ok(HandshakeType::ServerKeyExchange),
            13 => Ok(HandshakeType::CertificateRequest),
            14 => Ok(HandshakeType::ServerHelloDone),
            15 => Ok(HandshakeType::CertificateVerify),
            16 => Ok(HandshakeType::ClientKeyExchange),
            20 => Ok(HandshakeType::Finished),
            _ => Err(TlsError::DecodeError(format!(
                "unknown handshake type {v}"
            ))),
        }
    }
}

/// A complete handshake message: 4-byte header plus body.
#[derive(Debug, Clone)]
pub struct HandshakeMessage {
    pub msg_type: HandshakeType,
    /// Full message bytes including the header, as fed to the transcript.
    pub raw: Vec<u8>,
}

impl HandshakeMessage {
    /// The message body after the 4-byte header.
    pub fn body(&self) -> &[u8] {
        &self.raw[4..]
    }
}
