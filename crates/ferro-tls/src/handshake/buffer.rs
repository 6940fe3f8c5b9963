//! Handshake message defragmentation.
//!
//! Handshake messages may span record boundaries; successive Handshake-type
//! record fragments are accumulated here and complete messages emitted in
//! order. HelloRequests can be passed through, dropped, or dropped until a
//! Finished has passed through, selected by the caller per connection state.

use std::collections::VecDeque;

use ferro_types::TlsError;
use zeroize::Zeroize;

use super::codec::read_u24;
use super::{HandshakeMessage, HandshakeType};

/// How HelloRequest messages are treated while collecting fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelloRequestPolicy {
    /// Emit HelloRequests like any other message.
    Include,
    /// Drop HelloRequests silently.
    Ignore,
    /// Drop HelloRequests until a Finished message has been emitted.
    IgnoreUntilFinished,
}

/// The most messages one flight may buffer; a server flight is at most
/// ServerHello, Certificate, ServerKeyExchange, CertificateRequest,
/// ServerHelloDone.
const MAX_BUFFERED_MESSAGES: usize = 5;

pub struct HandshakeBuffer {
    pending: Vec<u8>,
    messages: VecDeque<HandshakeMessage>,
    finished_seen: bool,
}

impl Drop for HandshakeBuffer {
    fn drop(&mut self) {
        self.pending.zeroize();
    }
}

impl HandshakeBuffer {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            messages: VecDeque::new(),
            finished_seen: false,
        }
    }

    /// Feed one Handshake record fragment, emitting any messages it
    /// completes into the internal queue.
    pub fn push_fragment(
        &mut self,
        fragment: &[u8],
        policy: HelloRequestPolicy,
    ) -> Result<(), TlsError> {
        if fragment.is_empty() {
            return Err(TlsError::DecodeError("empty handshake record".into()));
        }
        self.pending.extend_from_slice(fragment);

        loop {
            if self.pending.len() < 4 {
                break;
            }
            let msg_type = HandshakeType::from_u8(self.pending[0])?;
            let length = read_u24(&self.pending[1..]);
            let total = 4 + length;
            if self.pending.len() < total {
                break;
            }

            let raw: Vec<u8> = self.pending.drain(..total).collect();

            if msg_type == HandshakeType::HelloRequest {
                let drop_it = match policy {
                    HelloRequestPolicy::Include => false,
                    HelloRequestPolicy::Ignore => true,
                    HelloRequestPolicy::IgnoreUntilFinished => !self.finished_seen,
                };
                if drop_it {
                    continue;
                }
            }
            if msg_type == HandshakeType::Finished {
                self.finished_seen = true;
            }

            self.messages.push_back(HandshakeMessage { msg_type, raw });
            if self.messages.len() > MAX_BUFFERED_MESSAGES {
                return Err(TlsError::UnexpectedMessage(
                    "too many handshake messages in one flight".into(),
                ));
            }
        }
        Ok(())
    }

    /// Next complete message in arrival order.
    pub fn pop_message(&mut self) -> Option<HandshakeMessage> {
        self.messages.pop_front()
    }

    /// True when a complete ServerHelloDone is queued.
    pub fn contains_server_hello_done(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.msg_type == HandshakeType::ServerHelloDone)
    }

    /// True when a partial message is waiting for more record fragments. A
    /// handshake message must never span a ChangeCipherSpec boundary.
    pub fn has_partial(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of complete messages queued.
    pub fn queued_len(&self) -> usize {
        self.messages.len()
    }

    /// Restart for a new flight.
    pub fn reset(&mut self) {
        self.pending.zeroize();
        self.pending.clear();
        self.messages.clear();
        self.finished_seen = false;
    }
}

impl Default for HandshakeBuffer {
    fn default() -> Self {
        Self::new()
    }
}
