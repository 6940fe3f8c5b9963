//! Handshake transcript accumulation.
//!
//! Buffers the raw handshake messages and replays them through a fresh
//! digest on demand. A single buffer serves every transcript the engine
//! needs: the PRF-hash value before the client Finished (client verify_data
//! input), the value after it (server verify_data input), and the SHA-1
//! digest for CertificateVerify.

use ferro_crypto::hash::HashAlgId;
use zeroize::Zeroize;

pub struct Transcript {
    buffer: Vec<u8>,
    hash: HashAlgId,
}

impl Drop for Transcript {
    fn drop(&mut self) {
        self.buffer.zeroize();
    }
}

impl Transcript {
    pub fn new(hash: HashAlgId) -> Self {
        Self {
            buffer: Vec::new(),
            hash,
        }
    }

    /// Switch the PRF hash once ServerHello fixes the suite. The buffered
    /// messages carry over.
    pub fn set_hash(&mut self, hash: HashAlgId) {
        self.hash = hash;
    }

    /// Append a complete handshake message (header + body).
    pub fn update(&mut self, message: &[u8]) {
        self.buffer.extend_from_slice(message);
    }

    /// The transcript hash under the negotiated PRF hash.
    pub fn current_hash(&self) -> Vec<u8> {
        self.hash.digest(&self.buffer)
    }

    /// The transcript hash under an explicit algorithm (SHA-1 for
    /// CertificateVerify).
    pub fn hash_with(&self, hash: HashAlgId) -> Vec<u8> {
        hash.digest(&self.buffer)
    }

    /// Wipe and restart for a new handshake.
    pub fn reset(&mut self) {
        self.buffer.zeroize();
        self.buffer.clear();
    }
}
