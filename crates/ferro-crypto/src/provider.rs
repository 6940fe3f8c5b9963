//! Trait-based interfaces the TLS engine programs against.

use ferro_types::CryptoError;

/// A hash / message digest algorithm with incremental input.
pub trait Digest: Send + Sync {
    /// The output size in bytes.
    fn output_size(&self) -> usize;

    /// The internal block size in bytes.
    fn block_size(&self) -> usize;

    /// Feed data into the hash state.
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash, write the digest to `out`, and reset the state.
    /// `out` must be at least `output_size()` bytes.
    fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError>;

    /// Reset the hash state to process a new message.
    fn reset(&mut self);
}

/// An AEAD cipher as the record layer consumes it.
pub trait TlsAead: Send + Sync {
    /// Authentication tag length in bytes.
    fn tag_size(&self) -> usize;

    /// Encrypt `plaintext`; returns `ciphertext || tag`.
    fn encrypt(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Decrypt `ciphertext || tag`; returns the plaintext or
    /// `AeadTagVerifyFail`.
    fn decrypt(&self, nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>;
}
