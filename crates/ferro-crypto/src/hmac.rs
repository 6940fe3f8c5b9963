//! Incremental HMAC adapter (RFC 2104) over the RustCrypto `hmac` crate.

use crate::hash::HashAlgId;
use ferro_types::CryptoError;
use hmac::{Hmac as HmacCore, Mac};

type HmacSha1 = HmacCore<sha1::Sha1>;
type HmacSha256 = HmacCore<sha2::Sha256>;
type HmacSha384 = HmacCore<sha2::Sha384>;
type HmacSha512 = HmacCore<sha2::Sha512>;

enum Inner {
    Sha1(HmacSha1),
    Sha256(HmacSha256),
    Sha384(HmacSha384),
    Sha512(HmacSha512),
}

/// HMAC context keyed at construction; `finish` resets it for reuse with the
/// same key.
pub struct Hmac {
    inner: Inner,
    output_size: usize,
}

impl Hmac {
    /// Create a new HMAC instance for the given hash algorithm and key.
    pub fn new(alg: HashAlgId, key: &[u8]) -> Result<Self, CryptoError> {
        let inner = match alg {
            HashAlgId::Sha1 => Inner::Sha1(
                HmacSha1::new_from_slice(key).map_err(|_| CryptoError::InvalidKey)?,
            ),
            HashAlgId::Sha256 => Inner::Sha256(
                HmacSha256::new_from_slice(key).map_err(|_| CryptoError::InvalidKey)?,
            ),
            HashAlgId::Sha384 => Inner::Sha384(
                HmacSha384::new_from_slice(key).map_err(|_| CryptoError::InvalidKey)?,
            ),
            HashAlgId::Sha512 => Inner::Sha512(
                HmacSha512::new_from_slice(key).map_err(|_| CryptoError::InvalidKey)?,
            ),
        };
        Ok(Self {
            inner,
            output_size: alg.output_size(),
        })
    }

    /// MAC output size in bytes.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Feed data into the MAC computation.
    pub fn update(&mut self, data: &[u8]) {
        match &mut self.inner {
            Inner::Sha1(m) => m.update(data),
            Inner::Sha256(m) => m.update(data),
            Inner::Sha384(m) => m.update(data),
            Inner::Sha512(m) => m.update(data),
        }
    }

    /// Finalize the MAC, write the tag to `out`, and reset for reuse.
    /// `out` must be at least `output_size()` bytes.
    pub fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        if out.len() < self.output_size {
            return Err(CryptoError::InvalidArg);
        }
        let n = self.output_size;
        match &mut self.inner {
            Inner::Sha1(m) => out[..n].copy_from_slice(&m.finalize_reset().into_bytes()),
            Inner::Sha256(m) => out[..n].copy_from_slice(&m.finalize_reset().into_bytes()),
            Inner::Sha384(m) => out[..n].copy_from_slice(&m.finalize_reset().into_bytes()),
            Inner::Sha512(m) => out[..n].copy_from_slice(&m.finalize_reset().into_bytes()),
        }
        Ok(())
    }

    /// One-shot MAC computation.
    pub fn mac(alg: HashAlgId, key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut ctx = Self::new(alg, key)?;
        ctx.update(data);
        let mut out = vec![0u8; ctx.output_size()];
        ctx.finish(&mut out)?;
        Ok(out)
    }
}
