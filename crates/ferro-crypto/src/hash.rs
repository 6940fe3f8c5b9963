//! Incremental hash adapters over the RustCrypto digest implementations.

use crate::provider::Digest;
use ferro_types::CryptoError;
use sha1::Digest as _;

/// Hash algorithm identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgId {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgId {
    /// Digest output size in bytes.
    pub fn output_size(self) -> usize {
        match self {
            HashAlgId::Sha1 => 20,
            HashAlgId::Sha256 => 32,
            HashAlgId::Sha384 => 48,
            HashAlgId::Sha512 => 64,
        }
    }

    /// Create a fresh incremental digest for this algorithm.
    pub fn new_digest(self) -> Box<dyn Digest> {
        match self {
            HashAlgId::Sha1 => Box::new(Sha1::new()),
            HashAlgId::Sha256 => Box::new(Sha256::new()),
            HashAlgId::Sha384 => Box::new(Sha384::new()),
            HashAlgId::Sha512 => Box::new(Sha512::new()),
        }
    }

    /// One-shot digest computation.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        let mut ctx = self.new_digest();
        ctx.update(data);
        let mut out = vec![0u8; self.output_size()];
        // finish on a fresh context cannot fail for a correctly sized buffer
        let _ = ctx.finish(&mut out);
        out
    }
}

macro_rules! impl_digest {
    ($name:ident, $core:ty, $out:expr, $block:expr) => {
        /// Incremental digest adapter.
        pub struct $name {
            inner: $core,
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    inner: <$core>::new(),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Digest for $name {
            fn output_size(&self) -> usize {
                $out
            }

            fn block_size(&self) -> usize {
                $block
            }

            fn update(&mut self, data: &[u8]) {
                self.inner.update(data);
            }

            fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
                if out.len() < $out {
                    return Err(CryptoError::InvalidArg);
                }
                let digest = self.inner.finalize_reset();
                out[..$out].copy_from_slice(&digest);
                Ok(())
            }

            fn reset(&mut self) {
                self.inner = <$core>::new();
            }
        }
    };
}

impl_digest!(Sha1, sha1::Sha1, 20, 64);
impl_digest!(Sha256, sha2::Sha256, 32, 64);
impl_digest!(Sha384, sha2::Sha384, 48, 128);
impl_digest!(Sha512, sha2::Sha512, 64, 128);
