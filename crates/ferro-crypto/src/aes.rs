//! AES block cipher adapter: single-block ECB and raw CBC with explicit IV.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes256};
use ferro_types::CryptoError;

/// AES block size in bytes.
pub const AES_BLOCK_SIZE: usize = 16;

enum Inner {
    Aes128(Box<Aes128>),
    Aes256(Box<Aes256>),
}

/// An AES key schedule usable for both ECB single-block operations and the
/// CBC helpers below. Key length (16 or 32 bytes) selects AES-128 or AES-256.
pub struct AesKey {
    inner: Inner,
    key_len: usize,
}

impl AesKey {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let inner = match key.len() {
            16 => Inner::Aes128(Box::new(Aes128::new(GenericArray::from_slice(key)))),
            32 => Inner::Aes256(Box::new(Aes256::new(GenericArray::from_slice(key)))),
            got => {
                return Err(CryptoError::InvalidKeyLength {
                    expected: 16,
                    got,
                })
            }
        };
        Ok(Self {
            inner,
            key_len: key.len(),
        })
    }

    pub fn key_len(&self) -> usize {
        self.key_len
    }

    /// Encrypt a single 16-byte block in place.
    pub fn encrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError> {
        if block.len() != AES_BLOCK_SIZE {
            return Err(CryptoError::InvalidArg);
        }
        let block = GenericArray::from_mut_slice(block);
        match &self.inner {
            Inner::Aes128(c) => c.encrypt_block(block),
            Inner::Aes256(c) => c.encrypt_block(block),
        }
        Ok(())
    }

    /// Decrypt a single 16-byte block in place.
    pub fn decrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError> {
        if block.len() != AES_BLOCK_SIZE {
            return Err(CryptoError::InvalidArg);
        }
        let block = GenericArray::from_mut_slice(block);
        match &self.inner {
            Inner::Aes128(c) => c.decrypt_block(block),
            Inner::Aes256(c) => c.decrypt_block(block),
        }
        Ok(())
    }

    /// AES-CBC encrypt in place. `data` must be block-aligned; no padding is
    /// added or removed.
    pub fn cbc_encrypt(&self, iv: &[u8], data: &mut [u8]) -> Result<(), CryptoError> {
        if iv.len() != AES_BLOCK_SIZE {
            return Err(CryptoError::InvalidIvLength);
        }
        if data.len() % AES_BLOCK_SIZE != 0 {
            return Err(CryptoError::InvalidArg);
        }
        let mut prev = [0u8; AES_BLOCK_SIZE];
        prev.copy_from_slice(iv);
        for chunk in data.chunks_mut(AES_BLOCK_SIZE) {
            for i in 0..AES_BLOCK_SIZE {
                chunk[i] ^= prev[i];
            }
            self.encrypt_block(chunk)?;
            prev.copy_from_slice(chunk);
        }
        Ok(())
    }

    /// AES-CBC decrypt in place. `data` must be block-aligned; no padding is
    /// removed.
    pub fn cbc_decrypt(&self, iv: &[u8], data: &mut [u8]) -> Result<(), CryptoError> {
        if iv.len() != AES_BLOCK_SIZE {
            return Err(CryptoError::InvalidIvLength);
        }
        if data.len() % AES_BLOCK_SIZE != 0 {
            return Err(CryptoError::InvalidArg);
        }
        let mut prev = [0u8; AES_BLOCK_SIZE];
        prev.copy_from_slice(iv);
        for chunk in data.chunks_mut(AES_BLOCK_SIZE) {
            let ct_copy: [u8; AES_BLOCK_SIZE] = chunk.try_into().expect("block-aligned chunk");
            self.decrypt_block(chunk)?;
            for i in 0..AES_BLOCK_SIZE {
                chunk[i] ^= prev[i];
            }
            prev = ct_copy;
        }
        Ok(())
    }
}
