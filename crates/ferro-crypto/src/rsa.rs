//! RSA PKCS#1 v1.5 over big-integer modular exponentiation (RFC 8017 §8.2, §9.2).

use ferro_types::CryptoError;
use num_bigint::BigUint;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::hash::HashAlgId;
use crate::rand::random_nonzero_bytes;

/// DER DigestInfo prefixes for EMSA-PKCS1-v1_5 (RFC 8017 §9.2 note 1).
fn digest_info_prefix(alg: HashAlgId) -> &'static [u8] {
    match alg {
        HashAlgId::Sha1 => &[
            0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04,
            0x14,
        ],
        HashAlgId::Sha256 => &[
            0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x01, 0x05, 0x00, 0x04, 0x20,
        ],
        HashAlgId::Sha384 => &[
            0x30, 0x41, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x02, 0x05, 0x00, 0x04, 0x30,
        ],
        HashAlgId::Sha512 => &[
            0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x03, 0x05, 0x00, 0x04, 0x40,
        ],
    }
}

fn left_pad(bytes: Vec<u8>, len: usize) -> Vec<u8> {
    if bytes.len() >= len {
        return bytes;
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(&bytes);
    out
}

/// An RSA public key (n, e).
pub struct RsaPublicKey {
    n: BigUint,
    e: BigUint,
    k: usize,
}

impl RsaPublicKey {
    pub fn new(n: &[u8], e: &[u8]) -> Result<Self, CryptoError> {
        let n_int = BigUint::from_bytes_be(n);
        let e_int = BigUint::from_bytes_be(e);
        if n_int.bits() < 512 || e_int < BigUint::from(3u8) {
            return Err(CryptoError::InvalidKey);
        }
        let k = (n_int.bits() as usize).div_ceil(8);
        Ok(Self {
            n: n_int,
            e: e_int,
            k,
        })
    }

    /// Modulus length in bytes.
    pub fn modulus_len(&self) -> usize {
        self.k
    }

    /// RSAES-PKCS1-v1_5 encryption: EM = 0x00 || 0x02 || PS || 0x00 || M.
    pub fn encrypt_pkcs1(&self, msg: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if msg.len() + 11 > self.k {
            return Err(CryptoError::RsaInputOverflow);
        }
        let ps_len = self.k - msg.len() - 3;
        let mut em = vec![0u8; self.k];
        em[1] = 0x02;
        random_nonzero_bytes(&mut em[2..2 + ps_len])?;
        em[2 + ps_len] = 0x00;
        em[3 + ps_len..].copy_from_slice(msg);

        let m = BigUint::from_bytes_be(&em);
        em.zeroize();
        let c = m.modpow(&self.e, &self.n);
        Ok(left_pad(c.to_bytes_be(), self.k))
    }

    /// RSASSA-PKCS1-v1_5 verification of a signature over a precomputed
    /// digest.
    pub fn verify_pkcs1(
        &self,
        alg: HashAlgId,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        if signature.len() != self.k || digest.len() != alg.output_size() {
            return Ok(false);
        }
        let s = BigUint::from_bytes_be(signature);
        if s >= self.n {
            return Ok(false);
        }
        let m = s.modpow(&self.e, &self.n);
        let em = left_pad(m.to_bytes_be(), self.k);

        let expected = emsa_pkcs1_encode(alg, digest, self.k)?;
        Ok(em.ct_eq(expected.as_slice()).unwrap_u8() == 1)
    }
}

/// An RSA private key (n, d). Only the private exponent path is needed:
/// signing the CertificateVerify transcript and (in tests) unwrapping the
/// premaster secret.
pub struct RsaPrivateKey {
    n: BigUint,
    d: BigUint,
    k: usize,
}

impl Drop for RsaPrivateKey {
    fn drop(&mut self) {
        self.d = BigUint::from(0u8);
    }
}

impl RsaPrivateKey {
    pub fn new(n: &[u8], d: &[u8]) -> Result<Self, CryptoError> {
        let n_int = BigUint::from_bytes_be(n);
        let d_int = BigUint::from_bytes_be(d);
        if n_int.bits() < 512 || d_int == BigUint::from(0u8) {
            return Err(CryptoError::InvalidKey);
        }
        let k = (n_int.bits() as usize).div_ceil(8);
        Ok(Self {
            n: n_int,
            d: d_int,
            k,
        })
    }

    /// Modulus length in bytes.
    pub fn modulus_len(&self) -> usize {
        self.k
    }

    /// RSASSA-PKCS1-v1_5 signature over a precomputed digest.
    pub fn sign_pkcs1(&self, alg: HashAlgId, digest: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let em = emsa_pkcs1_encode(alg, digest, self.k)?;
        let m = BigUint::from_bytes_be(&em);
        let s = m.modpow(&self.d, &self.n);
        Ok(left_pad(s.to_bytes_be(), self.k))
    }

    /// RSAES-PKCS1-v1_5 decryption. Not constant-time; used by tests and
    /// never on the client path.
    pub fn decrypt_pkcs1(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.len() != self.k {
            return Err(CryptoError::RsaInvalidPadding);
        }
        let c = BigUint::from_bytes_be(ciphertext);
        if c >= self.n {
            return Err(CryptoError::RsaInvalidPadding);
        }
        let m = c.modpow(&self.d, &self.n);
        let em = left_pad(m.to_bytes_be(), self.k);
        if em[0] != 0x00 || em[1] != 0x02 {
            return Err(CryptoError::RsaInvalidPadding);
        }
        let sep = em[2..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(CryptoError::RsaInvalidPadding)?;
        if sep < 8 {
            return Err(CryptoError::RsaInvalidPadding);
        }
        Ok(em[3 + sep..].to_vec())
    }
}

/// EMSA-PKCS1-v1_5: EM = 0x00 || 0x01 || 0xFF.. || 0x00 || DigestInfo || digest.
fn emsa_pkcs1_encode(alg: HashAlgId, digest: &[u8], k: usize) -> Result<Vec<u8>, CryptoError> {
    let prefix = digest_info_prefix(alg);
    let t_len = prefix.len() + digest.len();
    if k < t_len + 11 {
        return Err(CryptoError::RsaInputOverflow);
    }
    let mut em = vec![0xFFu8; k];
    em[0] = 0x00;
    em[1] = 0x01;
    em[k - t_len - 1] = 0x00;
    em[k - t_len..k - digest.len()].copy_from_slice(prefix);
    em[k - digest.len()..].copy_from_slice(digest);
    Ok(em)
}
