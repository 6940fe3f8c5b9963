//! DSA signing and verification (FIPS 186-4) over big-integer arithmetic.
//!
//! Signatures are DER-encoded `SEQUENCE { r INTEGER, s INTEGER }` as carried
//! in TLS ServerKeyExchange and CertificateVerify messages.

use ferro_types::CryptoError;
use num_bigint::BigUint;

use crate::rand::random_bytes;

/// DSA domain parameters (p, q, g).
#[derive(Clone)]
pub struct DsaParams {
    p: BigUint,
    q: BigUint,
    g: BigUint,
}

impl DsaParams {
    pub fn new(p: &[u8], q: &[u8], g: &[u8]) -> Result<Self, CryptoError> {
        let p = BigUint::from_bytes_be(p);
        let q = BigUint::from_bytes_be(q);
        let g = BigUint::from_bytes_be(g);
        let one = BigUint::from(1u8);
        if p <= one || q <= one || g <= one || q >= p || g >= p {
            return Err(CryptoError::DsaInvalidParams);
        }
        Ok(Self { p, q, g })
    }

    /// Subgroup order length in bytes.
    pub fn q_len(&self) -> usize {
        (self.q.bits() as usize).div_ceil(8)
    }
}

/// Reduce a digest to an integer per FIPS 186-4 §4.6: the leftmost
/// min(N, outlen) bits of the digest.
fn digest_to_int(params: &DsaParams, digest: &[u8]) -> BigUint {
    let q_len = params.q_len();
    let take = digest.len().min(q_len);
    BigUint::from_bytes_be(&digest[..take])
}

/// A DSA public key (domain parameters + y).
pub struct DsaPublicKey {
    params: DsaParams,
    y: BigUint,
}

impl DsaPublicKey {
    pub fn new(params: DsaParams, y: &[u8]) -> Result<Self, CryptoError> {
        let y = BigUint::from_bytes_be(y);
        if y <= BigUint::from(1u8) || y >= params.p {
            return Err(CryptoError::InvalidKey);
        }
        Ok(Self { params, y })
    }

    /// Verify a DER-encoded (r, s) signature over a precomputed digest.
    pub fn verify(&self, digest: &[u8], signature_der: &[u8]) -> Result<bool, CryptoError> {
        let (r, s) = decode_der_signature(signature_der)?;
        let q = &self.params.q;
        let zero = BigUint::from(0u8);
        if r == zero || s == zero || &r >= q || &s >= q {
            return Ok(false);
        }

        // w = s^-1 mod q (q is prime, so Fermat inversion applies)
        let two = BigUint::from(2u8);
        let w = s.modpow(&(q - &two), q);
        let z = digest_to_int(&self.params, digest);
        let u1 = (&z * &w) % q;
        let u2 = (&r * &w) % q;
        let v = (self.params.g.modpow(&u1, &self.params.p)
            * self.y.modpow(&u2, &self.params.p)
            % &self.params.p)
            % q;
        Ok(v == r)
    }
}

/// A DSA private key (domain parameters + x).
pub struct DsaPrivateKey {
    params: DsaParams,
    x: BigUint,
}

impl Drop for DsaPrivateKey {
    fn drop(&mut self) {
        self.x = BigUint::from(0u8);
    }
}

impl DsaPrivateKey {
    pub fn new(params: DsaParams, x: &[u8]) -> Result<Self, CryptoError> {
        let x = BigUint::from_bytes_be(x);
        if x == BigUint::from(0u8) || x >= params.q {
            return Err(CryptoError::InvalidKey);
        }
        Ok(Self { params, x })
    }

    /// The public value y = g^x mod p, big-endian.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.params
            .g
            .modpow(&self.x, &self.params.p)
            .to_bytes_be()
    }

    /// Produce a DER-encoded (r, s) signature over a precomputed digest.
    pub fn sign(&self, digest: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let q = &self.params.q;
        let zero = BigUint::from(0u8);
        let two = BigUint::from(2u8);
        let z = digest_to_int(&self.params, digest);

        // Fresh k per attempt; retry on the (negligible) r == 0 / s == 0 cases
        for _ in 0..64 {
            let mut k_bytes = vec![0u8; self.params.q_len()];
            random_bytes(&mut k_bytes)?;
            let k = BigUint::from_bytes_be(&k_bytes) % q;
            if k == zero {
                continue;
            }
            let r = self.params.g.modpow(&k, &self.params.p) % q;
            if r == zero {
                continue;
            }
            let k_inv = k.modpow(&(q - &two), q);
            let s = (&k_inv * (&z + &self.x * &r)) % q;
            if s == zero {
                continue;
            }
            return Ok(encode_der_signature(&r, &s));
        }
        Err(CryptoError::RandGenFail)
    }
}

// ---------------------------------------------------------------------------
// DER SEQUENCE { INTEGER r, INTEGER s }
// ---------------------------------------------------------------------------

fn der_integer(value: &BigUint) -> Vec<u8> {
    let mut bytes = value.to_bytes_be();
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0x00);
    }
    let mut out = Vec::with_capacity(2 + bytes.len());
    out.push(0x02);
    out.push(bytes.len() as u8);
    out.extend_from_slice(&bytes);
    out
}

fn encode_der_signature(r: &BigUint, s: &BigUint) -> Vec<u8> {
    let r_der = der_integer(r);
    let s_der = der_integer(s);
    let len = r_der.len() + s_der.len();
    let mut out = Vec::with_capacity(2 + len);
    out.push(0x30);
    out.push(len as u8);
    out.extend_from_slice(&r_der);
    out.extend_from_slice(&s_der);
    out
}

fn read_der_integer(data: &[u8]) -> Result<(BigUint, usize), CryptoError> {
    if data.len() < 2 || data[0] != 0x02 {
        return Err(CryptoError::InvalidArg);
    }
    let len = data[1] as usize;
    if len == 0 || len > 127 || data.len() < 2 + len {
        return Err(CryptoError::InvalidArg);
    }
    Ok((BigUint::from_bytes_be(&data[2..2 + len]), 2 + len))
}

fn decode_der_signature(der: &[u8]) -> Result<(BigUint, BigUint), CryptoError> {
    if der.len() < 2 || der[0] != 0x30 {
        return Err(CryptoError::InvalidArg);
    }
    let len = der[1] as usize;
    if len > 127 || der.len() != 2 + len {
        return Err(CryptoError::InvalidArg);
    }
    let body = &der[2..];
    let (r, used) = read_der_integer(body)?;
    let (s, used2) = read_der_integer(&body[used..])?;
    if used + used2 != body.len() {
        return Err(CryptoError::InvalidArg);
    }
    Ok((r, s))
}
