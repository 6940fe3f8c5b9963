//! Finite-field Diffie-Hellman over big-integer modular exponentiation.

use ferro_types::CryptoError;
use num_bigint::BigUint;
use zeroize::Zeroize;

use crate::rand::random_bytes;

/// DH group parameters (p, g) as received in ServerKeyExchange.
pub struct DhParams {
    p: BigUint,
    g: BigUint,
    prime_len: usize,
}

impl DhParams {
    pub fn new(p: &[u8], g: &[u8]) -> Result<Self, CryptoError> {
        let p_int = BigUint::from_bytes_be(p);
        let g_int = BigUint::from_bytes_be(g);
        let one = BigUint::from(1u8);
        if p_int <= one || g_int <= one || g_int >= p_int {
            return Err(CryptoError::DhInvalidParams);
        }
        let prime_len = (p_int.bits() as usize).div_ceil(8);
        Ok(Self {
            p: p_int,
            g: g_int,
            prime_len,
        })
    }

    /// The prime length in bytes.
    pub fn prime_len(&self) -> usize {
        self.prime_len
    }
}

/// An ephemeral DH key pair: private exponent and public value g^x mod p.
pub struct DhKeyPair {
    x: BigUint,
    public: Vec<u8>,
}

impl Drop for DhKeyPair {
    fn drop(&mut self) {
        // BigUint offers no in-place clearing; overwrite with zero
        self.x = BigUint::from(0u8);
        self.public.zeroize();
    }
}

impl DhKeyPair {
    /// Generate an ephemeral key pair with a private exponent the same length
    /// as the prime.
    pub fn generate(params: &DhParams) -> Result<Self, CryptoError> {
        let mut buf = vec![0u8; params.prime_len];
        random_bytes(&mut buf)?;
        let result = Self::from_private_exponent(params, &buf);
        buf.zeroize();
        result
    }

    /// Construct from a fixed private exponent (big-endian). Used for
    /// deterministic tests.
    pub fn from_private_exponent(params: &DhParams, exponent: &[u8]) -> Result<Self, CryptoError> {
        let mut x = BigUint::from_bytes_be(exponent);
        let one = BigUint::from(1u8);
        if x <= one {
            x = BigUint::from(2u8);
        }
        let y = params.g.modpow(&x, &params.p);
        Ok(Self {
            x,
            public: y.to_bytes_be(),
        })
    }

    /// The public value Y_c = g^x mod p, big-endian with no leading zeros.
    pub fn public_key_bytes(&self) -> &[u8] {
        &self.public
    }

    /// Compute the shared secret Z = Ys^x mod p, big-endian with leading
    /// zeros stripped (RFC 5246 §8.1.2).
    pub fn compute_shared_secret(
        &self,
        params: &DhParams,
        peer_public: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let ys = BigUint::from_bytes_be(peer_public);
        let one = BigUint::from(1u8);
        if ys <= one || ys >= params.p {
            return Err(CryptoError::DhInvalidPeerKey);
        }
        let z = ys.modpow(&self.x, &params.p);
        Ok(z.to_bytes_be())
    }
}

/// Raw modular exponentiation on big-endian byte strings.
pub fn modpow(base: &[u8], exponent: &[u8], modulus: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let m = BigUint::from_bytes_be(modulus);
    if m == BigUint::from(0u8) {
        return Err(CryptoError::InvalidArg);
    }
    let b = BigUint::from_bytes_be(base);
    let e = BigUint::from_bytes_be(exponent);
    Ok(b.modpow(&e, &m).to_bytes_be())
}
