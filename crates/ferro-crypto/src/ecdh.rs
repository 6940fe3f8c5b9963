//! ECDH over the NIST curves P-256, P-384, and P-521.

use ferro_types::CryptoError;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use zeroize::Zeroize;

use crate::rand::random_bytes;

/// Supported elliptic curves, by TLS named-group identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurveId {
    P256,
    P384,
    P521,
}

impl EcCurveId {
    /// Map a TLS NamedCurve value (RFC 4492 §5.1.1) to a curve.
    pub fn from_named_curve(id: u16) -> Option<Self> {
        match id {
            0x0017 => Some(EcCurveId::P256),
            0x0018 => Some(EcCurveId::P384),
            0x0019 => Some(EcCurveId::P521),
            _ => None,
        }
    }

    /// The TLS NamedCurve value.
    pub fn named_curve(self) -> u16 {
        match self {
            EcCurveId::P256 => 0x0017,
            EcCurveId::P384 => 0x0018,
            EcCurveId::P521 => 0x0019,
        }
    }

    /// Field element length in bytes (32, 48, 66).
    pub fn field_len(self) -> usize {
        match self {
            EcCurveId::P256 => 32,
            EcCurveId::P384 => 48,
            EcCurveId::P521 => 66,
        }
    }

    /// Uncompressed SEC1 point length: 1 + 2 * field_len.
    pub fn point_len(self) -> usize {
        1 + 2 * self.field_len()
    }
}

enum Inner {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
    P521(p521::SecretKey),
}

/// An ephemeral ECDH key pair.
pub struct EcdhKeyPair {
    inner: Inner,
    public: Vec<u8>,
}

impl EcdhKeyPair {
    /// Generate a fresh ephemeral key pair on the given curve.
    pub fn generate(curve: EcCurveId) -> Result<Self, CryptoError> {
        let mut buf = vec![0u8; curve.field_len()];
        // Rejection-sample until the scalar is in [1, n-1]
        for _ in 0..64 {
            random_bytes(&mut buf)?;
            if curve == EcCurveId::P521 {
                buf[0] &= 0x01;
            }
            match Self::from_scalar_bytes(curve, &buf) {
                Ok(kp) => {
                    buf.zeroize();
                    return Ok(kp);
                }
                Err(_) => continue,
            }
        }
        buf.zeroize();
        Err(CryptoError::RandGenFail)
    }

    /// Construct from a fixed big-endian scalar. Used for deterministic
    /// tests; the scalar must be in [1, n-1].
    pub fn from_scalar_bytes(curve: EcCurveId, scalar: &[u8]) -> Result<Self, CryptoError> {
        let (inner, public) = match curve {
            EcCurveId::P256 => {
                let sk = p256::SecretKey::from_slice(scalar)
                    .map_err(|_| CryptoError::EccInvalidPrivateKey)?;
                let point = sk.public_key().to_encoded_point(false).as_bytes().to_vec();
                (Inner::P256(sk), point)
            }
            EcCurveId::P384 => {
                let sk = p384::SecretKey::from_slice(scalar)
                    .map_err(|_| CryptoError::EccInvalidPrivateKey)?;
                let point = sk.public_key().to_encoded_point(false).as_bytes().to_vec();
                (Inner::P384(sk), point)
            }
            EcCurveId::P521 => {
                let sk = p521::SecretKey::from_slice(scalar)
                    .map_err(|_| CryptoError::EccInvalidPrivateKey)?;
                let point = sk.public_key().to_encoded_point(false).as_bytes().to_vec();
                (Inner::P521(sk), point)
            }
        };
        Ok(Self { inner, public })
    }

    /// The curve this key pair lives on.
    pub fn curve(&self) -> EcCurveId {
        match self.inner {
            Inner::P256(_) => EcCurveId::P256,
            Inner::P384(_) => EcCurveId::P384,
            Inner::P521(_) => EcCurveId::P521,
        }
    }

    /// The public point, uncompressed SEC1 (0x04 || X || Y).
    pub fn public_key_bytes(&self) -> &[u8] {
        &self.public
    }

    /// Compute the shared secret with the peer's uncompressed public point.
    ///
    /// Returns the X coordinate of the shared point, left-padded to the
    /// curve's field length (RFC 4492 §5.10).
    pub fn compute_shared_secret(&self, peer_point: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match &self.inner {
            Inner::P256(sk) => {
                let peer = p256::PublicKey::from_sec1_bytes(peer_point)
                    .map_err(|_| CryptoError::EccInvalidPublicKey)?;
                let shared = p256::ecdh::diffie_hellman(sk.to_nonzero_scalar(), peer.as_affine());
                Ok(shared.raw_secret_bytes().to_vec())
            }
            Inner::P384(sk) => {
                let peer = p384::PublicKey::from_sec1_bytes(peer_point)
                    .map_err(|_| CryptoError::EccInvalidPublicKey)?;
                let shared = p384::ecdh::diffie_hellman(sk.to_nonzero_scalar(), peer.as_affine());
                Ok(shared.raw_secret_bytes().to_vec())
            }
            Inner::P521(sk) => {
                let peer = p521::PublicKey::from_sec1_bytes(peer_point)
                    .map_err(|_| CryptoError::EccInvalidPublicKey)?;
                let shared = p521::ecdh::diffie_hellman(sk.to_nonzero_scalar(), peer.as_affine());
                Ok(shared.raw_secret_bytes().to_vec())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_curve_mapping() {
        assert_eq!(EcCurveId::from_named_curve(0x0017), Some(EcCurveId::P256));
        assert_eq!(EcCurveId::from_named_curve(0x0018), Some(EcCurveId::P384));
        assert_eq!(EcCurveId::from_named_curve(0x0019), Some(EcCurveId::P521));
        assert_eq!(EcCurveId::from_named_curve(0x001D), None);
        assert_eq!(EcCurveId::P256.named_curve(), 0x0017);
    }

    #[test]
    fn test_point_lengths() {
        assert_eq!(EcCurveId::P256.point_len(), 65);
        assert_eq!(EcCurveId::P384.point_len(), 97);
        assert_eq!(EcCurveId::P521.point_len(), 133);
    }

    #[test]
    fn test_p256_agreement() {
        let a = EcdhKeyPair::generate(EcCurveId::P256).unwrap();
        let b = EcdhKeyPair::generate(EcCurveId::P256).unwrap();
        assert_eq!(a.public_key_bytes().len(), 65);
        assert_eq!(a.public_key_bytes()[0], 0x04);

        let z_ab = a.compute_shared_secret(b.public_key_bytes()).unwrap();
        let z_ba = b.compute_shared_secret(a.public_key_bytes()).unwrap();
        assert_eq!(z_ab, z_ba);
        assert_eq!(z_ab.len(), 32);
    }

    #[test]
    fn test_p384_agreement() {
        let a = EcdhKeyPair::generate(EcCurveId::P384).unwrap();
        let b = EcdhKeyPair::generate(EcCurveId::P384).unwrap();
        let z = a.compute_shared_secret(b.public_key_bytes()).unwrap();
        assert_eq!(z.len(), 48);
        assert_eq!(a.public_key_bytes().len(), 97);
    }

    #[test]
    fn test_p521_agreement() {
        let a = EcdhKeyPair::generate(EcCurveId::P521).unwrap();
        let b = EcdhKeyPair::generate(EcCurveId::P521).unwrap();
        let z = a.compute_shared_secret(b.public_key_bytes()).unwrap();
        assert_eq!(z.len(), 66);
        assert_eq!(a.public_key_bytes().len(), 133);
    }

    #[test]
    fn test_deterministic_scalar() {
        let mut scalar = [0u8; 32];
        scalar[31] = 0x01;
        let kp1 = EcdhKeyPair::from_scalar_bytes(EcCurveId::P256, &scalar).unwrap();
        let kp2 = EcdhKeyPair::from_scalar_bytes(EcCurveId::P256, &scalar).unwrap();
        assert_eq!(kp1.public_key_bytes(), kp2.public_key_bytes());
        // Scalar 1 yields the generator point
        assert_eq!(kp1.public_key_bytes()[0], 0x04);
    }

    #[test]
    fn test_rejects_invalid_peer_point() {
        let a = EcdhKeyPair::generate(EcCurveId::P256).unwrap();
        let mut bogus = a.public_key_bytes().to_vec();
        bogus[10] ^= 0xFF; // not on the curve
        assert!(a.compute_shared_secret(&bogus).is_err());
        assert!(a.compute_shared_secret(&[0x04, 0x01]).is_err());
    }

    #[test]
    fn test_zero_scalar_rejected() {
        assert!(EcdhKeyPair::from_scalar_bytes(EcCurveId::P256, &[0u8; 32]).is_err());
    }
}
