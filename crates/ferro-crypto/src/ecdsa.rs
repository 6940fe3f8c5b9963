//! ECDSA signature verification over the NIST curves.
//!
//! TLS carries ECDSA signatures DER-encoded (SEQUENCE of r, s); the digest
//! is computed by the caller, so verification goes through the prehash path.

use ferro_types::CryptoError;
use p256::ecdsa::signature::hazmat::PrehashVerifier;

use crate::ecdh::EcCurveId;

/// Verify a DER-encoded ECDSA signature over a precomputed digest against an
/// uncompressed SEC1 public point.
pub fn ecdsa_verify(
    curve: EcCurveId,
    public_point: &[u8],
    digest: &[u8],
    signature_der: &[u8],
) -> Result<bool, CryptoError> {
    match curve {
        EcCurveId::P256 => {
            let vk = p256::ecdsa::VerifyingKey::from_sec1_bytes(public_point)
                .map_err(|_| CryptoError::EccInvalidPublicKey)?;
            let sig = p256::ecdsa::Signature::from_der(signature_der)
                .map_err(|_| CryptoError::EcdsaVerifyFail)?;
            Ok(vk.verify_prehash(digest, &sig).is_ok())
        }
        EcCurveId::P384 => {
            let vk = p384::ecdsa::VerifyingKey::from_sec1_bytes(public_point)
                .map_err(|_| CryptoError::EccInvalidPublicKey)?;
            let sig = p384::ecdsa::Signature::from_der(signature_der)
                .map_err(|_| CryptoError::EcdsaVerifyFail)?;
            Ok(vk.verify_prehash(digest, &sig).is_ok())
        }
        EcCurveId::P521 => {
            let vk = p521::ecdsa::VerifyingKey::from_sec1_bytes(public_point)
                .map_err(|_| CryptoError::EccInvalidPublicKey)?;
            let sig = p521::ecdsa::Signature::from_der(signature_der)
                .map_err(|_| CryptoError::EcdsaVerifyFail)?;
            Ok(vk.verify_prehash(digest, &sig).is_ok())
        }
    }
}
