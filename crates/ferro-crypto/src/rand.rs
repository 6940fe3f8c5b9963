//! CSPRNG adapter.

use ferro_types::CryptoError;

/// Fill `buf` with cryptographically secure random bytes.
pub fn random_bytes(buf: &mut [u8]) -> Result<(), CryptoError> {
    getrandom::getrandom(buf).map_err(|_| CryptoError::RandGenFail)
}

/// Fill `buf` with random bytes, none of which is zero. Used for PKCS#1 v1.5
/// encryption padding.
pub fn random_nonzero_bytes(buf: &mut [u8]) -> Result<(), CryptoError> {
    random_bytes(buf)?;
    for b in buf.iter_mut() {
        while *b == 0 {
            let mut one = [0u8; 1];
            random_bytes(&mut one)?;
            *b = one[0];
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes_fills() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        random_bytes(&mut a).unwrap();
        random_bytes(&mut b).unwrap();
        // Two 256-bit draws colliding means the RNG is broken
        assert_ne!(a, b);
    }

    #[test]
    fn test_nonzero_padding() {
        let mut buf = [0u8; 205];
        random_nonzero_bytes(&mut buf).unwrap();
        assert!(buf.iter().all(|&b| b != 0));
    }
}
