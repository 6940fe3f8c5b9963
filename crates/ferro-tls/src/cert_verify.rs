//! Server certificate verification orchestration.
//!
//! Builds the chain, checks the hostname, consults the user callback, and
//! maps the resulting status flags onto the certificate alert family.

use ferro_pki::{BuiltChain, ChainBuilder, ChainStatus};
use ferro_types::TlsError;

use crate::config::TlsConfig;

/// Verify the server's certificate chain and hostname per the configured
/// policy. Returns the built chain so the handshake can use the leaf key;
/// with verification disabled an unusable chain yields `None` instead of an
/// error (key exchanges that need the leaf key fail later).
///
/// Status-to-alert mapping: any NOT_TIME_VALID is certificate_expired, any
/// REVOKED is certificate_revoked, and any remaining flag other than
/// REVOCATION_STATUS_UNKNOWN is certificate_unknown. A configured callback
/// sees the full status set and its verdict is final.
pub fn verify_server_certificate(
    config: &TlsConfig,
    chain_der: &[Vec<u8>],
) -> Result<Option<BuiltChain>, TlsError> {
    let mut builder = ChainBuilder::new();
    for root in &config.trusted_certs {
        // Unparseable anchors are configuration mistakes, not peer faults
        builder
            .add_trust_anchor(root)
            .map_err(|e| TlsError::CertificateUnknown(format!("bad trust anchor: {e}")))?;
    }

    let chain = if config.verify_peer {
        builder
            .build(chain_der)
            .map_err(|e| TlsError::CertificateUnknown(e.to_string()))?
    } else {
        match builder.build(chain_der) {
            Ok(chain) => return Ok(Some(chain)),
            Err(_) => return Ok(None),
        }
    };

    let mut combined = chain.combined_status();

    // Hostname mismatch folds into the generic certificate failure bucket
    if let Some(ref hostname) = config.server_name {
        if ferro_pki::verify_hostname(&chain.certs[0], hostname).is_err() {
            combined.insert(ChainStatus::OTHER);
        }
    }

    if let Some(ref callback) = config.cert_validation_callback {
        let ders: Vec<Vec<u8>> = chain.certs.iter().map(|c| c.der.clone()).collect();
        if callback(&chain_der[0], &ders, &chain.status) {
            return Ok(Some(chain));
        }
        return Err(TlsError::CertificateUnknown(
            "rejected by validation callback".into(),
        ));
    }

    if combined.contains(ChainStatus::NOT_TIME_VALID) {
        return Err(TlsError::CertificateExpired);
    }
    if combined.contains(ChainStatus::REVOKED) {
        return Err(TlsError::CertificateRevoked);
    }
    let remaining = combined.without(ChainStatus::REVOCATION_STATUS_UNKNOWN);
    if !remaining.is_clear() {
        return Err(TlsError::CertificateUnknown(
            "certificate chain validation failed".into(),
        ));
    }

    Ok(Some(chain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_leaf_is_certificate_unknown() {
        let config = TlsConfig::builder().build();
        let err = verify_server_certificate(&config, &[vec![0x30, 0x00]]).unwrap_err();
        assert!(matches!(err, TlsError::CertificateUnknown(_)));
    }

    #[test]
    fn test_empty_chain_rejected() {
        let config = TlsConfig::builder().build();
        assert!(verify_server_certificate(&config, &[]).is_err());
    }

    #[test]
    fn test_unusable_chain_tolerated_without_verification() {
        let config = TlsConfig::builder().verify_peer(false).build();
        let chain = verify_server_certificate(&config, &[vec![0x30, 0x00]]).unwrap();
        assert!(chain.is_none());
    }
}
