//! Certificate chain construction with per-certificate status flags.

use ferro_types::PkiError;

use crate::x509::Certificate;

/// Maximum chain depth, including leaf and root.
const MAX_CHAIN_DEPTH: usize = 10;

/// Per-certificate status flags produced by the chain builder.
///
/// An empty status means the certificate passed every check the builder
/// performs. Revocation is never fetched, so every certificate carries
/// `REVOCATION_STATUS_UNKNOWN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainStatus(u32);

impl ChainStatus {
    pub const NONE: Self = Self(0);
    pub const NOT_TIME_VALID: Self = Self(1);
    pub const REVOKED: Self = Self(1 << 1);
    pub const REVOCATION_STATUS_UNKNOWN: Self = Self(1 << 2);
    pub const NOT_SIGNATURE_VALID: Self = Self(1 << 3);
    pub const UNTRUSTED_ROOT: Self = Self(1 << 4);
    pub const PARTIAL_CHAIN: Self = Self(1 << 5);
    pub const OTHER: Self = Self(1 << 6);

    pub fn insert(&mut self, flag: Self) {
        self.0 |= flag.0;
    }

    pub fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0 && flag.0 != 0
    }

    pub fn is_clear(self) -> bool {
        self.0 == 0
    }

    /// Status with the given flags removed.
    pub fn without(self, flag: Self) -> Self {
        Self(self.0 & !flag.0)
    }
}

/// A built chain: certificates ordered leaf first, with matching statuses.
#[derive(Debug)]
pub struct BuiltChain {
    pub certs: Vec<Certificate>,
    pub status: Vec<ChainStatus>,
}

impl BuiltChain {
    /// The union of every certificate's status flags.
    pub fn combined_status(&self) -> ChainStatus {
        let mut all = ChainStatus::NONE;
        for s in &self.status {
            all.insert(*s);
        }
        all
    }
}

/// Builds and checks certificate chains against a set of trust anchors.
pub struct ChainBuilder {
    roots: Vec<Certificate>,
    now: Option<i64>,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            now: None,
        }
    }

    /// Add a DER-encoded trust anchor. Unparseable anchors are rejected.
    pub fn add_trust_anchor(&mut self, der: &[u8]) -> Result<(), PkiError> {
        self.roots.push(Certificate::from_der(der)?);
        Ok(())
    }

    /// Override the validation time (Unix seconds). Tests only; defaults to
    /// the system clock.
    pub fn set_validation_time(&mut self, now: i64) {
        self.now = Some(now);
    }

    fn current_time(&self) -> i64 {
        self.now.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0)
        })
    }

    /// Build a chain from the presented certificates (leaf first).
    ///
    /// The builder orders the presented certificates by issuer, walks up to a
    /// trust anchor where possible, verifies each link signature, and checks
    /// validity windows. Problems are reported as status flags rather than
    /// errors; only a structurally unusable input (no parseable leaf) fails.
    pub fn build(&self, presented_der: &[Vec<u8>]) -> Result<BuiltChain, PkiError> {
        if presented_der.is_empty() {
            return Err(PkiError::InvalidCert("empty certificate list".into()));
        }
        let leaf = Certificate::from_der(&presented_der[0])?;

        let mut pool: Vec<Certificate> = Vec::new();
        for der in &presented_der[1..] {
            // Skip unparseable intermediates; they simply never match
            if let Ok(cert) = Certificate::from_der(der) {
                pool.push(cert);
            }
        }

        let now = self.current_time();
        let mut certs = vec![leaf];
        let mut used = vec![false; pool.len()];

        // Walk issuer links: prefer presented intermediates, else anchors
        loop {
            let current = certs.last().expect("chain is never empty");
            if certs.len() >= MAX_CHAIN_DEPTH || current.is_self_issued() {
                break;
            }

            if let Some(root) = self
                .roots
                .iter()
                .find(|r| r.subject_raw == current.issuer_raw)
            {
                certs.push(root.clone());
                break;
            }

            let next = pool.iter().enumerate().find(|(i, c)| {
                !used[*i] && c.subject_raw == certs.last().unwrap().issuer_raw
            });
            match next {
                Some((i, cert)) => {
                    used[i] = true;
                    certs.push(cert.clone());
                }
                None => break,
            }
        }

        // Status pass
        let mut status = vec![ChainStatus::NONE; certs.len()];
        for (i, cert) in certs.iter().enumerate() {
            status[i].insert(ChainStatus::REVOCATION_STATUS_UNKNOWN);
            if !cert.is_time_valid(now) {
                status[i].insert(ChainStatus::NOT_TIME_VALID);
            }
            if let Some(issuer) = certs.get(i + 1) {
                match cert.verify_signed_by(&issuer.public_key) {
                    Ok(true) => {}
                    Ok(false) => status[i].insert(ChainStatus::NOT_SIGNATURE_VALID),
                    Err(_) => status[i].insert(ChainStatus::OTHER),
                }
            }
        }

        // Anchor pass: the terminal certificate must be a configured anchor
        // (or be directly signed by one)
        let terminal = certs.last().expect("chain is never empty");
        let terminal_trusted = self.roots.iter().any(|r| r.der == terminal.der);
        let last = status.len() - 1;
        if terminal_trusted {
            if terminal.is_self_issued() {
                match terminal.verify_signed_by(&terminal.public_key) {
                    Ok(true) => {}
                    _ => status[last].insert(ChainStatus::NOT_SIGNATURE_VALID),
                }
            }
        } else if terminal.is_self_issued() {
            status[last].insert(ChainStatus::UNTRUSTED_ROOT);
        } else {
            status[last].insert(ChainStatus::PARTIAL_CHAIN);
        }

        Ok(BuiltChain { certs, status })
    }
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_flags() {
        let mut s = ChainStatus::NONE;
        assert!(s.is_clear());
        s.insert(ChainStatus::NOT_TIME_VALID);
        s.insert(ChainStatus::REVOCATION_STATUS_UNKNOWN);
        assert!(s.contains(ChainStatus::NOT_TIME_VALID));
        assert!(s.contains(ChainStatus::REVOCATION_STATUS_UNKNOWN));
        assert!(!s.contains(ChainStatus::REVOKED));

        let relaxed = s.without(ChainStatus::REVOCATION_STATUS_UNKNOWN);
        assert!(relaxed.contains(ChainStatus::NOT_TIME_VALID));
        assert!(!relaxed.contains(ChainStatus::REVOCATION_STATUS_UNKNOWN));
    }

    #[test]
    fn test_combined_status() {
        let chain = BuiltChain {
            certs: Vec::new(),
            status: vec![
                ChainStatus::REVOCATION_STATUS_UNKNOWN,
                {
                    let mut s = ChainStatus::NONE;
                    s.insert(ChainStatus::NOT_TIME_VALID);
                    s
                },
            ],
        };
        let all = chain.combined_status();
        assert!(all.contains(ChainStatus::REVOCATION_STATUS_UNKNOWN));
        assert!(all.contains(ChainStatus::NOT_TIME_VALID));
    }

    #[test]
    fn test_empty_list_rejected() {
        let builder = ChainBuilder::new();
        assert!(builder.build(&[]).is_err());
    }
}
