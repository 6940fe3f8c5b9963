//! Hostname verification against a leaf certificate (RFC 6125).

use std::net::IpAddr;
use std::str::FromStr;

use ferro_types::PkiError;

use crate::x509::Certificate;

/// Verify that `hostname` matches the certificate's subject alternative
/// names. IP literals are matched against iPAddress entries; DNS names
/// against dNSName entries with single left-most-label wildcards. When the
/// certificate carries no SAN entries, the subject common name is used.
pub fn verify_hostname(cert: &Certificate, hostname: &str) -> Result<(), PkiError> {
    if let Ok(ip) = IpAddr::from_str(hostname) {
        let octets: Vec<u8> = match ip {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        };
        if cert.san_ip.iter().any(|entry| entry == &octets) {
            return Ok(());
        }
        return Err(PkiError::HostnameMismatch(format!(
            "no iPAddress entry for {hostname}"
        )));
    }

    let names: Vec<&str> = if cert.san_dns.is_empty() {
        cert.common_name.as_deref().into_iter().collect()
    } else {
        cert.san_dns.iter().map(|s| s.as_str()).collect()
    };

    if names.iter().any(|pattern| dns_name_matches(pattern, hostname)) {
        Ok(())
    } else {
        Err(PkiError::HostnameMismatch(format!(
            "no dNSName entry for {hostname}"
        )))
    }
}

fn dns_name_matches(pattern: &str, hostname: &str) -> bool {
    let pattern = pattern.trim_end_matches('.').to_ascii_lowercase();
    let hostname = hostname.trim_end_matches('.').to_ascii_lowercase();

    if let Some(suffix) = pattern.strip_prefix("*.") {
        // The wildcard covers exactly one label and never a bare suffix
        match hostname.split_once('.') {
            Some((label, rest)) => !label.is_empty() && rest == suffix,
            None => false,
        }
    } else {
        pattern == hostname
    }
}
