#![forbid(unsafe_code)]
#![doc = "X.509 certificate handling for ferrotls."]
//!
//! Parses DER certificates into owned structures, builds and verifies
//! certificate chains with per-certificate status flags, and matches
//! hostnames against leaf certificates.

mod chain;
mod der;
mod hostname;
mod x509;

pub use chain::{BuiltChain, ChainBuilder, ChainStatus};
pub use hostname::verify_hostname;
pub use x509::{Certificate, PublicKeyInfo, SignatureAlg};
