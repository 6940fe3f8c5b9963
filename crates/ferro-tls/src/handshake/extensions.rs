//! ClientHello/ServerHello extension encoding and decoding.

use ferro_types::TlsError;

/// Extension type identifiers used by this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionType(pub u16);

impl ExtensionType {
    pub const SERVER_NAME: Self = Self(0x0000);
    pub const SUPPORTED_GROUPS: Self = Self(0x000A);
    pub const EC_POINT_FORMATS: Self = Self(0x000B);
    pub const SIGNATURE_ALGORITHMS: Self = Self(0x000D);
    pub const RENEGOTIATION_INFO: Self = Self(0xFF01);
}

/// A raw extension: type plus opaque data.
#[derive(Debug, Clone)]
pub struct Extension {
    pub extension_type: ExtensionType,
    pub data: Vec<u8>,
}

/// The signature/hash pairs offered in signature_algorithms: the cross
/// product of {SHA-1, SHA-256, SHA-384, SHA-512} x {RSA, ECDSA} plus
/// SHA-1/DSA. Byte values per RFC 5246 §7.4.1.4.1.
pub const SIGNATURE_ALGORITHM_PAIRS: &[(u8, u8)] = &[
    (4, 1), // sha256, rsa
    (5, 1), // sha384, rsa
    (6, 1), // sha512, rsa
    (2, 1), // sha1,   rsa
    (4, 3), // sha256, ecdsa
    (5, 3), // sha384, ecdsa
    (6, 3), // sha512, ecdsa
    (2, 3), // sha1,   ecdsa
    (2, 2), // sha1,   dsa
];

/// Named curves offered in supported_elliptic_curves (RFC 4492 §5.1.1).
pub const SUPPORTED_CURVES: &[u16] = &[0x0017, 0x0018, 0x0019];

/// Build the server_name extension (RFC 6066 §3), host_name type.
pub fn build_server_name(hostname: &str) -> Extension {
    let name = hostname.as_bytes();
    let entry_len = 1 + 2 + name.len();
    let mut data = Vec::with_capacity(2 + entry_len);
    data.extend_from_slice(&(entry_len as u16).to_be_bytes());
    data.push(0); // host_name
    data.extend_from_slice(&(name.len() as u16).to_be_bytes());
    data.extend_from_slice(name);
    Extension {
        extension_type: ExtensionType::SERVER_NAME,
        data,
    }
}

/// Build the signature_algorithms extension.
pub fn build_signature_algorithms() -> Extension {
    let mut data = Vec::with_capacity(2 + SIGNATURE_ALGORITHM_PAIRS.len() * 2);
    data.extend_from_slice(&((SIGNATURE_ALGORITHM_PAIRS.len() * 2) as u16).to_be_bytes());
    for (hash, sig) in SIGNATURE_ALGORITHM_PAIRS {
        data.push(*hash);
        data.push(*sig);
    }
    Extension {
        extension_type: ExtensionType::SIGNATURE_ALGORITHMS,
        data,
    }
}

/// Build the supported_elliptic_curves extension.
pub fn build_supported_curves() -> Extension {
    let mut data = Vec::with_capacity(2 + SUPPORTED_CURVES.len() * 2);
    data.extend_from_slice(&((SUPPORTED_CURVES.len() * 2) as u16).to_be_bytes());
    for curve in SUPPORTED_CURVES {
        data.extend_from_slice(&curve.to_be_bytes());
    }
    Extension {
        extension_type: ExtensionType::SUPPORTED_GROUPS,
        data,
    }
}

/// Build the ec_point_formats extension: uncompressed only.
pub fn build_ec_point_formats() -> Extension {
    Extension {
        extension_type: ExtensionType::EC_POINT_FORMATS,
        data: vec![0x01, 0x00],
    }
}

/// Build renegotiation_info carrying `renegotiated_connection` (empty on
/// the initial handshake, the prior client verify_data on renegotiation).
pub fn build_renegotiation_info(verify_data: &[u8]) -> Extension {
    let mut data = Vec::with_capacity(1 + verify_data.len());
    data.push(verify_data.len() as u8);
    data.extend_from_slice(verify_data);
    Extension {
        extension_type: ExtensionType::RENEGOTIATION_INFO,
        data,
    }
}

/// Parse renegotiation_info, returning the renegotiated_connection value.
pub fn parse_renegotiation_info(data: &[u8]) -> Result<Vec<u8>, TlsError> {
    if data.is_empty() {
        return Err(TlsError::DecodeError("empty renegotiation_info".into()));
    }
    let len = data[0] as usize;
    if data.len() != 1 + len {
        return Err(TlsError::DecodeError(
            "renegotiation_info length mismatch".into(),
        ));
    }
    Ok(data[1..].to_vec())
}

/// Encode an extension list with its 2-byte length prefix omitted (the
/// caller prepends it).
pub fn encode_extensions(extensions: &[Extension]) -> Vec<u8> {
    let mut out = Vec::new();
    for ext in extensions {
        out.extend_from_slice(&ext.extension_type.0.to_be_bytes());
        out.extend_from_slice(&(ext.data.len() as u16).to_be_bytes());
        out.extend_from_slice(&ext.data);
    }
    out
}

/// Parse an extension block (without the outer 2-byte length).
pub fn parse_extensions(mut data: &[u8]) -> Result<Vec<Extension>, TlsError> {
    let mut extensions = Vec::new();
    while !data.is_empty() {
        if data.len() < 4 {
            return Err(TlsError::DecodeError("truncated extension header".into()));
        }
        let ext_type = u16::from_be_bytes([data[0], data[1]]);
        let len = u16::from_be_bytes([data[2], data[3]]) as usize;
        if data.len() < 4 + len {
            return Err(TlsError::DecodeError("truncated extension data".into()));
        }
        extensions.push(Extension {
            extension_type: ExtensionType(ext_type),
            data: data[4..4 + len].to_vec(),
        });
        data = &data[4 + len..];
    }
    Ok(extensions)
}
