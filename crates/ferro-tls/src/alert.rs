//! TLS alert protocol: the closed set of alert descriptions this engine
//! emits, wire encoding, and the error-to-alert mapping.

use ferro_types::TlsError;

/// Alert severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertLevel {
    Warning = 1,
    Fatal = 2,
}

impl AlertLevel {
    pub fn from_u8(v: u8) -> Result<Self, u8> {
        match v {
            1 => Ok(AlertLevel::Warning),
            2 => Ok(AlertLevel::Fatal),
            _ => Err(v),
        }
    }
}

/// Alert description codes (RFC 5246 §7.2), restricted to the set this
/// engine produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertDescription {
    CloseNotify = 0,
    UnexpectedMessage = 10,
    BadRecordMac = 20,
    RecordOverflow = 22,
    HandshakeFailure = 40,
    CertificateRevoked = 44,
    CertificateExpired = 45,
    CertificateUnknown = 46,
    IllegalParameter = 47,
    DecodeError = 50,
    DecryptError = 51,
    ProtocolVersion = 70,
    InternalError = 80,
    NoRenegotiation = 100,
}

impl AlertDescription {
    pub fn from_u8(v: u8) -> Result<Self, u8> {
        match v {
            0 => Ok(AlertDescription::CloseNotify),
            10 => Ok(AlertDescription::UnexpectedMessage),
            20 => Ok(AlertDescription::BadRecordMac),
            22 => Ok(AlertDescription::RecordOverflow),
            40 => Ok(AlertDescription::HandshakeFailure),
            44 => Ok(AlertDescription::CertificateRevoked),
            45 => Ok(AlertDescription::CertificateExpired),
            46 => Ok(AlertDescription::CertificateUnknown),
            47 => Ok(AlertDescription::IllegalParameter),
            50 => Ok(AlertDescription::DecodeError),
            51 => Ok(AlertDescription::DecryptError),
            70 => Ok(AlertDescription::ProtocolVersion),
            80 => Ok(AlertDescription::InternalError),
            100 => Ok(AlertDescription::NoRenegotiation),
            _ => Err(v),
        }
    }
}

/// A TLS alert.
#[derive(Debug, Clone, Copy)]
pub struct Alert {
    pub level: AlertLevel,
    pub description: AlertDescription,
}

impl Alert {
    /// The two-byte record payload.
    pub fn to_bytes(self) -> [u8; 2] {
        [self.level as u8, self.description as u8]
    }

    /// Parse an alert record payload. Unknown descriptions are reported as
    /// raw values by the caller; here they are a decode failure.
    pub fn parse(payload: &[u8]) -> Result<(AlertLevel, u8), TlsError> {
        if payload.len() != 2 {
            return Err(TlsError::DecodeError("alert payload must be 2 bytes".into()));
        }
        let level =
            AlertLevel::from_u8(payload[0]).map_err(|v| {
                TlsError::DecodeError(format!("unknown alert level {v}"))
            })?;
        Ok((level, payload[1]))
    }
}

/// Map an internal error onto the alert description sent to the peer before
/// teardown.
pub fn alert_for_error(err: &TlsError) -> AlertDescription {
    match err {
        TlsError::UnexpectedMessage(_) => AlertDescription::UnexpectedMessage,
        TlsError::BadRecordMac => AlertDescription::BadRecordMac,
        TlsError::RecordOverflow => AlertDescription::RecordOverflow,
        TlsError::HandshakeFailed(_) => AlertDescription::HandshakeFailure,
        TlsError::IllegalParameter(_) => AlertDescription::IllegalParameter,
        TlsError::DecodeError(_) => AlertDescription::DecodeError,
        TlsError::DecryptError(_) => AlertDescription::DecryptError,
        TlsError::UnsupportedVersion => AlertDescription::ProtocolVersion,
        TlsError::CertificateExpired => AlertDescription::CertificateExpired,
        TlsError::CertificateRevoked => AlertDescription::CertificateRevoked,
        TlsError::CertificateUnknown(_) => AlertDescription::CertificateUnknown,
        TlsError::CryptoError(_) | TlsError::PkiError(_) => AlertDescription::InternalError,
        // The peer is already gone or at fault; no meaningful alert exists
        TlsError::AlertReceived(_)
        | TlsError::ConnectionClosed
        | TlsError::IoError(_) => AlertDescription::InternalError,
    }
}
