//! TLS 1.2 record layer: framing, protection states, sequence discipline.

pub mod cbc;
pub mod gcm;

use ferro_types::TlsError;

use cbc::{CbcDecryptor, CbcEncryptor};
use gcm::{GcmDecryptor, GcmEncryptor};

/// TLS 1.2 record version on the wire.
pub const TLS12_VERSION: u16 = 0x0303;

/// Maximum plaintext fragment length (RFC 5246 §6.2.1).
pub const MAX_PLAINTEXT_LENGTH: usize = 1 << 14;

/// Maximum ciphertext fragment length (RFC 5246 §6.2.3).
pub const MAX_CIPHERTEXT_LENGTH: usize = (1 << 14) + 2048;

/// Record header length.
pub const RECORD_HEADER_LEN: usize = 5;

/// TLS record content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ContentType {
    ChangeCipherSpec = 20,
    Alert = 21,
    Handshake = 22,
    ApplicationData = 23,
}

impl ContentType {
    pub fn from_u8(v: u8) -> Result<Self, TlsError> {
        match v {
            20 => Ok(ContentType::ChangeCipherSpec),
            21 => Ok(ContentType::Alert),
            22 => Ok(ContentType::Handshake),
            23 => Ok(ContentType::ApplicationData),
            _ => Err(TlsError::UnexpectedMessage(format!(
                "unknown record content type {v}"
            ))),
        }
    }
}

/// A record as framed on the wire.
#[derive(Debug, Clone)]
pub struct Record {
    pub content_type: ContentType,
    pub version: u16,
    pub fragment: Vec<u8>,
}

enum WriteProtection {
    Null,
    Cbc(CbcEncryptor),
    Gcm(GcmEncryptor),
}

enum ReadProtection {
    Null,
    Cbc(CbcDecryptor),
    Gcm(GcmDecryptor),
}

/// Record protection state for both directions.
///
/// Activation replaces the direction's protector and thereby resets its
/// sequence number to zero; the connection controller performs the swap at
/// the ChangeCipherSpec fence.
pub struct RecordLayer {
    write: WriteProtection,
    read: ReadProtection,
}

impl RecordLayer {
    pub fn new() -> Self {
        Self {
            write: WriteProtection::Null,
            read: ReadProtection::Null,
        }
    }

    pub fn is_write_protected(&self) -> bool {
        !matches!(self.write, WriteProtection::Null)
    }

    pub fn is_read_protected(&self) -> bool {
        !matches!(self.read, ReadProtection::Null)
    }

    /// Current write sequence number (records protected since activation).
    pub fn write_seq(&self) -> u64 {
        match &self.write {
            WriteProtection::Null => 0,
            WriteProtection::Cbc(enc) => enc.sequence_number(),
            WriteProtection::Gcm(enc) => enc.sequence_number(),
        }
    }

    /// Current read sequence number (records accepted since activation).
    pub fn read_seq(&self) -> u64 {
        match &self.read {
            ReadProtection::Null => 0,
            ReadProtection::Cbc(dec) => dec.sequence_number(),
            ReadProtection::Gcm(dec) => dec.sequence_number(),
        }
    }

    pub fn activate_write_cbc(&mut self, enc_key: Vec<u8>, mac_key: Vec<u8>, mac_len: usize) {
        self.write = WriteProtection::Cbc(CbcEncryptor::new(enc_key, mac_key, mac_len));
    }

    pub fn activate_write_gcm(&mut self, key: &[u8], salt: Vec<u8>) -> Result<(), TlsError> {
        self.write = WriteProtection::Gcm(GcmEncryptor::new(key, salt)?);
        Ok(())
    }

    pub fn activate_read_cbc(&mut self, enc_key: Vec<u8>, mac_key: Vec<u8>, mac_len: usize) {
        self.read = ReadProtection::Cbc(CbcDecryptor::new(enc_key, mac_key, mac_len));
    }

    pub fn activate_read_gcm(&mut self, key: &[u8], salt: Vec<u8>) -> Result<(), TlsError> {
        self.read = ReadProtection::Gcm(GcmDecryptor::new(key, salt)?);
        Ok(())
    }

    /// Drop all protection state (teardown).
    pub fn clear(&mut self) {
        self.write = WriteProtection::Null;
        self.read = ReadProtection::Null;
    }

    /// Protect and frame one outgoing record.
    pub fn seal_record(
        &mut self,
        content_type: ContentType,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, TlsError> {
        if plaintext.len() > MAX_PLAINTEXT_LENGTH {
            return Err(TlsError::RecordOverflow);
        }
        let record = match &mut self.write {
            WriteProtection::Null => Record {
                content_type,
                version: TLS12_VERSION,
                fragment: plaintext.to_vec(),
            },
            WriteProtection::Cbc(enc) => enc.encrypt_record(content_type, plaintext)?,
            WriteProtection::Gcm(enc) => enc.encrypt_record(content_type, plaintext)?,
        };
        Ok(serialize_record(&record))
    }

    /// Parse and unprotect one incoming record from `data`.
    ///
    /// Returns the inner content type, the plaintext, and the number of
    /// wire bytes consumed.
    pub fn open_record(&mut self, data: &[u8]) -> Result<(ContentType, Vec<u8>, usize), TlsError> {
        let (record, consumed) = parse_record(data)?;
        let plaintext = match &mut self.read {
            ReadProtection::Null => record.fragment,
            ReadProtection::Cbc(dec) => dec.decrypt_record(&record)?,
            ReadProtection::Gcm(dec) => dec.decrypt_record(&record)?,
        };
        if plaintext.len() > MAX_PLAINTEXT_LENGTH {
            return Err(TlsError::RecordOverflow);
        }
        Ok((record.content_type, plaintext, consumed))
    }
}

impl Default for RecordLayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one record header + fragment from `data`.
///
/// The caller guarantees `data` holds at least a full record; a short
/// buffer is reported as a decode failure. Lengths beyond the ciphertext
/// bound are a record_overflow condition.
pub fn parse_record(data: &[u8]) -> Result<(Record, usize), TlsError> {
    if data.len() < RECORD_HEADER_LEN {
        return Err(TlsError::DecodeError("incomplete record header".into()));
    }
    let content_type = ContentType::from_u8(data[0])?;
    let version = u16::from_be_bytes([data[1], data[2]]);
    let length = u16::from_be_bytes([data[3], data[4]]) as usize;

    if length > MAX_CIPHERTEXT_LENGTH {
        return Err(TlsError::RecordOverflow);
    }
    if data.len() < RECORD_HEADER_LEN + length {
        return Err(TlsError::DecodeError("incomplete record body".into()));
    }

    Ok((
        Record {
            content_type,
            version,
            fragment: data[RECORD_HEADER_LEN..RECORD_HEADER_LEN + length].to_vec(),
        },
        RECORD_HEADER_LEN + length,
    ))
}

/// Frame a record: type(1) || version(2) || length(2) || fragment.
pub fn serialize_record(record: &Record) -> Vec<u8> {
    let mut buf = Vec::with_capacity(RECORD_HEADER_LEN + record.fragment.len());
    buf.push(record.content_type as u8);
    buf.extend_from_slice(&record.version.to_be_bytes());
    buf.extend_from_slice(&(record.fragment.len() as u16).to_be_bytes());
    buf.extend_from_slice(&record.fragment);
    buf
}

/// Build the 13-byte MAC/AEAD additional data:
/// `seq(8) || type(1) || version(2) || length(2)`.
pub(crate) fn build_record_aad(seq: u64, content_type: ContentType, length: u16) -> [u8; 13] {
    let mut aad = [0u8; 13];
    aad[..8].copy_from_slice(&seq.to_be_bytes());
    aad[8] = content_type as u8;
    aad[9..11].copy_from_slice(&TLS12_VERSION.to_be_bytes());
    aad[11..13].copy_from_slice(&length.to_be_bytes());
    aad
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_roundtrip() {
        let mut layer = RecordLayer::new();
        let wire = layer
            .seal_record(ContentType::Handshake, b"client hello bytes")
            .unwrap();
        assert_eq!(wire[0], 22);
        assert_eq!(&wire[1..3], &[0x03, 0x03]);
        assert_eq!(wire.len(), 5 + 18);

        let (ct, plaintext, consumed) = layer.open_record(&wire).unwrap();
        assert_eq!(ct, ContentType::Handshake);
        assert_eq!(plaintext, b"client hello bytes");
        assert_eq!(consumed, wire.len());
    }

    #[test]
    fn test_length_field_matches_fragment() {
        let mut layer = RecordLayer::new();
        let wire = layer
            .seal_record(ContentType::ApplicationData, &[0xAA; 300])
            .unwrap();
        let length = u16::from_be_bytes([wire[3], wire[4]]) as usize;
        assert_eq!(length, 300);
        assert_eq!(wire.len(), 5 + length);
    }

    #[test]
    fn test_plaintext_over_limit_rejected() {
        let mut layer = RecordLayer::new();
        assert!(matches!(
            layer.seal_record(ContentType::ApplicationData, &vec![0u8; MAX_PLAINTEXT_LENGTH + 1]),
            Err(TlsError::RecordOverflow)
        ));
        assert!(layer
            .seal_record(ContentType::ApplicationData, &vec![0u8; MAX_PLAINTEXT_LENGTH])
            .is_ok());
    }

    #[test]
    fn test_ciphertext_bound_on_decode() {
        // length exactly 2^14 + 2048 is accepted by the parser
        let mut data = vec![23, 0x03, 0x03];
        data.extend_from_slice(&((MAX_CIPHERTEXT_LENGTH) as u16).to_be_bytes());
        data.extend_from_slice(&vec![0u8; MAX_CIPHERTEXT_LENGTH]);
        assert!(parse_record(&data).is_ok());

        // one byte more is record_overflow
        let mut data = vec![23, 0x03, 0x03];
        data.extend_from_slice(&((MAX_CIPHERTEXT_LENGTH + 1) as u16).to_be_bytes());
        data.extend_from_slice(&vec![0u8; MAX_CIPHERTEXT_LENGTH + 1]);
        assert!(matches!(
            parse_record(&data),
            Err(TlsError::RecordOverflow)
        ));
    }

    #[test]
    fn test_unknown_content_type_rejected() {
        let data = [99u8, 0x03, 0x03, 0x00, 0x00];
        assert!(matches!(
            parse_record(&data),
            Err(TlsError::UnexpectedMessage(_))
        ));
    }

    #[test]
    fn test_aad_layout() {
        let aad = build_record_aad(42, ContentType::ApplicationData, 100);
        assert_eq!(&aad[..8], &[0, 0, 0, 0, 0, 0, 0, 42]);
        assert_eq!(aad[8], 23);
        assert_eq!(&aad[9..11], &[0x03, 0x03]);
        assert_eq!(&aad[11..13], &[0x00, 0x64]);
    }

    #[test]
    fn test_cbc_activation_and_seq() {
        let mut layer = RecordLayer::new();
        layer.activate_write_cbc(vec![0x42; 16], vec![0xAB; 20], 20);
        assert!(layer.is_write_protected());
        assert!(!layer.is_read_protected());
        assert_eq!(layer.write_seq(), 0);

        layer.seal_record(ContentType::ApplicationData, b"one").unwrap();
        layer.seal_record(ContentType::ApplicationData, b"two").unwrap();
        assert_eq!(layer.write_seq(), 2);

        // Re-activation resets the sequence number
        layer.activate_write_cbc(vec![0x42; 16], vec![0xAB; 20], 20);
        assert_eq!(layer.write_seq(), 0);
    }

    #[test]
    fn test_protected_roundtrip_through_layer() {
        let mut client = RecordLayer::new();
        let mut server = RecordLayer::new();
        client.activate_write_gcm(&[0x42; 16], vec![1, 2, 3, 4]).unwrap();
        server.activate_read_gcm(&[0x42; 16], vec![1, 2, 3, 4]).unwrap();

        for msg in [&b"first"[..], b"second", b""] {
            let wire = client.seal_record(ContentType::ApplicationData, msg).unwrap();
            let (ct, plaintext, _) = server.open_record(&wire).unwrap();
            assert_eq!(ct, ContentType::ApplicationData);
            assert_eq!(plaintext, msg);
        }
        assert_eq!(client.write_seq(), 3);
        assert_eq!(server.read_seq(), 3);
    }
}
