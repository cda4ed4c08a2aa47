//! Batch signing.
//!
//! The collector authenticates a batch by recomputing HMAC-SHA384 over the
//! exact request body with the shared secret. The digest travels base64
//! encoded in the `signature` query parameter.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use cardrelay_core::{ScanEvent, ScanId};
use hmac::{Hmac, Mac};
use sha2::Sha384;
use thiserror::Error;

type HmacSha384 = Hmac<Sha384>;

/// Errors raised while building or using a [`Signer`].
#[derive(Debug, Error)]
pub enum SignerError {
    /// Shared secret decoded to zero bytes.
    #[error("HMAC key is empty")]
    EmptyKey,

    /// Shared secret is not valid base64.
    #[error("HMAC key is not valid base64: {0}")]
    InvalidKeyEncoding(#[from] base64::DecodeError),

    /// Batch could not be serialized.
    #[error("Failed to serialize batch: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// HMAC-SHA384 signer holding the shared secret.
///
/// # Examples
///
/// ```
/// use cardrelay_network::Signer;
///
/// let signer = Signer::from_base64("c2VjcmV0").unwrap();
/// let signature = signer.sign(b"[]");
///
/// assert!(signer.verify(b"[]", &signature));
/// assert!(!signer.verify(b"[ ]", &signature));
/// ```
#[derive(Clone)]
pub struct Signer {
    keyed: HmacSha384,
}

impl Signer {
    /// Create a signer from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns `SignerError::EmptyKey` if `key` is empty.
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, SignerError> {
        let key = key.into();
        if key.is_empty() {
            return Err(SignerError::EmptyKey);
        }
        let keyed = HmacSha384::new_from_slice(&key).map_err(|_| SignerError::EmptyKey)?;
        Ok(Self { keyed })
    }

    /// Create a signer from a base64 encoded key, as stored in the config.
    ///
    /// # Errors
    ///
    /// Returns `SignerError::InvalidKeyEncoding` for malformed base64 and
    /// `SignerError::EmptyKey` if it decodes to nothing.
    pub fn from_base64(encoded: &str) -> Result<Self, SignerError> {
        Self::new(STANDARD.decode(encoded.trim())?)
    }

    /// Base64 HMAC-SHA384 of `body`.
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac = self.keyed.clone();
        mac.update(body);
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Check `signature` against `body` in constant time.
    pub fn verify(&self, body: &[u8], signature: &str) -> bool {
        let Ok(expected) = STANDARD.decode(signature) else {
            return false;
        };
        let mut mac = self.keyed.clone();
        mac.update(body);
        mac.verify_slice(&expected).is_ok()
    }

    /// Serialize `scans` as a JSON array and sign the resulting bytes.
    ///
    /// # Errors
    ///
    /// Returns `SignerError::Serialization` if the batch cannot be encoded.
    pub fn sign_batch(&self, scans: &[ScanEvent]) -> Result<SignedBatch, SignerError> {
        let body = serde_json::to_vec(scans)?;
        let signature = self.sign(&body);

        Ok(SignedBatch {
            body: Bytes::from(body),
            signature,
            scan_ids: scans.iter().map(|s| s.scan_id).collect(),
        })
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("key", &"<redacted>")
            .finish()
    }
}

/// A serialized batch and its signature, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBatch {
    /// JSON array of scans, exactly as signed.
    pub body: Bytes,

    /// Base64 HMAC-SHA384 of `body`.
    pub signature: String,

    /// Ids of the scans in `body`, in order.
    pub scan_ids: Vec<ScanId>,
}

impl SignedBatch {
    /// Number of scans in the batch.
    pub fn len(&self) -> usize {
        self.scan_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scan_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardrelay_core::StationId;
    use rstest::rstest;

    fn signer() -> Signer {
        Signer::new(b"kiosk-shared-secret".to_vec()).unwrap()
    }

    #[test]
    fn test_rfc4231_case_2() {
        // RFC 4231 test case 2: key "Jefe", HMAC-SHA-384.
        let signer = Signer::new(b"Jefe".to_vec()).unwrap();
        let expected_hex = "af45d2e376484031617f78d2b58a6b1b9c7ef464f5a01b47e42ec3736322445e\
                            8e2240ca5e69e2c78b3239ecfab21649";
        let expected: Vec<u8> = (0..expected_hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&expected_hex[i..i + 2], 16).unwrap())
            .collect();

        let signature = signer.sign(b"what do ya want for nothing?");
        assert_eq!(STANDARD.decode(signature).unwrap(), expected);
    }

    #[test]
    fn test_signature_is_deterministic() {
        let body = br#"[{"scan_id":"x"}]"#;
        assert_eq!(signer().sign(body), signer().sign(body));
    }

    #[test]
    fn test_one_byte_change_changes_signature() {
        let body = br#"[{"card_number":"123"}]"#.to_vec();
        let mut tampered = body.clone();
        tampered[17] = b'4';

        let s = signer();
        assert_ne!(s.sign(&body), s.sign(&tampered));
        assert!(!s.verify(&tampered, &s.sign(&body)));
    }

    #[test]
    fn test_different_keys_differ() {
        let other = Signer::new(b"another-secret".to_vec()).unwrap();
        assert_ne!(signer().sign(b"[]"), other.sign(b"[]"));
    }

    #[test]
    fn test_signature_is_base64_of_48_bytes() {
        let signature = signer().sign(b"payload");
        assert_eq!(STANDARD.decode(&signature).unwrap().len(), 48);
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(!signer().verify(b"[]", "not base64!!"));
        assert!(!signer().verify(b"[]", ""));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_empty_key_rejected(#[case] encoded: &str) {
        assert!(matches!(
            Signer::from_base64(encoded),
            Err(SignerError::EmptyKey)
        ));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        assert!(matches!(
            Signer::from_base64("***"),
            Err(SignerError::InvalidKeyEncoding(_))
        ));
    }

    #[test]
    fn test_from_base64_matches_raw_key() {
        let from_b64 = Signer::from_base64("c2VjcmV0").unwrap();
        let raw = Signer::new(b"secret".to_vec()).unwrap();
        assert_eq!(from_b64.sign(b"x"), raw.sign(b"x"));
    }

    #[test]
    fn test_sign_batch_signs_exact_body() {
        let station = StationId::new("lobby");
        let scans = vec![
            ScanEvent::new("111", station.clone()),
            ScanEvent::new("222", station),
        ];

        let batch = signer().sign_batch(&scans).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.scan_ids, vec![scans[0].scan_id, scans[1].scan_id]);
        assert!(signer().verify(&batch.body, &batch.signature));

        let decoded: Vec<ScanEvent> = serde_json::from_slice(&batch.body).unwrap();
        let cards: Vec<&str> = decoded.iter().map(|s| s.card_number.as_str()).collect();
        assert_eq!(cards, vec!["111", "222"]);
    }

    #[test]
    fn test_empty_batch() {
        let batch = signer().sign_batch(&[]).unwrap();
        assert!(batch.is_empty());
        assert_eq!(&batch.body[..], b"[]");
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", signer());
        assert!(!rendered.contains("kiosk-shared-secret"));
    }
}
