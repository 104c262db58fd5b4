//! Authenticity check for payment processor webhooks.
//!
//! The processor sends `t=<unix seconds>,v1=<hex digest>` where the digest is
//! HMAC-SHA256 over `"{t}.{raw body}"` keyed with the shared webhook secret.
//! Several `v1` entries may appear while the processor rotates secrets.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use umrah_shared::Masked;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_TOLERANCE_SECONDS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,
    #[error("malformed signature header")]
    Malformed,
    #[error("signature timestamp outside tolerance")]
    Expired,
    #[error("no signature matches the payload")]
    Mismatch,
}

#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: Masked<String>,
    tolerance_seconds: u64,
}

impl WebhookVerifier {
    pub fn new(secret: Masked<String>, tolerance_seconds: u64) -> Self {
        Self {
            secret,
            tolerance_seconds,
        }
    }

    /// Checks `header` against `payload` as of `now` (unix seconds).
    pub fn verify(&self, header: Option<&str>, payload: &[u8], now: i64) -> Result<(), SignatureError> {
        let header = header.ok_or(SignatureError::Missing)?;

        let mut timestamp: Option<i64> = None;
        let mut candidates: Vec<Vec<u8>> = Vec::new();
        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                return Err(SignatureError::Malformed);
            };
            match key {
                "t" => timestamp = Some(value.parse().map_err(|_| SignatureError::Malformed)?),
                "v1" => candidates.push(hex::decode(value).map_err(|_| SignatureError::Malformed)?),
                // Other schemes (e.g. v0 test signatures) are ignored.
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
        if candidates.is_empty() {
            return Err(SignatureError::Malformed);
        }
        if now.abs_diff(timestamp) > self.tolerance_seconds {
            return Err(SignatureError::Expired);
        }

        let expected = digest(self.secret.expose(), timestamp, payload)?;
        if candidates
            .iter()
            .any(|candidate| constant_time_eq::constant_time_eq(candidate, &expected))
        {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

fn digest(secret: &str, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Mismatch)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Builds a header value the way the processor does; used by tests and
/// local tooling that replays events.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, SignatureError> {
    let signature = digest(secret, timestamp, payload)?;
    Ok(format!("t={},v1={}", timestamp, hex::encode(signature)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const NOW: i64 = 1_741_000_000;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(Masked::from(SECRET), DEFAULT_TOLERANCE_SECONDS)
    }

    #[test]
    fn test_valid_signature() {
        let body = br#"{"id":"evt_1"}"#;
        let header = sign_payload(SECRET, NOW, body).unwrap();
        assert_eq!(verifier().verify(Some(&header), body, NOW + 10), Ok(()));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let header = sign_payload(SECRET, NOW, br#"{"amount":100}"#).unwrap();
        let result = verifier().verify(Some(&header), br#"{"amount":1}"#, NOW);
        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = b"{}";
        let header = sign_payload("whsec_other", NOW, body).unwrap();
        assert_eq!(verifier().verify(Some(&header), body, NOW), Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let body = b"{}";
        let header = sign_payload(SECRET, NOW, body).unwrap();
        assert_eq!(verifier().verify(Some(&header), body, NOW + 301), Err(SignatureError::Expired));
        assert_eq!(verifier().verify(Some(&header), body, NOW + 300), Ok(()));
    }

    #[test]
    fn test_malformed_headers() {
        let v = verifier();
        assert_eq!(v.verify(None, b"{}", NOW), Err(SignatureError::Missing));
        for header in ["", "garbage", "t=abc,v1=00", "t=1741000000", "v1=zz,t=1741000000"] {
            assert_eq!(v.verify(Some(header), b"{}", NOW), Err(SignatureError::Malformed), "{}", header);
        }
    }

    #[test]
    fn test_any_v1_entry_may_match() {
        let body = b"{}";
        let good = sign_payload(SECRET, NOW, body).unwrap();
        let good_sig = good.split_once("v1=").map(|(_, s)| s).unwrap();
        let header = format!("t={},v1={},v1={}", NOW, "00".repeat(32), good_sig);
        assert_eq!(verifier().verify(Some(&header), body, NOW), Ok(()));
    }
}
