use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Facebook sends URL-safe base64, sometimes padded and sometimes not
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Error, Debug)]
pub enum SignedRequestError {
    #[error("App secret is not configured")]
    MissingSecret,

    #[error("signed_request must have the form <signature>.<payload>")]
    Malformed,

    #[error("Invalid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Invalid payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Signature verification failed")]
    BadSignature,
}

/// Verified signed_request payload
#[derive(Debug, Clone, Deserialize)]
pub struct SignedRequest {
    pub user_id: String,
    pub algorithm: String,
    #[serde(default)]
    pub issued_at: Option<i64>,
}

/// Verify and decode a `signed_request` with the app secret.
///
/// The signature is HMAC-SHA256 over the still-encoded payload segment.
pub fn parse_signed_request(
    signed_request: &str,
    app_secret: &str,
) -> Result<SignedRequest, SignedRequestError> {
    if app_secret.is_empty() {
        return Err(SignedRequestError::MissingSecret);
    }

    let (encoded_sig, encoded_payload) = signed_request
        .trim()
        .split_once('.')
        .ok_or(SignedRequestError::Malformed)?;
    if encoded_sig.is_empty() || encoded_payload.is_empty() || encoded_payload.contains('.') {
        return Err(SignedRequestError::Malformed);
    }

    let signature = URL_SAFE_LENIENT.decode(encoded_sig)?;

    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .map_err(|_| SignedRequestError::MissingSecret)?;
    mac.update(encoded_payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| SignedRequestError::BadSignature)?;

    let payload = URL_SAFE_LENIENT.decode(encoded_payload)?;
    let request: SignedRequest = serde_json::from_slice(&payload)?;

    if !request.algorithm.eq_ignore_ascii_case("HMAC-SHA256") {
        return Err(SignedRequestError::UnsupportedAlgorithm(request.algorithm));
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    const SECRET: &str = "app-secret";

    fn sign(payload: &serde_json::Value, secret: &str) -> String {
        let encoded = URL_SAFE_NO_PAD.encode(payload.to_string());
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(encoded.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{}.{}", sig, encoded)
    }

    fn payload() -> serde_json::Value {
        json!({ "user_id": "1234567890", "algorithm": "HMAC-SHA256", "issued_at": 1700000000 })
    }

    #[test]
    fn test_valid_request_is_accepted() {
        let parsed = parse_signed_request(&sign(&payload(), SECRET), SECRET).unwrap();
        assert_eq!(parsed.user_id, "1234567890");
        assert_eq!(parsed.issued_at, Some(1700000000));
    }

    #[test]
    fn test_algorithm_is_case_insensitive() {
        let body = json!({ "user_id": "1", "algorithm": "hmac-sha256" });
        assert!(parse_signed_request(&sign(&body, SECRET), SECRET).is_ok());
    }

    #[test]
    fn test_padded_segments_are_accepted() {
        let signed = sign(&payload(), SECRET);
        let (sig, body) = signed.split_once('.').unwrap();
        let pad = |s: &str| format!("{}{}", s, "=".repeat((4 - s.len() % 4) % 4));
        let padded = format!("{}.{}", pad(sig), body);
        assert!(parse_signed_request(&padded, SECRET).is_ok());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let err = parse_signed_request(&sign(&payload(), "other"), SECRET).unwrap_err();
        assert!(matches!(err, SignedRequestError::BadSignature));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let signed = sign(&payload(), SECRET);
        let (sig, _) = signed.split_once('.').unwrap();
        let forged = URL_SAFE_NO_PAD.encode(
            json!({ "user_id": "999", "algorithm": "HMAC-SHA256" }).to_string(),
        );
        let err = parse_signed_request(&format!("{}.{}", sig, forged), SECRET).unwrap_err();
        assert!(matches!(err, SignedRequestError::BadSignature));
    }

    #[test]
    fn test_unsupported_algorithm_is_rejected() {
        let body = json!({ "user_id": "1", "algorithm": "HMAC-SHA1" });
        let err = parse_signed_request(&sign(&body, SECRET), SECRET).unwrap_err();
        assert!(matches!(err, SignedRequestError::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            parse_signed_request("no-dot-here", SECRET),
            Err(SignedRequestError::Malformed)
        ));
        assert!(matches!(
            parse_signed_request("a.b.c", SECRET),
            Err(SignedRequestError::Malformed)
        ));
        assert!(matches!(
            parse_signed_request(&sign(&payload(), SECRET), ""),
            Err(SignedRequestError::MissingSecret)
        ));
    }
}
