//! Compact token serialization, signing, and verification.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{DecodeError, EncodeError, Segment};

type HmacSha256 = Hmac<Sha256>;

/// Raw JSON object, as decoded from a token segment.
pub type JsonMap = serde_json::Map<String, Value>;

/// The only signing algorithm this codec implements.
pub const ALG_HS256: &str = "HS256";

/// A structurally valid, signature-verified token, split into its raw parts.
///
/// Field-level semantics (templates, binding, versions) are the engine's job;
/// the codec hands back plain JSON maps.
#[derive(Debug, Clone)]
pub struct Decoded {
    /// Decoded header segment.
    pub header: JsonMap,
    /// Decoded claim segment.
    pub claim: JsonMap,
}

/// Sign and encode a header/claim pair into a compact token string.
///
/// # Errors
///
/// Returns [`EncodeError`] if either part fails JSON serialization or the
/// secret cannot key the HMAC.
pub fn encode<H, C>(header: &H, claim: &C, secret: &[u8]) -> Result<String, EncodeError>
where
    H: Serialize,
    C: Serialize,
{
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header)?);
    let claim_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claim)?);
    let signing_input = format!("{header_b64}.{claim_b64}");

    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| EncodeError::InvalidKey)?;
    mac.update(signing_input.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Verify and decode a compact token string.
///
/// Checks, in order: segment count, base64url/JSON structure of every
/// segment, that the header's `alg` is in `allowed_algorithms`, the
/// HMAC-SHA256 signature (constant-time), and finally the claim's `exp`
/// timestamp when one is present.
///
/// # Errors
///
/// Returns the first [`DecodeError`] encountered; a decode failure is
/// terminal, the caller gets no partial data.
pub fn decode(
    token: &str,
    secret: &[u8],
    allowed_algorithms: &[&str],
) -> Result<Decoded, DecodeError> {
    let (header_b64, claim_b64, signature_b64) = split_segments(token)?;

    let header = decode_json_segment(header_b64, Segment::Header)?;
    let claim = decode_json_segment(claim_b64, Segment::Claim)?;

    let alg = header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingAlgorithm)?;
    if !allowed_algorithms.contains(&alg) {
        return Err(DecodeError::AlgorithmNotAllowed(alg.to_string()));
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| DecodeError::InvalidBase64(Segment::Signature))?;

    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| DecodeError::InvalidKey)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(claim_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| DecodeError::SignatureMismatch)?;

    // exp is inclusive: a token expiring exactly now is already expired.
    if let Some(exp) = claim.get("exp").and_then(Value::as_u64) {
        if unix_now() >= exp {
            return Err(DecodeError::Expired);
        }
    }

    Ok(Decoded { header, claim })
}

/// Decode only the header segment of a token, without any signature check.
///
/// Needs no secret. The segment-count rule still applies so that a truncated
/// token is rejected rather than half-parsed.
///
/// # Errors
///
/// Returns [`DecodeError::WrongSegmentCount`] for anything other than three
/// segments, or a structural error for an undecodable header.
pub fn decode_header_segment(token: &str) -> Result<JsonMap, DecodeError> {
    let (header_b64, _, _) = split_segments(token)?;
    decode_json_segment(header_b64, Segment::Header)
}

fn split_segments(token: &str) -> Result<(&str, &str, &str), DecodeError> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(claim), Some(signature), None) => Ok((header, claim, signature)),
        _ => Err(DecodeError::WrongSegmentCount),
    }
}

fn decode_json_segment(segment: &str, which: Segment) -> Result<JsonMap, DecodeError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| DecodeError::InvalidBase64(which))?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(DecodeError::InvalidJson(which)),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SECRET: &[u8] = b"test-secret-at-least-32-bytes-long!!";

    fn sample_token() -> String {
        let header = json!({"alg": "HS256", "azp": "client-1", "typ": "JWT"});
        let claim = json!({
            "iat": unix_now(),
            "exp": unix_now() + 1200,
            "nonce": "n-123",
            "version": "1.0.0",
        });
        encode(&header, &claim, SECRET).expect("encode sample token")
    }

    #[test]
    fn roundtrip_preserves_header_and_claim() {
        let token = sample_token();
        let decoded = decode(&token, SECRET, &[ALG_HS256]).expect("decode");

        assert_eq!(decoded.header["azp"], json!("client-1"));
        assert_eq!(decoded.header["alg"], json!("HS256"));
        assert_eq!(decoded.claim["nonce"], json!("n-123"));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let token = sample_token();
        // Flip the last character of the signature segment.
        let mut tampered = token.clone();
        let last = tampered.pop().expect("non-empty token");
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        let err = decode(&tampered, SECRET, &[ALG_HS256]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::SignatureMismatch | DecodeError::InvalidBase64(Segment::Signature)
        ));
    }

    #[test]
    fn tampered_claim_is_rejected() {
        let token = sample_token();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_claim = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&json!({"nonce": "evil"})).expect("serialize"),
        );
        parts[1] = &forged_claim;
        let forged = parts.join(".");

        let err = decode(&forged, SECRET, &[ALG_HS256]).unwrap_err();
        assert!(matches!(err, DecodeError::SignatureMismatch));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sample_token();
        let err = decode(&token, b"another secret entirely", &[ALG_HS256]).unwrap_err();
        assert!(matches!(err, DecodeError::SignatureMismatch));
    }

    #[test]
    fn wrong_segment_count_is_rejected() {
        for bad in ["", "a.b", "a.b.c.d", "no-dots-at-all"] {
            let err = decode(bad, SECRET, &[ALG_HS256]).unwrap_err();
            assert!(
                matches!(err, DecodeError::WrongSegmentCount),
                "token {bad:?} produced {err:?}"
            );
        }
    }

    #[test]
    fn disallowed_algorithm_is_rejected() {
        let header = json!({"alg": "none", "azp": "client-1", "typ": "JWT"});
        let claim = json!({"nonce": "n"});
        let token = encode(&header, &claim, SECRET).expect("encode");

        let err = decode(&token, SECRET, &[ALG_HS256]).unwrap_err();
        assert!(matches!(err, DecodeError::AlgorithmNotAllowed(alg) if alg == "none"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let header = json!({"alg": "HS256", "azp": "client-1", "typ": "JWT"});
        let claim = json!({"iat": unix_now() - 2400, "exp": unix_now() - 1200, "nonce": "n"});
        let token = encode(&header, &claim, SECRET).expect("encode");

        let err = decode(&token, SECRET, &[ALG_HS256]).unwrap_err();
        assert!(matches!(err, DecodeError::Expired));
    }

    #[test]
    fn exp_boundary_is_inclusive() {
        let header = json!({"alg": "HS256", "azp": "client-1", "typ": "JWT"});
        let claim = json!({"exp": unix_now(), "nonce": "n"});
        let token = encode(&header, &claim, SECRET).expect("encode");

        let err = decode(&token, SECRET, &[ALG_HS256]).unwrap_err();
        assert!(matches!(err, DecodeError::Expired));
    }

    #[test]
    fn claim_without_exp_is_accepted() {
        let header = json!({"alg": "HS256", "azp": "client-1", "typ": "JWT"});
        let claim = json!({"errors": {"x": "y"}});
        let token = encode(&header, &claim, SECRET).expect("encode");

        let decoded = decode(&token, SECRET, &[ALG_HS256]).expect("decode");
        assert_eq!(decoded.claim["errors"], json!({"x": "y"}));
    }

    #[test]
    fn header_segment_decodes_without_secret() {
        let token = sample_token();
        let header = decode_header_segment(&token).expect("decode header");
        assert_eq!(header["azp"], json!("client-1"));
    }

    #[test]
    fn header_segment_requires_three_segments() {
        let err = decode_header_segment("only.two").unwrap_err();
        assert!(matches!(err, DecodeError::WrongSegmentCount));
    }

    #[test]
    fn non_object_segment_is_invalid_json() {
        let not_an_object = URL_SAFE_NO_PAD.encode(b"[1,2,3]");
        let token = format!("{not_an_object}.{not_an_object}.sig");
        let err = decode_header_segment(&token).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidJson(Segment::Header)));
    }
}
