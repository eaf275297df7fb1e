//! Token construction and the validation engine.
//!
//! One [`ConnectEngine`] per logical party (client or provider), constructed
//! with that party's client ID and shared secret and reused across token
//! operations. Validation returns its error set by value, so one instance is
//! safe for concurrent use with no locking.

use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use vanillaconnect_codec::{self as codec, JsonMap};

use crate::claims::{RequestClaim, ResponseClaim, TokenHeader, TokenKind};
use crate::errors::{CreateError, ExtractError, ValidationErrors};
use crate::{HASHING_ALGORITHM, TIMEOUT, VERSION};

/// Builds and validates both handshake token kinds for one party.
#[derive(Clone)]
pub struct ConnectEngine {
    client_id: String,
    secret: Vec<u8>,
}

// Manual Debug impl so the secret can never land in logs.
impl std::fmt::Debug for ConnectEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectEngine")
            .field("client_id", &self.client_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Extract the `azp` (client ID) from a token's header without verifying the
/// signature.
///
/// Needs no secret, so a server can use it to pick the right secret for a
/// client before constructing an engine and attempting full validation.
///
/// # Errors
///
/// [`ExtractError::MalformedToken`] for wrong segment count or an
/// undecodable header segment; [`ExtractError::MissingClientId`] when the
/// header has no `azp` or it is empty.
pub fn extract_client_id(token: &str) -> Result<String, ExtractError> {
    let header = codec::decode_header_segment(token)?;
    match header.get("azp").and_then(Value::as_str) {
        Some(azp) if !azp.is_empty() => Ok(azp.to_string()),
        _ => Err(ExtractError::MissingClientId),
    }
}

impl ConnectEngine {
    /// New engine for `client_id` with its shared secret.
    ///
    /// Inputs are opaque; empty values are a caller error and are not
    /// detected here.
    pub fn new(client_id: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            client_id: client_id.into(),
            secret: secret.into(),
        }
    }

    /// The client ID this engine was constructed with.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Build a signed authentication request token carrying `nonce`.
    ///
    /// The nonce is opaque payload; no shape validation is performed on it.
    ///
    /// # Errors
    ///
    /// Returns [`CreateError`] if the codec fails to serialize or sign.
    pub fn create_authentication_token(&self, nonce: &str) -> Result<String, CreateError> {
        let header = TokenHeader::for_client(&self.client_id);
        let claim = RequestClaim::issue(nonce, unix_now());
        let token = codec::encode(&header, &claim, &self.secret)?;
        debug!(client_id = %self.client_id, "issued authentication token");
        Ok(token)
    }

    /// Build a signed response token.
    ///
    /// `claim_fields` is overlaid onto the claim defaults, then `iat`, `exp`
    /// and `nonce` are forcibly set: those three are authoritative and
    /// time-sensitive, never caller-controlled. For an error response,
    /// `claim_fields` must be `{"errors": {...}}` and nothing else; the
    /// emitted claim then carries exactly that one field.
    ///
    /// # Errors
    ///
    /// [`CreateError::MixedResponseShape`] when `errors` appears alongside
    /// other fields, or an encode error from the codec.
    pub fn create_response_token(
        &self,
        nonce: &str,
        claim_fields: JsonMap,
    ) -> Result<String, CreateError> {
        let header = TokenHeader::for_client(&self.client_id);

        if claim_fields.contains_key("errors") {
            if claim_fields.len() > 1 {
                return Err(CreateError::MixedResponseShape);
            }
            let token = codec::encode(&header, &claim_fields, &self.secret)?;
            debug!(client_id = %self.client_id, "issued error response token");
            return Ok(token);
        }

        let mut claim = claim_fields;
        claim
            .entry("version")
            .or_insert_with(|| Value::String(VERSION.to_string()));
        let iat = unix_now();
        claim.insert("iat".to_string(), Value::from(iat));
        claim.insert("exp".to_string(), Value::from(iat + TIMEOUT));
        claim.insert("nonce".to_string(), Value::String(nonce.to_string()));

        let token = codec::encode(&header, &claim, &self.secret)?;
        debug!(client_id = %self.client_id, "issued response token");
        Ok(token)
    }

    /// Validate an authentication request token.
    ///
    /// Decodes and verifies via the codec, then checks the header template
    /// and `azp` binding, claim completeness, version syntax, and the
    /// major-version floor, in that order.
    ///
    /// # Errors
    ///
    /// The full error set of this call; the token is valid iff the result is
    /// `Ok`.
    pub fn validate_authentication(&self, token: &str) -> Result<RequestClaim, ValidationErrors> {
        let kind = TokenKind::Authentication;
        let mut errors = ValidationErrors::new();

        let decoded = match codec::decode(token, &self.secret, &[HASHING_ALGORITHM]) {
            Ok(decoded) => decoded,
            Err(decode_error) => {
                warn!(
                    client_id = %self.client_id,
                    error = %decode_error,
                    "authentication token failed to decode"
                );
                errors.insert(kind.code("jwt_decode_exception"), decode_error.to_string());
                return Err(errors);
            }
        };

        self.validate_header_fields(&decoded.header, kind, &mut errors);
        validate_request_claim(&decoded.claim, &mut errors);

        if !errors.is_empty() {
            warn!(
                client_id = %self.client_id,
                error_count = errors.len(),
                "authentication token rejected"
            );
            return Err(errors);
        }

        match serde_json::from_value::<RequestClaim>(Value::Object(decoded.claim)) {
            Ok(claim) => {
                debug!(client_id = %self.client_id, "authentication token accepted");
                Ok(claim)
            }
            Err(deserialize_error) => {
                errors.insert(
                    kind.code("jwt_decode_exception"),
                    format!("claim has malformed field types: {deserialize_error}"),
                );
                Err(errors)
            }
        }
    }

    /// Validate a response token.
    ///
    /// Symmetric to [`validate_authentication`](Self::validate_authentication)
    /// with `response_`-prefixed codes, except that a claim of the error
    /// shape (`{"errors": {...}}` and nothing else) replaces the local error
    /// set with the remote party's reported errors verbatim. On success both
    /// the claim and the header are returned by value.
    ///
    /// # Errors
    ///
    /// The full error set of this call, or the bubbled remote errors.
    pub fn validate_response(
        &self,
        token: &str,
    ) -> Result<(ResponseClaim, TokenHeader), ValidationErrors> {
        let kind = TokenKind::Response;
        let mut errors = ValidationErrors::new();

        let decoded = match codec::decode(token, &self.secret, &[HASHING_ALGORITHM]) {
            Ok(decoded) => decoded,
            Err(decode_error) => {
                warn!(
                    client_id = %self.client_id,
                    error = %decode_error,
                    "response token failed to decode"
                );
                errors.insert(kind.code("jwt_decode_exception"), decode_error.to_string());
                return Err(errors);
            }
        };

        self.validate_header_fields(&decoded.header, kind, &mut errors);

        if let Some(remote) = remote_error_claim(&decoded.claim) {
            warn!(
                client_id = %self.client_id,
                error_count = remote.len(),
                "response token carried a remote error claim"
            );
            // The remote party's reported errors become the whole error set.
            return Err(remote);
        }
        validate_response_claim(&decoded.claim, &mut errors);

        if !errors.is_empty() {
            warn!(
                client_id = %self.client_id,
                error_count = errors.len(),
                "response token rejected"
            );
            return Err(errors);
        }

        let claim = serde_json::from_value::<ResponseClaim>(Value::Object(decoded.claim));
        let header = serde_json::from_value::<TokenHeader>(Value::Object(decoded.header));
        match (claim, header) {
            (Ok(claim), Ok(header)) => {
                debug!(client_id = %self.client_id, "response token accepted");
                Ok((claim, header))
            }
            (claim, header) => {
                let deserialize_error = claim
                    .err()
                    .map(|e| e.to_string())
                    .or_else(|| header.err().map(|e| e.to_string()))
                    .unwrap_or_default();
                errors.insert(
                    kind.code("jwt_decode_exception"),
                    format!("claim has malformed field types: {deserialize_error}"),
                );
                Err(errors)
            }
        }
    }

    /// Shared header check: required fields, then `azp` binding.
    fn validate_header_fields(&self, header: &JsonMap, kind: TokenKind, errors: &mut ValidationErrors) {
        let missing = missing_fields(header, TokenKind::REQUIRED_HEADER_FIELDS);
        if !missing.is_empty() {
            errors.insert(
                kind.code("missing_claim_item"),
                format!(
                    "The {} JWT header is missing the following item(s): {}",
                    kind.error_prefix(),
                    missing.join(", ")
                ),
            );
            return;
        }

        if header.get("azp").and_then(Value::as_str) != Some(self.client_id.as_str()) {
            errors.insert(
                kind.code("client_id_mismatch"),
                "The JWT was issued using a different ClientID(azp) than what was expected.",
            );
        }
    }
}

/// Claim checks for an authentication request: completeness, version syntax,
/// major-version floor. Stops at the first failed group.
fn validate_request_claim(claim: &JsonMap, errors: &mut ValidationErrors) {
    let kind = TokenKind::Authentication;

    let missing = missing_fields(claim, kind.required_claim_fields());
    if !missing.is_empty() {
        errors.insert(
            kind.code("missing_claim_item"),
            format!(
                "The authentication JWT claim is missing the following item(s): {}",
                missing.join(", ")
            ),
        );
        return;
    }

    let claim_version = claim.get("version").and_then(Value::as_str);
    let Some((claim_major, _, _)) = claim_version.and_then(parse_version) else {
        errors.insert(kind.code("invalid_version"), "Invalid version.");
        return;
    };

    // Floor check: any claim with major >= our own major is accepted.
    let engine_major = parse_version(VERSION).map_or(0, |(major, _, _)| major);
    if engine_major > claim_major {
        errors.insert(
            kind.code("incompatible_version"),
            format!(
                "The request was issued with version {} but this library needs a client of at least version {VERSION}",
                claim_version.unwrap_or_default()
            ),
        );
    }
}

/// Claim checks for a success-shape response: completeness, then a non-empty
/// `id`.
fn validate_response_claim(claim: &JsonMap, errors: &mut ValidationErrors) {
    let kind = TokenKind::Response;

    let missing = missing_fields(claim, kind.required_claim_fields());
    if !missing.is_empty() {
        errors.insert(
            kind.code("missing_claim_item"),
            format!(
                "The JWT claim is missing the following item(s): {}",
                missing.join(", ")
            ),
        );
        return;
    }

    match claim.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => {}
        _ => {
            errors.insert(
                kind.code("empty_claim_id"),
                "The JWT claim's field \"id\" is empty.",
            );
        }
    }
}

/// A response claim carrying exactly one field, `errors`, with a non-empty
/// object value is the remote-error shape; convert it into an error set.
fn remote_error_claim(claim: &JsonMap) -> Option<ValidationErrors> {
    if claim.len() != 1 {
        return None;
    }
    let Some(Value::Object(remote)) = claim.get("errors") else {
        return None;
    };
    if remote.is_empty() {
        // An empty error map is not a well-formed error claim; let the
        // template check report what is actually missing.
        return None;
    }

    let mut errors = ValidationErrors::new();
    for (code, message) in remote {
        match message.as_str() {
            Some(text) => errors.insert(code.clone(), text),
            None => errors.insert(code.clone(), message.to_string()),
        }
    }
    Some(errors)
}

fn missing_fields(map: &JsonMap, required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .filter(|field| !map.contains_key(**field))
        .copied()
        .collect()
}

/// Strict `MAJOR.MINOR.PATCH` with digits only in each part.
fn parse_version(version: &str) -> Option<(u64, u64, u64)> {
    let mut parts = version.split('.');
    let major = parse_numeric(parts.next()?)?;
    let minor = parse_numeric(parts.next()?)?;
    let patch = parse_numeric(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

fn parse_numeric(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
