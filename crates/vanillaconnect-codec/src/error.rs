//! Error types for compact token encoding and decoding.

use thiserror::Error;

/// Which token segment a structural decode failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// First segment (header JSON).
    Header,
    /// Second segment (claim JSON).
    Claim,
    /// Third segment (signature bytes).
    Signature,
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Header => f.write_str("header"),
            Self::Claim => f.write_str("claim"),
            Self::Signature => f.write_str("signature"),
        }
    }
}

/// Error type for token encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Header or claim could not be serialized as JSON.
    #[error("failed to serialize token segment as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The HMAC could not be keyed with the given secret.
    #[error("invalid signing key")]
    InvalidKey,
}

/// Error type for token decoding and signature verification.
///
/// The `Display` message of each variant is what the engine records in its
/// validation error set, so messages stay short and human-readable.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The token does not have exactly three dot-separated segments.
    #[error("wrong number of segments")]
    WrongSegmentCount,

    /// A segment is not valid base64url.
    #[error("invalid base64url encoding in {0} segment")]
    InvalidBase64(Segment),

    /// A decoded segment is not a JSON object.
    #[error("invalid JSON in {0} segment")]
    InvalidJson(Segment),

    /// The header has no `alg` field.
    #[error("header is missing the alg field")]
    MissingAlgorithm,

    /// The header's `alg` is not in the caller's allowlist.
    #[error("algorithm {0:?} is not allowed")]
    AlgorithmNotAllowed(String),

    /// The recomputed signature does not match the token's signature.
    #[error("signature verification failed")]
    SignatureMismatch,

    /// The claim's `exp` timestamp is in the past.
    #[error("token has expired")]
    Expired,

    /// The HMAC could not be keyed with the given secret.
    #[error("invalid signing key")]
    InvalidKey,
}
