//! Token header and claim types, plus the per-kind field templates the
//! validation engine enforces.

use serde::{Deserialize, Serialize};
use vanillaconnect_codec::JsonMap;

use crate::{HASHING_ALGORITHM, VERSION};

/// Header shared by both token kinds.
///
/// `azp` ("authorized party") is the client ID the token is addressed to; the
/// validating side always checks a token addressed to itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    /// Signing algorithm, always `"HS256"`.
    pub alg: String,
    /// Authorized party: the client ID.
    pub azp: String,
    /// Token type, always `"JWT"`.
    pub typ: String,
}

impl TokenHeader {
    /// Header for a token addressed to `client_id`.
    pub fn for_client(client_id: &str) -> Self {
        Self {
            alg: HASHING_ALGORITHM.to_string(),
            azp: client_id.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Claim of an authentication request token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestClaim {
    /// Unix timestamp the token was issued at.
    pub iat: u64,
    /// Unix timestamp the token expires at (`iat + TIMEOUT`).
    pub exp: u64,
    /// Opaque caller-supplied correlation value, echoed in the response.
    pub nonce: String,
    /// Protocol version the issuer speaks.
    pub version: String,
}

impl RequestClaim {
    /// Fresh claim for `nonce`, issued now.
    pub(crate) fn issue(nonce: &str, iat: u64) -> Self {
        Self {
            iat,
            exp: iat + crate::TIMEOUT,
            nonce: nonce.to_string(),
            version: VERSION.to_string(),
        }
    }
}

/// Success-shape claim of a response token.
///
/// The alternative error shape (`{"errors": {...}}` and nothing else) never
/// materializes as a `ResponseClaim`; the engine detects it on the raw map
/// and bubbles the embedded errors instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseClaim {
    /// Identifier of the authenticated resource (usually a user).
    pub id: String,
    /// Unix timestamp the token was issued at.
    pub iat: u64,
    /// Unix timestamp the token expires at (`iat + TIMEOUT`).
    pub exp: u64,
    /// Nonce echoed from the authentication request.
    pub nonce: String,
    /// Protocol version the issuer speaks.
    pub version: String,
    /// Any extra resource fields the provider attached (e.g. `aud`).
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// The two token kinds of the handshake.
///
/// Each kind carries its required header/claim fields and its error-code
/// prefix as data, so validation is ordinary branching over one enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Client-issued authentication request.
    Authentication,
    /// Provider-issued response.
    Response,
}

impl TokenKind {
    /// Header fields both kinds require.
    pub const REQUIRED_HEADER_FIELDS: &'static [&'static str] = &["alg", "azp", "typ"];

    /// Prefix for error codes recorded while validating this kind.
    pub fn error_prefix(self) -> &'static str {
        match self {
            Self::Authentication => "auth",
            Self::Response => "response",
        }
    }

    /// Claim fields this kind requires.
    pub fn required_claim_fields(self) -> &'static [&'static str] {
        match self {
            Self::Authentication => &["iat", "exp", "nonce", "version"],
            Self::Response => &["id", "iat", "exp", "nonce", "version"],
        }
    }

    /// Full error code for this kind: `{prefix}_{suffix}`.
    pub(crate) fn code(self, suffix: &str) -> String {
        format!("{}_{suffix}", self.error_prefix())
    }
}
