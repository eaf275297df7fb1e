//! Validation error accumulation and operational error types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use vanillaconnect_codec::{DecodeError, EncodeError};

/// Accumulated validation failures of one `validate_*` call.
///
/// A mapping from a stable error code (e.g. `auth_client_id_mismatch`) to a
/// human-readable message. Keys are unique; a token is valid iff the set the
/// call produced is empty, which is why `validate_*` returns this as its
/// `Err` variant rather than exposing shared mutable state.
///
/// Serializes as a plain JSON object so it can ride in a response token's
/// `errors` claim for remote propagation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one failure. A later entry under the same code wins.
    pub fn insert(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.0.insert(code.into(), message.into());
    }

    /// The message recorded under `code`, if any.
    pub fn get(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    /// True when no failure was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(code, message)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// Consume into the underlying map.
    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl From<BTreeMap<String, String>> for ValidationErrors {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (code, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{code}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Error type for [`extract_client_id`](crate::extract_client_id).
///
/// Distinguishes a structurally broken token from one whose header simply
/// lacks an authorized party, so a server can answer differently.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Wrong segment count, or the header segment failed base64url/JSON
    /// decoding.
    #[error("malformed token: {0}")]
    MalformedToken(#[from] DecodeError),

    /// The decoded header has no `azp` field, or `azp` is empty.
    #[error("client ID is missing from the token header")]
    MissingClientId,
}

/// Error type for token creation.
#[derive(Debug, Error)]
pub enum CreateError {
    /// The codec failed to serialize or sign the token.
    #[error("failed to encode token: {0}")]
    Encode(#[from] EncodeError),

    /// A response claim mixed `errors` with other fields. The two response
    /// shapes are mutually exclusive within one token.
    #[error("a response claim cannot mix `errors` with other fields")]
    MixedResponseShape,
}
