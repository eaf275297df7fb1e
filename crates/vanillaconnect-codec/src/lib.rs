//! Compact JWT primitive for the VanillaConnect handshake.
//!
//! This crate is the leaf cryptographic/encoding layer: it serializes a
//! header and a claim as JSON, base64url-encodes each (no padding), signs the
//! joined segments with HMAC-SHA256, and verifies/decodes tokens back into
//! raw JSON maps. It knows nothing about the handshake semantics — field
//! templates, client-ID binding, and version rules live in the
//! `vanillaconnect` crate on top.
//!
//! # Wire format
//!
//! Standard compact JWT serialization:
//!
//! ```text
//! base64url(header JSON) . base64url(claim JSON) . base64url(HMAC-SHA256 signature)
//! ```
//!
//! The signature is computed over `base64url(header) + "." + base64url(claim)`
//! with a shared secret.
//!
//! # Design notes
//!
//! - Decode failure is an expected, frequent outcome (any tampered, expired,
//!   or mis-addressed token), so it is modeled as [`DecodeError`] rather than
//!   a panic or an opaque boxed error.
//! - Signature comparison is constant-time (via `hmac`'s `Mac::verify_slice`).
//! - If the claim carries a numeric `exp` field, [`decode`] enforces it
//!   against the current time. Expiry lives here, not in the engine.
//! - [`decode_header_segment`] decodes only the header segment with no
//!   signature check and no secret, so a server can pick the right secret for
//!   a token before verifying it.

pub mod compact;
pub mod error;

pub use compact::{decode, decode_header_segment, encode, Decoded, JsonMap, ALG_HS256};
pub use error::{DecodeError, EncodeError};
