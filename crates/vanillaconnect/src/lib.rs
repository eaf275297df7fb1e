//! # VanillaConnect — signed-token single-sign-on handshake
//!
//! A client and an identity provider exchange two token kinds to assert a
//! client-supplied nonce and a resource identity:
//!
//! - **Authentication request** — issued by the client, carries a fresh nonce.
//! - **Response** — issued by the provider, echoes the nonce and carries
//!   either the authenticated resource's `id` or a map of errors.
//!
//! Both are compact HS256 JWTs addressed to a specific client via the `azp`
//! ("authorized party") header field. [`ConnectEngine`] builds and validates
//! both kinds; [`ConnectProvider`] is a convenience facade that sequences one
//! validate-then-respond call for the provider side.
//!
//! ## Quick start
//!
//! ```rust
//! use vanillaconnect::ConnectEngine;
//!
//! let client = ConnectEngine::new("my-client", b"shared-secret".to_vec());
//! let provider = ConnectEngine::new("my-client", b"shared-secret".to_vec());
//!
//! let token = client.create_authentication_token("nonce-123")?;
//! let claim = provider.validate_authentication(&token).expect("valid token");
//! assert_eq!(claim.nonce, "nonce-123");
//! # Ok::<(), vanillaconnect::CreateError>(())
//! ```
//!
//! ## Validation model
//!
//! `validate_*` never raises for an invalid token: every failed check lands
//! as a `code -> message` entry in a [`ValidationErrors`] set, returned as
//! the `Err` variant. An engine holds no per-call mutable state, so a single
//! instance is safe to share across threads.
//!
//! ## Modules
//!
//! - [`engine`] - token construction and the validation engine
//! - [`claims`] - header/claim types and per-kind field templates
//! - [`errors`] - validation error set and operational error enums
//! - [`provider`] - provider-side convenience facade

pub mod claims;
pub mod engine;
pub mod errors;
pub mod provider;

pub use claims::{RequestClaim, ResponseClaim, TokenHeader, TokenKind};
pub use engine::{extract_client_id, ConnectEngine};
pub use errors::{CreateError, ExtractError, ValidationErrors};
pub use provider::ConnectProvider;

// Re-exported so callers can hand-build claim maps without naming the codec.
pub use vanillaconnect_codec::JsonMap;

/// Protocol version carried in every claim. Semantic versioning.
pub const VERSION: &str = "1.0.0";

/// Seconds before an issued token expires (`exp = iat + TIMEOUT`).
pub const TIMEOUT: u64 = 1200;

/// The signing algorithm for all VanillaConnect tokens.
pub const HASHING_ALGORITHM: &str = "HS256";
