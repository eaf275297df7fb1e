//! Provider-side convenience facade.
//!
//! Wraps one [`ConnectEngine`] and sequences the provider's
//! validate-then-respond step in a single call, so forum/identity-provider
//! code never touches the validation plumbing directly.

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;
use vanillaconnect_codec::JsonMap;

use crate::engine::ConnectEngine;
use crate::errors::CreateError;

/// Does everything the provider side needs in one call.
#[derive(Debug, Clone)]
pub struct ConnectProvider {
    engine: ConnectEngine,
}

impl ConnectProvider {
    /// New provider facade for `client_id` with its shared secret.
    pub fn new(client_id: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            engine: ConnectEngine::new(client_id, secret),
        }
    }

    /// The wrapped engine, for callers that need the lower-level operations.
    pub fn engine(&self) -> &ConnectEngine {
        &self.engine
    }

    /// Answer an authentication request token with a response token.
    ///
    /// On a valid request, issues a response echoing the request's nonce and
    /// carrying `claim_fields` (which must include a non-empty `id`). On an
    /// invalid request, issues an error-shape response carrying the
    /// validation error set, so the client learns why it was rejected.
    ///
    /// # Errors
    ///
    /// Returns [`CreateError`] only when the response token itself cannot be
    /// built; an invalid *request* still produces an `Ok` error-response.
    pub fn authenticate(
        &self,
        auth_token: &str,
        claim_fields: JsonMap,
    ) -> Result<String, CreateError> {
        match self.engine.validate_authentication(auth_token) {
            Ok(request) => self.engine.create_response_token(&request.nonce, claim_fields),
            Err(errors) => {
                debug!(
                    client_id = %self.engine.client_id(),
                    error_count = errors.len(),
                    "answering invalid authentication request with an error response"
                );
                let mut remote = JsonMap::new();
                for (code, message) in errors.iter() {
                    remote.insert(code.clone(), Value::String(message.clone()));
                }
                let mut claim = JsonMap::new();
                claim.insert("errors".to_string(), Value::Object(remote));
                // The nonce is irrelevant for the error shape; the claim
                // carries exactly the errors field.
                self.engine.create_response_token("", claim)
            }
        }
    }

    /// Issue an unsolicited single-sign-on response token for a resource.
    ///
    /// Sets the audience to `sso` and generates a fresh `vcrn_`-prefixed
    /// nonce, since there is no request to echo one from.
    ///
    /// # Errors
    ///
    /// Returns [`CreateError`] if the token cannot be built, including the
    /// fail-fast on a `resource_fields` map that carries `errors`.
    pub fn sso(&self, mut resource_fields: JsonMap) -> Result<String, CreateError> {
        resource_fields.insert("aud".to_string(), Value::String("sso".to_string()));
        let nonce = format!("vcrn_{}", Uuid::new_v4().simple());
        self.engine.create_response_token(&nonce, resource_fields)
    }
}
