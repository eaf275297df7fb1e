//! End-to-end handshake flows: client issues a request token, provider
//! validates and answers, client validates the response.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use vanillaconnect::{
    extract_client_id, ConnectEngine, ConnectProvider, CreateError, JsonMap, TIMEOUT, VERSION,
};

const CLIENT_ID: &str = "forum-client";
const SECRET: &[u8] = b"shared-secret-at-least-32-bytes-long";

fn engine() -> ConnectEngine {
    ConnectEngine::new(CLIENT_ID, SECRET.to_vec())
}

fn fields(value: Value) -> JsonMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

#[test]
fn authentication_roundtrip_echoes_nonce() {
    let engine = engine();
    let token = engine
        .create_authentication_token("nonce-123")
        .expect("create");

    let claim = engine.validate_authentication(&token).expect("valid");
    assert_eq!(claim.nonce, "nonce-123");
    assert_eq!(claim.version, VERSION);
    assert_eq!(claim.exp, claim.iat + TIMEOUT);
}

#[test]
fn response_roundtrip_returns_claim_and_header_by_value() {
    let engine = engine();
    let token = engine
        .create_response_token("nonce-123", fields(json!({"id": "user-42", "name": "alice"})))
        .expect("create");

    let (claim, header) = engine.validate_response(&token).expect("valid");
    assert_eq!(claim.id, "user-42");
    assert_eq!(claim.nonce, "nonce-123");
    assert_eq!(claim.exp, claim.iat + TIMEOUT);
    assert_eq!(claim.extra["name"], json!("alice"));
    assert_eq!(header.azp, CLIENT_ID);
    assert_eq!(header.alg, "HS256");
    assert_eq!(header.typ, "JWT");
}

#[test]
fn provider_answers_valid_request_with_resource_identity() {
    let client = engine();
    let provider = ConnectProvider::new(CLIENT_ID, SECRET.to_vec());

    let request = client
        .create_authentication_token("corr-77")
        .expect("create request");
    let response = provider
        .authenticate(&request, fields(json!({"id": "user-1"})))
        .expect("create response");

    let (claim, _header) = client.validate_response(&response).expect("valid response");
    assert_eq!(claim.id, "user-1");
    assert_eq!(claim.nonce, "corr-77");
}

#[test]
fn provider_answers_invalid_request_with_error_response() {
    // Request addressed to a different client: the provider must reject it
    // and report why inside a signed error response.
    let foreign_client = ConnectEngine::new("someone-else", SECRET.to_vec());
    let provider = ConnectProvider::new(CLIENT_ID, SECRET.to_vec());
    let receiving_client = engine();

    let request = foreign_client
        .create_authentication_token("corr-1")
        .expect("create request");
    let response = provider
        .authenticate(&request, fields(json!({"id": "user-1"})))
        .expect("error responses are still Ok at the transport level");

    let errors = receiving_client
        .validate_response(&response)
        .expect_err("error response must not validate");
    assert!(errors.get("auth_client_id_mismatch").is_some());
}

#[test]
fn provider_sso_sets_audience_and_generates_nonce() {
    let provider = ConnectProvider::new(CLIENT_ID, SECRET.to_vec());
    let client = engine();

    let token = provider
        .sso(fields(json!({"id": "user-9"})))
        .expect("create sso token");

    let (claim, _header) = client.validate_response(&token).expect("valid");
    assert_eq!(claim.id, "user-9");
    assert_eq!(claim.extra["aud"], json!("sso"));
    assert!(claim.nonce.starts_with("vcrn_"), "nonce was {}", claim.nonce);
}

#[test]
fn extract_client_id_needs_no_secret() {
    let token = engine()
        .create_authentication_token("n")
        .expect("create");
    assert_eq!(extract_client_id(&token).expect("extract"), CLIENT_ID);
}

#[test]
fn response_claim_cannot_mix_errors_with_other_fields() {
    let result = engine().create_response_token(
        "n",
        fields(json!({"errors": {"x": "y"}, "id": "user-1"})),
    );
    assert!(matches!(result, Err(CreateError::MixedResponseShape)));
}

#[test]
fn forced_fields_override_caller_supplied_values() {
    // iat/exp/nonce are authoritative: whatever the caller puts there loses.
    let engine = engine();
    let token = engine
        .create_response_token(
            "real-nonce",
            fields(json!({"id": "user-1", "nonce": "forged", "iat": 1, "exp": 2})),
        )
        .expect("create");

    let (claim, _header) = engine.validate_response(&token).expect("valid");
    assert_eq!(claim.nonce, "real-nonce");
    assert!(claim.iat > 2);
    assert_eq!(claim.exp, claim.iat + TIMEOUT);
}
