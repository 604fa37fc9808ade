//! Handler-level tests for the API boundary

mod testkit;

use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use serde_json::{json, Value};

use common::crypto::{NodeId, SecretKey};
use hashgate_service::http_server::api::v0::file::resolve;
use hashgate_service::http_server::api::v0::upload::{finalize, initiate};
use hashgate_service::http_server::api::v0::Envelope;
use hashgate_service::http_server::gw;

fn envelope(payload: Value) -> Envelope {
    Envelope {
        payload,
        node_id: None,
        signature: None,
        user_id: None,
        access_token: None,
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_resolve_handler_round_trip() {
    let env = testkit::setup().await;
    let data = b"resolvable";
    let locator = testkit::store_content(&env.primary, data).await;

    let req = envelope(json!({
        "timestamp": 1,
        "hashAlg": "sha1",
        "hash": locator.hash.as_str(),
    }));

    let response = resolve::handler(State(env.state.clone()), Json(req))
        .await
        .unwrap()
        .into_response();
    assert_eq!(response.status(), http::StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["found"], json!(true));
    assert_eq!(body["size"], json!(data.len()));
    assert_eq!(body["objectKey"], json!(locator.object_key()));
    assert_eq!(body["cacheHit"], json!(false));
    assert!(body.get("fallback").is_none());
}

#[tokio::test]
async fn test_resolve_handler_rejects_malformed_payload() {
    let env = testkit::setup().await;

    // hash is not canonical lowercase hex
    let req = envelope(json!({
        "timestamp": 1,
        "hashAlg": "sha1",
        "hash": "NOT-A-HASH",
    }));

    let result = resolve::handler(State(env.state.clone()), Json(req)).await;
    assert!(matches!(result, Err(resolve::ResolveError::Validation(_))));
}

#[tokio::test]
async fn test_resolve_handler_verifies_carried_identity() {
    let env = testkit::setup().await;
    let locator = testkit::store_content(&env.primary, b"signed resolve").await;

    let secret = SecretKey::generate();
    let payload = json!({
        "timestamp": 1,
        "hashAlg": "sha1",
        "hash": locator.hash.as_str(),
    });

    // a signature over a different payload must reject the request even
    // though resolution itself is ungated
    let mut req = envelope(payload.clone());
    req.node_id = Some(NodeId::from(&secret.public()));
    req.signature = Some(secret.sign_payload(&json!({"other": true})));

    let result = resolve::handler(State(env.state.clone()), Json(req)).await;
    assert!(matches!(result, Err(resolve::ResolveError::Identity(_))));

    // a correct signature goes through
    let mut req = envelope(payload.clone());
    req.node_id = Some(NodeId::from(&secret.public()));
    req.signature = Some(secret.sign_payload(&payload));

    let response = resolve::handler(State(env.state.clone()), Json(req))
        .await
        .unwrap()
        .into_response();
    assert_eq!(response.status(), http::StatusCode::OK);
}

#[tokio::test]
async fn test_initiate_handler_with_user_identity() {
    let env = testkit::setup().await;
    testkit::write_policy(&env.primary, testkit::OPEN_POLICY).await;
    let locator = testkit::content_for(b"api upload");

    let mut req = envelope(json!({
        "timestamp": 1,
        "size": 10,
        "hashAlg": "sha1",
        "hash": locator.hash.as_str(),
    }));
    req.user_id = Some("alice".into());
    req.access_token = Some("tok-alice".into());

    let response = initiate::handler(State(env.state.clone()), Json(req))
        .await
        .unwrap()
        .into_response();
    assert_eq!(response.status(), http::StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["alreadyExists"], json!(false));
    assert_eq!(body["objectKey"], json!(locator.object_key()));
    assert!(body["signedUploadUrl"]
        .as_str()
        .unwrap()
        .contains("putObject"));
}

#[tokio::test]
async fn test_initiate_handler_rejects_both_identities() {
    let env = testkit::setup().await;
    testkit::write_policy(&env.primary, testkit::OPEN_POLICY).await;
    let locator = testkit::content_for(b"both identities");

    let secret = SecretKey::generate();
    let payload = json!({
        "timestamp": 1,
        "size": 15,
        "hashAlg": "sha1",
        "hash": locator.hash.as_str(),
    });
    let mut req = envelope(payload.clone());
    req.node_id = Some(NodeId::from(&secret.public()));
    req.signature = Some(secret.sign_payload(&payload));
    req.user_id = Some("alice".into());
    req.access_token = Some("tok-alice".into());

    let result = initiate::handler(State(env.state.clone()), Json(req)).await;
    assert!(matches!(result, Err(initiate::InitiateError::Identity(_))));
}

#[tokio::test]
async fn test_finalize_handler_rejects_malformed_object_key() {
    let env = testkit::setup().await;
    testkit::write_policy(&env.primary, testkit::OPEN_POLICY).await;
    let locator = testkit::content_for(b"bad key");

    let mut req = envelope(json!({
        "timestamp": 1,
        "objectKey": "uploads/../escape",
        "hashAlg": "sha1",
        "hash": locator.hash.as_str(),
        "size": 7,
    }));
    req.user_id = Some("alice".into());
    req.access_token = Some("tok-alice".into());

    let result = finalize::handler(State(env.state.clone()), Json(req)).await;
    assert!(matches!(result, Err(finalize::FinalizeError::Validation(_))));
}

#[tokio::test]
async fn test_gateway_download_and_upload() {
    let env = testkit::setup().await;
    let data = b"direct bytes";
    let locator = testkit::content_for(data);
    let key = locator.object_key();

    // direct upload stores the object
    let response = gw::upload_handler(
        State(env.state.clone()),
        Path(key.clone()),
        bytes::Bytes::from_static(data),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), http::StatusCode::OK);
    assert!(env.primary.head(&key).await.unwrap().is_some());

    // a second upload refuses to overwrite
    let response = gw::upload_handler(
        State(env.state.clone()),
        Path(key.clone()),
        bytes::Bytes::from_static(b"corrupt replacement"),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), http::StatusCode::OK);
    assert_eq!(
        env.primary.head(&key).await.unwrap().unwrap().size,
        data.len() as u64
    );

    // download returns the original bytes
    let response = gw::download_handler(State(env.state.clone()), Path(key.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body.as_ref(), data);

    // non-canonical keys are rejected outright
    let result =
        gw::download_handler(State(env.state.clone()), Path("settings/authorization.yaml".into()))
            .await;
    assert!(matches!(result, Err(gw::GatewayError::InvalidKey(_))));
}
