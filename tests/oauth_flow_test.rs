// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! End-to-end exercises of the authorization-server endpoints, one test per
//! concrete scenario in `spec.md` §8: happy-path Authorization Code + PKCE,
//! PKCE mismatch, expired grant, password grant, introspection rights, and
//! resource scope enforcement.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use rauthd::authority::AuthorityState;
use rauthd::config::resources::{ResourceDirective, Visibility};
use rauthd::config::{Application, Config, ServerNameDirective};
use rauthd::http::build_rocket;
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::Value;

const HOST: &str = "auth.example.com";
const PORT: u16 = 9443;
const REDIRECT_URI: &str = "https://app/cb";
const CODE_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
const CODE_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

fn qs(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn base_config(key_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.server_name = ServerNameDirective {
        host: HOST.to_string(),
        port: Some(PORT),
    };
    config.test_password = Some("hunter2".to_string());
    config.applications.push(Application::new("app1", REDIRECT_URI));
    config.key_file = key_dir.join("rauthd.key");
    config
}

async fn test_client(config: Config) -> Client {
    let state = AuthorityState::bootstrap(config).expect("state bootstraps");
    let figment = rocket::Config::figment()
        .merge(("port", 0))
        .merge(("address", "127.0.0.1"))
        .merge(("shutdown.ctrlc", false));
    let rocket = build_rocket(figment, Arc::clone(&state));
    Client::tracked(rocket).await.expect("valid rocket instance")
}

fn host_header() -> Header<'static> {
    Header::new("Host", format!("{HOST}:{PORT}"))
}

fn basic_auth_header(username: &str, password: &str) -> Header<'static> {
    let encoded = BASE64_STANDARD.encode(format!("{username}:{password}"));
    Header::new("Authorization", format!("Basic {encoded}"))
}

fn extract_code(location: &str) -> String {
    let query = location.split_once('?').expect("redirect carries a query string").1;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("code="))
        .expect("redirect carries a code parameter")
        .to_string()
}

/// Drives `/authorize` GET+POST to completion, returning the grant code.
async fn obtain_grant_code(client: &Client, code_challenge: Option<&str>) -> String {
    let mut query = format!(
        "client_id=app1&redirect_uri={}&response_type=code&state=xyz",
        qs(REDIRECT_URI)
    );
    let mut post_body = query.clone();
    if let Some(challenge) = code_challenge {
        query.push_str(&format!("&code_challenge={challenge}&code_challenge_method=S256"));
        post_body.push_str(&format!("&code_challenge={challenge}&code_challenge_method=S256"));
    }
    post_body.push_str("&username=alice&password=hunter2");

    let form_response = client.get(format!("/authorize?{query}")).header(host_header()).dispatch().await;
    assert_eq!(form_response.status(), Status::Ok);

    let redirect_response = client
        .post("/authorize")
        .header(ContentType::Form)
        .header(host_header())
        .body(post_body)
        .dispatch()
        .await;
    assert_eq!(redirect_response.status(), Status::Found);
    let location = redirect_response.headers().get_one("Location").unwrap().to_string();
    assert!(location.starts_with(REDIRECT_URI));
    assert!(location.contains("state=xyz"));
    extract_code(&location)
}

async fn password_grant_access_token(client: &Client, username: &str, password: &str, scope: Option<&str>) -> Option<String> {
    let mut body = format!("grant_type=password&username={username}&password={password}");
    if let Some(scope) = scope {
        body.push_str(&format!("&scope={}", qs(scope)));
    }
    let response = client.post("/token").header(ContentType::Form).header(host_header()).body(body).dispatch().await;
    if response.status() != Status::Ok {
        return None;
    }
    let json: Value = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
    Some(json["access_token"].as_str().unwrap().to_string())
}

#[rocket::async_test]
async fn happy_path_authorization_code_with_pkce() {
    let dir = tempfile::tempdir().unwrap();
    let client = test_client(base_config(dir.path())).await;

    let code = obtain_grant_code(&client, Some(CODE_CHALLENGE)).await;

    let token_body = format!("grant_type=authorization_code&client_id=app1&code={code}&code_verifier={CODE_VERIFIER}");
    let token_response = client.post("/token").header(ContentType::Form).header(host_header()).body(token_body).dispatch().await;
    assert_eq!(token_response.status(), Status::Ok);
    let json: Value = serde_json::from_str(&token_response.into_string().await.unwrap()).unwrap();
    assert_eq!(json["token_type"], "access");
    assert_eq!(json["expires_in"], 604_800);
    assert!(!json["access_token"].as_str().unwrap().is_empty());
}

#[rocket::async_test]
async fn pkce_mismatch_is_rejected_and_consumes_the_grant() {
    let dir = tempfile::tempdir().unwrap();
    let client = test_client(base_config(dir.path())).await;

    let code = obtain_grant_code(&client, Some(CODE_CHALLENGE)).await;

    let wrong_body = format!("grant_type=authorization_code&client_id=app1&code={code}&code_verifier=wrong-verifier-entirely");
    let wrong_response = client.post("/token").header(ContentType::Form).header(host_header()).body(wrong_body).dispatch().await;
    assert_eq!(wrong_response.status(), Status::BadRequest);

    // The grant was consumed by the failed attempt; even the correct verifier can't redeem it now.
    let retry_body = format!("grant_type=authorization_code&client_id=app1&code={code}&code_verifier={CODE_VERIFIER}");
    let retry_response = client.post("/token").header(ContentType::Form).header(host_header()).body(retry_body).dispatch().await;
    assert_eq!(retry_response.status(), Status::BadRequest);
}

#[rocket::async_test]
async fn expired_grant_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.max_grant_life = -1;
    let client = test_client(config).await;

    let code = obtain_grant_code(&client, None).await;

    let body = format!("grant_type=authorization_code&client_id=app1&code={code}");
    let response = client.post("/token").header(ContentType::Form).header(host_header()).body(body).dispatch().await;
    assert_eq!(response.status(), Status::BadRequest);
}

#[rocket::async_test]
async fn password_grant_succeeds_with_valid_credentials_and_fails_otherwise() {
    let dir = tempfile::tempdir().unwrap();
    let client = test_client(base_config(dir.path())).await;

    let token = password_grant_access_token(&client, "bob", "hunter2", None).await;
    assert!(token.is_some());

    let token = password_grant_access_token(&client, "bob", "wrong-password", None).await;
    assert!(token.is_none());
}

#[rocket::async_test]
async fn introspect_enforces_the_configured_group() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.basic_auth = true;
    config.introspect_group = Some("2000".to_string());
    let client = test_client(config).await;

    let access_token = password_grant_access_token(&client, "alice", "hunter2", None).await.unwrap();

    let forbidden = client
        .post("/introspect")
        .header(ContentType::Form)
        .header(host_header())
        .header(basic_auth_header("alice", "hunter2"))
        .body(format!("token={access_token}"))
        .dispatch()
        .await;
    assert_eq!(forbidden.status(), Status::Forbidden);
}

#[rocket::async_test]
async fn introspect_reports_active_for_an_authorized_caller() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.basic_auth = true;
    config.introspect_group = Some("1000".to_string());
    let client = test_client(config).await;

    let access_token = password_grant_access_token(&client, "alice", "hunter2", None).await.unwrap();

    let response = client
        .post("/introspect")
        .header(ContentType::Form)
        .header(host_header())
        .header(basic_auth_header("alice", "hunter2"))
        .body(format!("token={access_token}"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let json: Value = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
    assert_eq!(json["active"], true);
    assert_eq!(json["token_type"], "access");
}

#[rocket::async_test]
async fn resource_scope_enforcement() {
    let dir = tempfile::tempdir().unwrap();
    let resource_path = dir.path().join("p_resource.txt");
    std::fs::write(&resource_path, "secret-data").unwrap();

    let mut config = base_config(dir.path());
    config.resources.push(ResourceDirective {
        visibility: Visibility::Private,
        remote_path: "/p".to_string(),
        local_path: resource_path.to_string_lossy().into_owned(),
        group: None,
    });
    let client = test_client(config).await;

    let unauthenticated = client.get("/p").header(host_header()).dispatch().await;
    assert_eq!(unauthenticated.status(), Status::Unauthorized);

    let public_scope_token = password_grant_access_token(&client, "alice", "hunter2", Some("public")).await.unwrap();
    let forbidden = client
        .get("/p")
        .header(host_header())
        .header(Header::new("Authorization", format!("Bearer {public_scope_token}")))
        .dispatch()
        .await;
    assert_eq!(forbidden.status(), Status::Forbidden);

    let private_scope_token = password_grant_access_token(&client, "alice", "hunter2", Some("private")).await.unwrap();
    let allowed = client
        .get("/p")
        .header(host_header())
        .header(Header::new("Authorization", format!("Bearer {private_scope_token}")))
        .dispatch()
        .await;
    assert_eq!(allowed.status(), Status::Ok);
    assert_eq!(allowed.into_string().await.unwrap(), "secret-data");
}

#[rocket::async_test]
async fn mismatched_host_header_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let client = test_client(base_config(dir.path())).await;

    let response = client
        .get("/.well-known/openid-configuration")
        .header(Header::new("Host", "not-the-configured-host.example.com"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
}

#[rocket::async_test]
async fn discovery_document_and_jwks_are_served() {
    let dir = tempfile::tempdir().unwrap();
    let client = test_client(base_config(dir.path())).await;

    let discovery = client.get("/.well-known/oauth-authorization-server").header(host_header()).dispatch().await;
    assert_eq!(discovery.status(), Status::Ok);
    let doc: Value = serde_json::from_str(&discovery.into_string().await.unwrap()).unwrap();
    assert_eq!(doc["issuer"], format!("https://{HOST}:{PORT}"));
    assert!(doc["grant_types_supported"].as_array().unwrap().iter().all(|g| g != "refresh_token"));

    let jwks = client.get("/.well-known/jwks.json").header(host_header()).dispatch().await;
    assert_eq!(jwks.status(), Status::Ok);
    let jwks_doc: Value = serde_json::from_str(&jwks.into_string().await.unwrap()).unwrap();
    assert_eq!(jwks_doc["keys"][0]["kty"], "RSA");
}
