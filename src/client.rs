// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Client Helper (C12): discovers an authorization server's endpoints and
//! drives the PKCE-protected Authorization Code flow by opening the
//! authorization URL in the user's browser.
//!
//! This is independent of the server state machine in [`crate::authority`]:
//! it only ever speaks HTTPS to whatever server a caller points it at, and
//! shares nothing but the random/hash primitives in [`crate::crypto`].

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::crypto::{pkce_challenge, random_vec};

/// The four endpoint URLs this crate needs from a discovery document.
/// Every field is validated to use `https` at discovery time.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveredEndpoints {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub jwks_uri: String,
}

const WELL_KNOWN_PATHS: &[&str] = &[
    "/.well-known/oauth-authorization-server",
    "/.well-known/openid-configuration",
];

/// `Connect(uri)`: opens HTTPS and resolves the discovery document.
///
/// When `uri`'s path is `/`, discovery is attempted in order at the two
/// well-known paths listed in §4.10, falling back to `uri`'s own path
/// (so a caller that already points at a discovery document directly
/// still works). Every discovered endpoint URL is required to use
/// `https`; otherwise the connection is refused.
pub async fn connect(uri: &str) -> Result<DiscoveredEndpoints> {
    let parsed = url::Url::parse(uri).with_context(|| format!("invalid server URL '{uri}'"))?;
    if parsed.scheme() != "https" {
        bail!("refusing to discover a non-https server URL '{uri}'");
    }

    let client = reqwest::Client::new();

    let candidates: Vec<String> = if parsed.path() == "/" || parsed.path().is_empty() {
        WELL_KNOWN_PATHS
            .iter()
            .map(|path| {
                let mut url = parsed.clone();
                url.set_path(path);
                url.to_string()
            })
            .collect()
    } else {
        vec![uri.to_string()]
    };

    let mut last_error = None;
    for candidate in candidates {
        match fetch_discovery_document(&client, &candidate).await {
            Ok(doc) => return validate_endpoints(doc),
            Err(err) => last_error = Some(err),
        }
    }
    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no discovery candidates for '{uri}'")))
}

async fn fetch_discovery_document(client: &reqwest::Client, url: &str) -> Result<Value> {
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await
        .with_context(|| format!("requesting discovery document at {url}"))?
        .error_for_status()
        .with_context(|| format!("discovery document at {url} returned an error status"))?;
    response
        .json::<Value>()
        .await
        .with_context(|| format!("discovery document at {url} is not valid JSON"))
}

fn validate_endpoints(doc: Value) -> Result<DiscoveredEndpoints> {
    let endpoints: DiscoveredEndpoints =
        serde_json::from_value(doc).context("discovery document is missing a required endpoint field")?;
    for (name, url) in [
        ("issuer", &endpoints.issuer),
        ("authorization_endpoint", &endpoints.authorization_endpoint),
        ("token_endpoint", &endpoints.token_endpoint),
        ("jwks_uri", &endpoints.jwks_uri),
    ] {
        if !url.starts_with("https://") {
            bail!("discovery document's {name} does not use https: {url}");
        }
    }
    Ok(endpoints)
}

/// Parameters for [`authorize_url`]. `code_verifier` is generated by the
/// caller (or by [`generate_code_verifier`]) and must be retained to
/// redeem the eventual grant code at the token endpoint.
pub struct AuthorizeRequest<'a> {
    pub client_id: &'a str,
    pub redirect_uri: &'a str,
    pub state: Option<&'a str>,
    pub code_verifier: Option<&'a str>,
    pub scope: Option<&'a str>,
}

/// Generates a PKCE code verifier: 32 random bytes, base64url-encoded,
/// matching RFC 7636's recommended high-entropy verifier shape.
pub fn generate_code_verifier() -> String {
    crate::crypto::b64url(&random_vec(32))
}

/// `Authorize(...)`: assembles the `/authorize` URL by form-encoding the
/// parameters. When `code_verifier` is provided, derives
/// `code_challenge = base64url(sha256(code_verifier))` and adds
/// `code_challenge` with `code_challenge_method=S256`.
pub fn authorize_url(endpoints: &DiscoveredEndpoints, request: &AuthorizeRequest<'_>) -> Result<String> {
    let mut url = url::Url::parse(&endpoints.authorization_endpoint)
        .context("authorization_endpoint is not a valid URL")?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("response_type", "code");
        pairs.append_pair("client_id", request.client_id);
        pairs.append_pair("redirect_uri", request.redirect_uri);
        if let Some(state) = request.state {
            pairs.append_pair("state", state);
        }
        if let Some(scope) = request.scope {
            pairs.append_pair("scope", scope);
        }
        if let Some(verifier) = request.code_verifier {
            pairs.append_pair("code_challenge", &pkce_challenge(verifier));
            pairs.append_pair("code_challenge_method", "S256");
        }
    }
    Ok(url.to_string())
}

/// Opens `url` in the host platform's default browser, delegating to
/// [`webbrowser`] (the `xdg-open`-equivalent on each platform). Returns
/// `Ok(())` iff the platform handler reports success.
pub fn open_authorize_url(url: &str) -> Result<()> {
    if webbrowser::open(url).is_ok() {
        Ok(())
    } else {
        bail!("failed to open the authorization URL in a browser: {url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_includes_pkce_challenge_for_reference_verifier() {
        let endpoints = DiscoveredEndpoints {
            issuer: "https://auth.example.com".into(),
            authorization_endpoint: "https://auth.example.com/authorize".into(),
            token_endpoint: "https://auth.example.com/token".into(),
            jwks_uri: "https://auth.example.com/.well-known/jwks.json".into(),
        };
        let request = AuthorizeRequest {
            client_id: "app1",
            redirect_uri: "https://app/cb",
            state: Some("xyz"),
            code_verifier: Some("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            scope: None,
        };
        let url = authorize_url(&endpoints, &request).unwrap();
        assert!(url.contains("code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("state=xyz"));
    }

    #[test]
    fn authorize_url_omits_pkce_fields_without_a_verifier() {
        let endpoints = DiscoveredEndpoints {
            issuer: "https://auth.example.com".into(),
            authorization_endpoint: "https://auth.example.com/authorize".into(),
            token_endpoint: "https://auth.example.com/token".into(),
            jwks_uri: "https://auth.example.com/.well-known/jwks.json".into(),
        };
        let request = AuthorizeRequest {
            client_id: "app1",
            redirect_uri: "https://app/cb",
            state: None,
            code_verifier: None,
            scope: Some("private"),
        };
        let url = authorize_url(&endpoints, &request).unwrap();
        assert!(!url.contains("code_challenge"));
        assert!(url.contains("scope=private"));
    }

    #[test]
    fn validate_endpoints_rejects_non_https() {
        let doc = serde_json::json!({
            "issuer": "http://auth.example.com",
            "authorization_endpoint": "http://auth.example.com/authorize",
            "token_endpoint": "https://auth.example.com/token",
            "jwks_uri": "https://auth.example.com/.well-known/jwks.json",
        });
        assert!(validate_endpoints(doc).is_err());
    }

    #[test]
    fn generated_code_verifiers_are_high_entropy_and_unique() {
        let a = generate_code_verifier();
        let b = generate_code_verifier();
        assert_ne!(a, b);
        assert!(a.len() >= 43);
    }

    /// `fetch_discovery_document`/`validate_endpoints` don't care what
    /// transport served the JSON, only what its endpoint fields say; a
    /// plain-http mock is enough to exercise the parsing and the https-only
    /// validation that `connect` applies afterward.
    #[tokio::test]
    async fn fetch_and_validate_a_mocked_discovery_document() {
        let server = wiremock::MockServer::start().await;
        let body = serde_json::json!({
            "issuer": "https://auth.example.com",
            "authorization_endpoint": "https://auth.example.com/authorize",
            "token_endpoint": "https://auth.example.com/token",
            "jwks_uri": "https://auth.example.com/.well-known/jwks.json",
        });
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/.well-known/oauth-authorization-server"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/.well-known/oauth-authorization-server", server.uri());
        let doc = fetch_discovery_document(&client, &url).await.unwrap();
        let endpoints = validate_endpoints(doc).unwrap();
        assert_eq!(endpoints.token_endpoint, "https://auth.example.com/token");
    }

    #[tokio::test]
    async fn fetch_discovery_document_surfaces_a_404() {
        let server = wiremock::MockServer::start().await;
        let client = reqwest::Client::new();
        let url = format!("{}/.well-known/oauth-authorization-server", server.uri());
        assert!(fetch_discovery_document(&client, &url).await.is_err());
    }
}
