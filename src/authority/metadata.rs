// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Metadata Builder (C8): the RFC 8414 / OpenID discovery JSON document.

use serde_json::json;

use super::resources::{Resource, ResourceScope};

/// Builds the discovery document served at both well-known paths.
///
/// `refresh_token` is deliberately absent from `grant_types_supported`:
/// this core does not implement the renewal exchange end to end, so
/// advertising it would be a lie.
pub fn build_discovery_json(issuer: &str, resources: &[Resource]) -> String {
    let mut scopes: Vec<&str> = vec!["openid", "public", "private", "shared"];
    for resource in resources {
        if let ResourceScope::Shared { group } = &resource.scope {
            scopes.push(group.as_str());
        }
    }
    scopes.sort_unstable();
    scopes.dedup();

    let doc = json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/authorize"),
        "token_endpoint": format!("{issuer}/token"),
        "userinfo_endpoint": format!("{issuer}/userinfo"),
        "jwks_uri": format!("{issuer}/.well-known/jwks.json"),
        "registration_endpoint": format!("{issuer}/register"),
        "introspection_endpoint": format!("{issuer}/introspect"),
        "scopes_supported": scopes,
        "response_types_supported": ["code", "id_token", "token"],
        "subject_types_supported": ["pairwise", "public"],
        "id_token_signing_alg_values_supported": ["RS256"],
        "claims_supported": ["email", "name", "phone_number", "preferred_username", "sub", "updated_at"],
        "token_endpoint_auth_methods_supported": ["none"],
        "grant_types_supported": ["authorization_code", "password"],
    });

    serde_json::to_string(&doc).expect("discovery document is always serializable")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_document_omits_refresh_token() {
        let doc = build_discovery_json("https://auth.example.com", &[]);
        assert!(!doc.contains("refresh_token"));
        assert!(doc.contains("authorization_code"));
    }
}
