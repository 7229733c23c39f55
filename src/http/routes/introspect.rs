// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! `/introspect` (RFC 7662): reports whether a token is active.

use std::sync::Arc;

use rocket::form::Form;
use rocket::post;
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;

use crate::authority::authenticator::resolve_group_id;
use crate::authority::AuthorityState;
use crate::http::error::OAuthError;
use crate::http::fairings::Preflight;
use crate::http::forms::IntrospectRequest;
use crate::http::guards::Identity;

#[derive(Serialize)]
pub struct IntrospectResponse {
    active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
}

impl IntrospectResponse {
    fn inactive() -> Self {
        Self {
            active: false,
            scope: None,
            client_id: None,
            username: None,
            token_type: None,
            exp: None,
            iat: None,
        }
    }

    fn active(token: &crate::authority::tokens::Token) -> Self {
        Self {
            active: !token.is_expired(),
            scope: Some(token.scopes.clone()),
            client_id: Some(token.application.clone().unwrap_or_default()),
            username: Some(token.user.clone()),
            token_type: Some(token.kind.as_str()),
            exp: Some(token.expires_at.timestamp()),
            iat: Some(token.created_at.timestamp()),
        }
    }
}

#[post("/introspect", data = "<form>")]
pub fn introspect(
    form: Form<IntrospectRequest>,
    identity: Identity,
    state: &State<Arc<AuthorityState>>,
    _preflight: Preflight,
) -> Result<Json<IntrospectResponse>, OAuthError> {
    if !identity.is_authenticated() {
        return Err(OAuthError::Unauthorized);
    }
    if let Some(group) = &state.config.introspect_group {
        let required_gid = resolve_group_id(group);
        let member = required_gid
            .map(|gid| identity.gid().contains(&gid))
            .unwrap_or(false);
        if !member {
            return Err(OAuthError::Forbidden);
        }
    }

    let token = match state.tokens.find(&form.token) {
        Some(token) => token,
        None => return Ok(Json(IntrospectResponse::inactive())),
    };

    Ok(Json(IntrospectResponse::active(&token)))
}
