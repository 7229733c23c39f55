// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! `/token`: exchanges a grant code (with PKCE) or resource-owner
//! credentials for an access token.

use std::sync::Arc;

use rocket::form::Form;
use rocket::post;
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;

use crate::authority::tokens::{NewToken, TokenKind};
use crate::authority::AuthorityState;
use crate::crypto::pkce_challenge;
use crate::http::error::OAuthError;
use crate::http::fairings::Preflight;
use crate::http::forms::TokenRequest;

#[derive(Serialize)]
pub struct TokenResponse {
    access_token: String,
    token_type: &'static str,
    expires_in: i64,
}

#[post("/token", data = "<form>")]
pub async fn token(
    form: Form<TokenRequest>,
    state: &State<Arc<AuthorityState>>,
    _preflight: Preflight,
) -> Result<Json<TokenResponse>, OAuthError> {
    let form = form.into_inner();
    match form.grant_type.as_str() {
        "authorization_code" => authorization_code_grant(&form, state).await,
        "password" => password_grant(&form, state).await,
        _ => Err(OAuthError::BadRequest),
    }
}

async fn authorization_code_grant(
    form: &TokenRequest,
    state: &AuthorityState,
) -> Result<Json<TokenResponse>, OAuthError> {
    let client_id = form.client_id.as_deref().ok_or(OAuthError::BadRequest)?;
    let code = form.code.as_deref().ok_or(OAuthError::BadRequest)?;

    let app = state
        .applications
        .find(client_id, form.redirect_uri.as_deref())
        .ok_or(OAuthError::BadRequest)?;

    let grant = state
        .tokens
        .take_if(code, |token| {
            token.kind == TokenKind::Grant && token.application.as_deref() == Some(app.client_id.as_str())
        })
        .ok_or(OAuthError::BadRequest)?;

    if let Some(challenge) = &grant.challenge {
        let verifier = form.code_verifier.as_deref().ok_or(OAuthError::BadRequest)?;
        if &pkce_challenge(verifier) != challenge {
            return Err(OAuthError::BadRequest);
        }
    }

    let access = state.tokens.create(NewToken {
        kind: TokenKind::Access,
        application: Some(app.client_id.as_str()),
        user: &grant.user,
        uid: grant.uid,
        gid: grant.gid,
        scopes: &grant.scopes,
        challenge: None,
    });

    Ok(Json(TokenResponse {
        access_token: access.id,
        token_type: "access",
        expires_in: state.config.max_token_life,
    }))
}

async fn password_grant(
    form: &TokenRequest,
    state: &AuthorityState,
) -> Result<Json<TokenResponse>, OAuthError> {
    let username = form.username.as_deref().ok_or(OAuthError::BadRequest)?;
    let password = form.password.as_deref().ok_or(OAuthError::BadRequest)?;

    let identity = state
        .authenticator
        .authenticate(username, password)
        .await
        .ok_or(OAuthError::BadRequest)?;

    let scope = form.scope.as_deref().unwrap_or("private shared");
    let access = state.tokens.create(NewToken {
        kind: TokenKind::Access,
        application: None,
        user: username,
        uid: identity.uid,
        gid: identity.gid,
        scopes: scope,
        challenge: None,
    });

    Ok(Json(TokenResponse {
        access_token: access.id,
        token_type: "access",
        expires_in: state.config.max_token_life,
    }))
}
