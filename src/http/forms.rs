// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Form-encoded request shapes for `/authorize`, `/token`, and
//! `/introspect`.

use rocket::form::FromForm;

#[derive(Debug, FromForm)]
pub struct AuthorizeQuery {
    pub client_id: String,
    pub redirect_uri: Option<String>,
    pub response_type: String,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

#[derive(Debug, FromForm)]
pub struct AuthorizePost {
    pub client_id: String,
    pub redirect_uri: Option<String>,
    pub response_type: String,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub username: String,
    pub password: String,
}

impl AuthorizeQuery {
    pub fn effective_scope(&self) -> &str {
        self.scope.as_deref().unwrap_or("private shared")
    }
}

impl AuthorizePost {
    pub fn effective_scope(&self) -> &str {
        self.scope.as_deref().unwrap_or("private shared")
    }
}

#[derive(Debug, FromForm)]
pub struct TokenRequest {
    pub grant_type: String,
    pub client_id: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, FromForm)]
pub struct IntrospectRequest {
    pub token: String,
}
