// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! `/authorize`: the two-phase login form + redirect endpoint.

use std::sync::Arc;

use rocket::form::Form;
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use rocket::response::content::RawHtml;
use rocket::{get, post, State};

use crate::authority::applications::ApplicationRegistry;
use crate::authority::tokens::{NewToken, TokenKind};
use crate::authority::AuthorityState;
use crate::http::error::OAuthError;
use crate::http::fairings::Preflight;
use crate::http::forms::{AuthorizePost, AuthorizeQuery};
use crate::http::templates::login_page_html;

struct FoundRedirect(String);

impl<'r> Responder<'r, 'static> for FoundRedirect {
    fn respond_to(self, _request: &'r Request<'_>) -> response::Result<'static> {
        Response::build()
            .status(Status::Found)
            .raw_header("Location", self.0)
            .ok()
    }
}

fn append_query(redirect_uri: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = redirect_uri.to_string();
    let mut separator = if redirect_uri.contains('?') { '&' } else { '?' };
    for (key, value) in pairs {
        out.push(separator);
        out.push_str(key);
        out.push('=');
        out.push_str(&urlencoding_escape(value));
        separator = '&';
    }
    out
}

fn urlencoding_escape(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn rejects_openid(scope: &str) -> bool {
    scope.split_whitespace().any(|s| s == "openid")
}

fn resolve_application(
    applications: &ApplicationRegistry,
    client_id: &str,
    redirect_uri: Option<&str>,
    response_type: &str,
    code_challenge_method: Option<&str>,
) -> Result<crate::config::Application, OAuthError> {
    if client_id.is_empty() || response_type != "code" {
        return Err(OAuthError::BadRequest);
    }
    if let Some(method) = code_challenge_method {
        if method != "S256" {
            return Err(OAuthError::BadRequest);
        }
    }
    applications
        .find(client_id, redirect_uri)
        .ok_or(OAuthError::BadRequest)
}

/// Phase 1: renders the login form, carrying forward every parameter.
#[get("/authorize?<query..>")]
pub fn authorize_form(
    query: AuthorizeQuery,
    state: &State<Arc<AuthorityState>>,
    _preflight: Preflight,
) -> Result<RawHtml<String>, OAuthError> {
    resolve_application(
        &state.applications,
        &query.client_id,
        query.redirect_uri.as_deref(),
        &query.response_type,
        query.code_challenge_method.as_deref(),
    )?;
    if rejects_openid(query.effective_scope()) {
        return Err(OAuthError::BadRequest);
    }
    Ok(RawHtml(login_page_html(&query, None)))
}

/// Phase 2: authenticates the submitted credentials and mints a grant
/// token, redirecting back to the client's `redirect_uri`.
#[post("/authorize", data = "<form>")]
pub async fn authorize_submit(
    form: Form<AuthorizePost>,
    state: &State<Arc<AuthorityState>>,
    _preflight: Preflight,
) -> Result<FoundRedirect, OAuthError> {
    let form = form.into_inner();
    let app = resolve_application(
        &state.applications,
        &form.client_id,
        form.redirect_uri.as_deref(),
        &form.response_type,
        form.code_challenge_method.as_deref(),
    )?;

    let scope = form.effective_scope().to_string();
    if rejects_openid(&scope) {
        return Err(OAuthError::authorize_redirect(
            app.redirect_uri.clone(),
            "invalid_scope",
            form.state.clone(),
        ));
    }

    let identity = match state.authenticator.authenticate(&form.username, &form.password).await {
        Some(identity) => identity,
        None => {
            return Err(OAuthError::authorize_redirect(
                app.redirect_uri.clone(),
                "access_denied",
                form.state.clone(),
            ))
        }
    };

    let grant = state.tokens.create(NewToken {
        kind: TokenKind::Grant,
        application: Some(app.client_id.as_str()),
        user: &form.username,
        uid: identity.uid,
        gid: identity.gid,
        scopes: &scope,
        challenge: form.code_challenge.as_deref(),
    });

    let mut pairs = vec![("code", grant.id.as_str())];
    if let Some(state_param) = form.state.as_deref() {
        pairs.push(("state", state_param));
    }
    Ok(FoundRedirect(append_query(&app.redirect_uri, &pairs)))
}
