// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Renders the minimal login form served by `/authorize` Phase 1.

use handlebars::Handlebars;
use serde_json::json;

use crate::http::forms::AuthorizeQuery;

/// Renders the login form, carrying forward every `/authorize` query
/// parameter as hidden fields so Phase 2 sees the same request.
pub fn login_page_html(query: &AuthorizeQuery, error_msg: Option<&str>) -> String {
    let mut handlebars = Handlebars::new();
    handlebars
        .register_template_string("login", include_str!("../../resources/forms/login.hbs"))
        .expect("login template is valid handlebars");

    let data = json!({
        "client_id": query.client_id,
        "redirect_uri": query.redirect_uri,
        "response_type": query.response_type,
        "state": query.state,
        "scope": query.scope,
        "code_challenge": query.code_challenge,
        "code_challenge_method": query.code_challenge_method,
        "error_msg": error_msg,
    });

    handlebars
        .render("login", &data)
        .expect("login template renders with well-formed data")
}
