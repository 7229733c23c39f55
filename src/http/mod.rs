// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! HTTP Request Pipeline (C9) and Endpoint Handlers (C10): Rocket route
//! functions, request guards, fairings, and the error taxonomy that maps
//! onto them.

pub mod error;
pub mod fairings;
pub mod forms;
pub mod guards;
pub mod routes;
pub mod templates;

use rocket::{Build, Rocket, routes};
use std::sync::Arc;

use crate::authority::AuthorityState;
use fairings::Cors;

/// Mounts every route under `/` and manages the shared [`AuthorityState`].
///
/// Grounded on the teacher's `visualization::server::builder::build_rocket`:
/// one function assembling a `Rocket<Build>` from a figment plus whatever
/// state the routes close over, left for the caller to `.ignite()`/`.launch()`.
pub fn build_rocket(figment: rocket::figment::Figment, state: Arc<AuthorityState>) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(Cors)
        .attach(rocket_async_compression::Compression::fairing())
        .manage(state)
        .mount(
            "/",
            routes![
                routes::authorize::authorize_form,
                routes::authorize::authorize_submit,
                routes::token::token,
                routes::introspect::introspect,
                routes::oidc::oauth_authorization_server,
                routes::oidc::openid_configuration,
                routes::oidc::jwks,
                routes::oidc::userinfo,
            ],
        )
        .mount(
            "/",
            routes![routes::resources::get_resource, routes::resources::head_resource],
        )
}
