// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Discovery metadata, JWKS, and the `userinfo` endpoint (§4.10).
//!
//! The discovery document and JWKS are precomputed once in
//! [`crate::authority::state::ServerIdentity`] at startup; these routes
//! just serve the cached strings with the right content type.

use std::sync::Arc;

use rocket::http::Status;
use rocket::{get, State};

use crate::authority::AuthorityState;
use crate::http::fairings::Preflight;
use crate::http::guards::Identity;

/// Raw JSON body with `Content-Type: text/json`, tolerant of
/// `application/json` on ingest per §6.
pub struct JsonDocument(String);

impl<'r> rocket::response::Responder<'r, 'static> for JsonDocument {
    fn respond_to(self, _request: &'r rocket::Request<'_>) -> rocket::response::Result<'static> {
        rocket::Response::build()
            .header(rocket::http::ContentType::new("text", "json"))
            .sized_body(self.0.len(), std::io::Cursor::new(self.0))
            .ok()
    }
}

#[get("/.well-known/oauth-authorization-server")]
pub fn oauth_authorization_server(state: &State<Arc<AuthorityState>>, _preflight: Preflight) -> JsonDocument {
    JsonDocument(state.identity.discovery_json.clone())
}

#[get("/.well-known/openid-configuration")]
pub fn openid_configuration(state: &State<Arc<AuthorityState>>, _preflight: Preflight) -> JsonDocument {
    JsonDocument(state.identity.discovery_json.clone())
}

#[get("/.well-known/jwks.json")]
pub fn jwks(state: &State<Arc<AuthorityState>>, _preflight: Preflight) -> JsonDocument {
    JsonDocument(state.identity.jwks_json.clone())
}

/// `userinfo_endpoint` is advertised (per §4.10's literal discovery
/// field list) but ID-Token issuance is out of scope for this core
/// (`SPEC_FULL.md` §9, Open Question 3), so it reports `501` rather than
/// silently returning claims with no signed ID token behind them.
#[get("/userinfo")]
pub fn userinfo(identity: Identity, _preflight: Preflight) -> Status {
    if identity.is_authenticated() {
        Status::NotImplemented
    } else {
        Status::Unauthorized
    }
}
