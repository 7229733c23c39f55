// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Request preflight validation and CORS headers.
//!
//! `Preflight` is a request guard rather than a fairing: Rocket fairings
//! of `Kind::Request` can only mutate the request, not short-circuit it
//! with a status code, so rejecting a malformed request line needs a
//! guard a route can depend on. `Cors` stays a response fairing, the way
//! the teacher's CORS support worked.

use std::sync::Arc;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::{Response, State};

use crate::authority::AuthorityState;

/// Validates the parts of an incoming request that every route cares
/// about: Host header, absolute-form request targets, and path
/// traversal. Include this as a route parameter (`_preflight: Preflight`)
/// to enforce it before the handler body runs.
pub struct Preflight;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Preflight {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        if let Some(expect) = request.headers().get_one("Expect") {
            if !expect.eq_ignore_ascii_case("100-continue") {
                return Outcome::Error((Status::ExpectationFailed, ()));
            }
        }

        let raw_path = request.uri().path().as_str();
        if raw_path.starts_with("http://") || raw_path.starts_with("https://") {
            // absolute-form target slipped through; origin-form is all we accept
            return Outcome::Error((Status::BadRequest, ()));
        }
        if raw_path.split('/').any(|segment| segment == "..") {
            return Outcome::Error((Status::BadRequest, ()));
        }

        let Some(state) = (match request.guard::<&State<Arc<AuthorityState>>>().await {
            Outcome::Success(s) => Some(s),
            _ => None,
        }) else {
            return Outcome::Success(Preflight);
        };

        let Some(host) = request.host() else {
            return Outcome::Error((Status::BadRequest, ()));
        };
        let host_domain = host.domain().as_str().trim_end_matches('.');
        let expected_domain = state.identity.name.trim_end_matches('.');
        if !host_domain.eq_ignore_ascii_case(expected_domain) {
            return Outcome::Error((Status::BadRequest, ()));
        }
        let expected_port = state.identity.port;
        if let Some(port) = host.port() {
            if port != expected_port {
                return Outcome::Error((Status::BadRequest, ()));
            }
        }

        Outcome::Success(Preflight)
    }
}

/// Adds permissive CORS headers to every response, the way the teacher's
/// visualization server did for its browser-facing endpoints.
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}
