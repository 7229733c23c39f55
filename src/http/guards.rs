// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Authentication header processing: a Rocket request guard that
//! inspects the `Authorization` header on every request and attaches
//! whatever identity it can resolve, never failing the request itself
//! (endpoint handlers decide what identity they require).

use std::sync::Arc;

use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

use crate::authority::tokens::{Token, TokenKind};
use crate::authority::AuthorityState;

/// Resolved caller identity for the current request.
pub enum Identity {
    /// No `Authorization` header, or a scheme this server does not
    /// understand.
    None,
    /// `Basic <b64>` validated against the Authenticator.
    Basic { uid: u32, gid: Vec<u32> },
    /// `Bearer <id>` resolved to a live access token.
    Bearer(Token),
}

impl Identity {
    pub fn has_scope(&self, scope: &str) -> bool {
        match self {
            Identity::Bearer(token) => token.scope_set().contains(scope),
            _ => false,
        }
    }

    pub fn uid(&self) -> Option<u32> {
        match self {
            Identity::Basic { uid, .. } => Some(*uid),
            Identity::Bearer(token) => Some(token.uid),
            Identity::None => None,
        }
    }

    pub fn gid(&self) -> &[u32] {
        match self {
            Identity::Basic { gid, .. } => gid,
            Identity::Bearer(token) => &token.gid,
            Identity::None => &[],
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Identity::None)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Identity {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let header = match request.headers().get_one("Authorization") {
            Some(h) => h,
            None => return Outcome::Success(Identity::None),
        };

        let state = match request.guard::<&State<Arc<AuthorityState>>>().await {
            Outcome::Success(s) => s,
            _ => return Outcome::Success(Identity::None),
        };

        if let Some(encoded) = header.strip_prefix("Basic ") {
            if !state.config.basic_auth {
                return Outcome::Success(Identity::None);
            }
            let Ok(decoded) = BASE64_STANDARD.decode(encoded) else {
                return Outcome::Success(Identity::None);
            };
            let Ok(decoded) = String::from_utf8(decoded) else {
                return Outcome::Success(Identity::None);
            };
            let Some((user, pass)) = decoded.split_once(':') else {
                return Outcome::Success(Identity::None);
            };
            return match state.authenticator.authenticate(user, pass).await {
                Some(identity) => Outcome::Success(Identity::Basic {
                    uid: identity.uid,
                    gid: identity.gid,
                }),
                None => Outcome::Success(Identity::None),
            };
        }

        if let Some(id) = header.strip_prefix("Bearer ") {
            return match state.tokens.find(id) {
                Some(token) if token.kind == TokenKind::Access => Outcome::Success(Identity::Bearer(token)),
                _ => Outcome::Success(Identity::None),
            };
        }

        log::debug!("unsupported Authorization scheme");
        Outcome::Success(Identity::None)
    }
}
