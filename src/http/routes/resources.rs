// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! GET/HEAD resource access, scope- and group-gated per the resource's
//! registered visibility.

use std::fs;
use std::sync::Arc;

use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use rocket::{get, head, State};

use crate::authority::authenticator::resolve_group_id;
use crate::authority::resources::ResourceScope;
use crate::authority::AuthorityState;
use crate::http::error::OAuthError;
use crate::http::fairings::Preflight;
use crate::http::guards::Identity;

pub struct ResourceBody {
    bytes: Vec<u8>,
    content_type: ContentType,
}

impl<'r> Responder<'r, 'static> for ResourceBody {
    fn respond_to(self, _request: &'r Request<'_>) -> response::Result<'static> {
        Response::build()
            .header(self.content_type)
            .sized_body(self.bytes.len(), std::io::Cursor::new(self.bytes))
            .ok()
    }
}

fn authorize_access(
    scope: &ResourceScope,
    identity: &Identity,
) -> Result<(), OAuthError> {
    match scope {
        ResourceScope::Public => Ok(()),
        ResourceScope::Private => {
            if identity.has_scope("private") {
                Ok(())
            } else if matches!(identity, Identity::None) {
                Err(OAuthError::Unauthorized)
            } else {
                Err(OAuthError::Forbidden)
            }
        }
        ResourceScope::Shared { group } => {
            if !identity.has_scope("shared") {
                return if matches!(identity, Identity::None) {
                    Err(OAuthError::Unauthorized)
                } else {
                    Err(OAuthError::Forbidden)
                };
            }
            let member = resolve_group_id(group)
                .map(|gid| identity.gid().contains(&gid))
                .unwrap_or(false);
            if member {
                Ok(())
            } else {
                Err(OAuthError::Forbidden)
            }
        }
    }
}

fn serve(
    path: &str,
    state: &AuthorityState,
    identity: &Identity,
) -> Result<ResourceBody, OAuthError> {
    let user = match identity {
        Identity::Bearer(token) => Some(token.user.as_str()),
        Identity::Basic { .. } => None,
        Identity::None => None,
    };
    let found = state.resources.find(path, user).ok_or(OAuthError::NotFound)?;

    authorize_access(&found.resource.scope, identity)?;

    let local_path = found.resolved_local_path.ok_or(OAuthError::NotFound)?;
    if found.file_info.is_none() {
        return Err(OAuthError::NotFound);
    }
    let bytes = fs::read(&local_path).map_err(|e| OAuthError::Internal(e.into()))?;
    let content_type = found
        .resource
        .content_type
        .as_deref()
        .and_then(ContentType::parse_flexible)
        .or_else(|| local_path.extension().and_then(|e| e.to_str()).and_then(ContentType::from_extension))
        .unwrap_or(ContentType::Binary);

    Ok(ResourceBody { bytes, content_type })
}

#[get("/<path..>", rank = 10)]
pub fn get_resource(
    path: std::path::PathBuf,
    identity: Identity,
    state: &State<Arc<AuthorityState>>,
    _preflight: Preflight,
) -> Result<ResourceBody, OAuthError> {
    serve(&format!("/{}", path.display()), state, &identity)
}

#[head("/<path..>", rank = 10)]
pub fn head_resource(
    path: std::path::PathBuf,
    identity: Identity,
    state: &State<Arc<AuthorityState>>,
    _preflight: Preflight,
) -> Result<Status, OAuthError> {
    serve(&format!("/{}", path.display()), state, &identity).map(|_| Status::Ok)
}
