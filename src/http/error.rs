// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! The error taxonomy, mapped onto Rocket responses. User-visible
//! bodies are intentionally empty: details live only in the server
//! log, never in the response.

use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder, Response};

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Class 1: malformed request line, bad Host, path traversal, missing
    /// required parameter.
    #[error("bad request")]
    BadRequest,

    /// Class 2: missing/invalid Basic or Bearer, unknown scheme, expired
    /// token.
    #[error("unauthorized")]
    Unauthorized,

    /// Class 3: valid identity, insufficient scope or group membership.
    #[error("forbidden")]
    Forbidden,

    /// Class 4: no matching resource, unknown endpoint path.
    #[error("not found")]
    NotFound,

    /// Class 5: `/authorize` POST domain errors, redirected back to the
    /// registered `redirect_uri` per RFC 6749 §4.1.2.1.
    #[error("authorize redirect: {error}")]
    AuthorizeRedirect {
        redirect_uri: String,
        error: &'static str,
        state: Option<String>,
    },

    /// Class 6: server-internal errors. Logged at `error` level; the
    /// connection is terminated with a generic response.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl OAuthError {
    pub fn authorize_redirect(
        redirect_uri: impl Into<String>,
        error: &'static str,
        state: Option<String>,
    ) -> Self {
        OAuthError::AuthorizeRedirect {
            redirect_uri: redirect_uri.into(),
            error,
            state,
        }
    }
}

impl<'r> Responder<'r, 'static> for OAuthError {
    fn respond_to(self, _request: &'r Request<'_>) -> response::Result<'static> {
        match self {
            OAuthError::BadRequest => Response::build().status(Status::BadRequest).ok(),
            OAuthError::Unauthorized => Response::build().status(Status::Unauthorized).ok(),
            OAuthError::Forbidden => Response::build().status(Status::Forbidden).ok(),
            OAuthError::NotFound => Response::build().status(Status::NotFound).ok(),
            OAuthError::AuthorizeRedirect {
                redirect_uri,
                error,
                state,
            } => {
                let separator = if redirect_uri.contains('?') { '&' } else { '?' };
                let mut location = format!("{redirect_uri}{separator}error={error}");
                if let Some(state) = state {
                    location.push_str("&state=");
                    location.push_str(&url::form_urlencoded::byte_serialize(state.as_bytes()).collect::<String>());
                }
                Response::build()
                    .status(Status::Found)
                    .raw_header("Location", location)
                    .ok()
            }
            OAuthError::Internal(err) => {
                log::error!("internal error: {err:#}");
                Response::build().status(Status::InternalServerError).ok()
            }
        }
    }
}
