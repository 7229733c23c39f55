// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Registered OAuth2 client (Application) data model.

use serde::{Deserialize, Serialize};

/// A client registered to use the authorization code flow.
///
/// The pair (`client_id`, `redirect_uri`) uniquely identifies an entry.
/// Lookup by `client_id` alone returns the first matching entry in
/// insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Application {
    /// Unique, non-empty opaque identifier for the client.
    pub client_id: String,
    /// Absolute URI the client is allowed to be redirected back to.
    pub redirect_uri: String,
    /// Human-readable name shown on the consent/login form.
    pub client_name: Option<String>,
    pub client_uri: Option<String>,
    pub logo_uri: Option<String>,
    pub tos_uri: Option<String>,
}

impl Application {
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            client_name: None,
            client_uri: None,
            logo_uri: None,
            tos_uri: None,
        }
    }
}
