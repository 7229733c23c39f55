// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Server identity and the top-level [`AuthorityState`] that owns the
//! three shared registries plus the immutable, startup-computed identity.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::crypto::random_vec;

use super::applications::ApplicationRegistry;
use super::authenticator::{Authenticator, SystemAuthenticator, TestPasswordAuthenticator};
use super::keys::JwtKeyManager;
use super::metadata::build_discovery_json;
use super::resources::{Resource, ResourceRegistry};
use super::tokens::TokenStore;

/// Everything computed once at startup and never mutated again: the
/// discovery JSON string, the JWKS string, and the process-random secret
/// used as salting input for token id generation are all immutable after
/// startup, so no lock guards them.
pub struct ServerIdentity {
    pub name: String,
    pub port: u16,
    pub started_at: DateTime<Utc>,
    pub keys: JwtKeyManager,
    pub discovery_json: String,
    pub jwks_json: String,
    pub secret: Vec<u8>,
}

/// Owns the application, token, and resource collections exclusively.
/// Handed to Rocket as `State<Arc<AuthorityState>>`.
pub struct AuthorityState {
    pub identity: ServerIdentity,
    pub applications: ApplicationRegistry,
    pub tokens: Arc<TokenStore>,
    pub resources: ResourceRegistry,
    pub authenticator: Box<dyn Authenticator>,
    pub config: Config,
}

impl AuthorityState {
    pub fn bootstrap(config: Config) -> Result<Arc<Self>> {
        let keys = JwtKeyManager::load_or_generate(&config.key_file)?;
        let secret = random_vec(32);

        let port = config.effective_port();
        let issuer = format!("https://{}:{}", config.server_name.host, port);

        let resources: Vec<Resource> = config
            .resources
            .iter()
            .cloned()
            .map(Resource::from)
            .collect();
        let jwks_json = keys.jwks_json()?;
        let discovery_json = build_discovery_json(&issuer, &resources);

        let identity = ServerIdentity {
            name: config.server_name.host.clone(),
            port,
            started_at: Utc::now(),
            keys,
            discovery_json,
            jwks_json,
            secret,
        };

        let authenticator: Box<dyn Authenticator> = match &config.test_password {
            Some(password) => Box::new(TestPasswordAuthenticator::new(password.clone())),
            None => Box::new(SystemAuthenticator),
        };

        let tokens = Arc::new(TokenStore::new(
            identity.secret.clone(),
            config.max_grant_life,
            config.max_token_life,
        ));

        Ok(Arc::new(Self {
            applications: ApplicationRegistry::new(config.applications.clone()),
            resources: ResourceRegistry::new(resources),
            tokens,
            authenticator,
            identity,
            config,
        }))
    }

    pub fn issuer(&self) -> String {
        format!("https://{}:{}", self.identity.name, self.identity.port)
    }
}
