// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # rauthd
//!
//! A self-contained OAuth 2.0 Authorization Server combined with an
//! OpenID Connect 1.0 Provider, plus a companion client-side helper
//! library that drives the PKCE-protected Authorization Code flow.
//!
//! ## Main Components
//!
//! - **authority**: the authorization-server state machine — application
//!   registry, token lifecycle, resource registry, JWT key management,
//!   discovery metadata, and the Authenticator capability.
//! - **config**: the typed configuration tree and its directive-grammar
//!   loader.
//! - **crypto**: random and hash primitives shared by the token store,
//!   the PKCE verifier, and the JWK thumbprint calculation.
//! - **http**: the Rocket request pipeline — route handlers, request
//!   guards, fairings, and the error taxonomy.
//! - **client**: the client-side helper that discovers an authorization
//!   server's endpoints and opens the authorization URL.
//! - **utility**: TLS certificate helpers used when no certificate is
//!   configured.
//!
//! ## Binaries
//!
//! - **rauthd**: the authorization server daemon.
//! - **rs256keygen**: standalone RS256 key pair generator.
//! - **oauth-client**: CLI front-end for the client helper.

/// The authorization-server state machine: application registry, token
/// lifecycle, resource registry, JWT key management, discovery metadata,
/// and the Authenticator capability.
pub mod authority;

/// Client Helper (C12): discovers an authorization server's endpoints
/// and assembles the PKCE-protected authorization URL.
pub mod client;

/// Server configuration: the typed `Config` tree, its directive-grammar
/// loader, and validation rules.
pub mod config;

/// Random and hash primitives shared across the crate.
pub mod crypto;

/// HTTP Request Pipeline and Endpoint Handlers: Rocket routes, guards,
/// fairings, and the error taxonomy.
pub mod http;

/// Utility functions and helper tools, notably TLS certificate
/// generation for the bootstrap case with no configured certificate.
pub mod utility;
