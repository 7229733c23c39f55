// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! The authorization-server state machine: application registry, token
//! lifecycle, resource registry, JWT key management, discovery metadata,
//! and the Authenticator capability.

pub mod applications;
pub mod authenticator;
pub mod keys;
pub mod metadata;
pub mod resources;
pub mod state;
pub mod tokens;

pub use state::{AuthorityState, ServerIdentity};
