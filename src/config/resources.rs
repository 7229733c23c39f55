// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration-level description of a scope-gated resource.
//!
//! This is the directive-file shape; [`crate::authority::resources`] turns
//! each entry into a live [`crate::authority::resources::Resource`] served
//! from the registry.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
    Shared,
}

/// One `Resource` directive: `Resource {public|private|shared} <remote> <local> [<group>]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceDirective {
    pub visibility: Visibility,
    pub remote_path: String,
    pub local_path: String,
    /// Required when `visibility == Shared`.
    pub group: Option<String>,
}
