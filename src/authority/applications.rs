// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Application Registry (C3): the ordered set of registered clients.

use std::sync::Mutex;

use crate::config::Application;

/// Thread-safe registry of registered OAuth2 clients.
///
/// A mutex guards the whole collection; critical sections are short
/// (a linear scan plus at most one push), so contention is not a
/// concern at this scale.
pub struct ApplicationRegistry {
    applications: Mutex<Vec<Application>>,
}

impl ApplicationRegistry {
    pub fn new(applications: Vec<Application>) -> Self {
        Self {
            applications: Mutex::new(applications),
        }
    }

    /// Adds `app`, collapsing into the existing entry if one already
    /// shares both `client_id` and `redirect_uri`.
    pub fn add(&self, app: Application) -> Application {
        let mut guard = self.applications.lock().expect("application registry lock poisoned");
        if let Some(existing) = guard
            .iter()
            .find(|a| a.client_id == app.client_id && a.redirect_uri == app.redirect_uri)
        {
            return existing.clone();
        }
        guard.push(app.clone());
        app
    }

    /// Finds an application. When `redirect_uri` is `Some`, the match is
    /// exact on both fields; when `None`, the first entry matching
    /// `client_id` in insertion order is returned.
    pub fn find(&self, client_id: &str, redirect_uri: Option<&str>) -> Option<Application> {
        let guard = self.applications.lock().expect("application registry lock poisoned");
        match redirect_uri {
            Some(uri) => guard
                .iter()
                .find(|a| a.client_id == client_id && a.redirect_uri == uri)
                .cloned(),
            None => guard.iter().find(|a| a.client_id == client_id).cloned(),
        }
    }
}
