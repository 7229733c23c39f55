// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Token Store (C4): the ordered set of live tokens, keyed by opaque id.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::generate_token_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Grant,
    Access,
    Renewal,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Grant => "grant",
            TokenKind::Access => "access",
            TokenKind::Renewal => "renewal",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub id: String,
    pub kind: TokenKind,
    pub application: Option<String>,
    pub user: String,
    pub uid: u32,
    pub gid: Vec<u32>,
    pub scopes: String,
    pub challenge: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn scope_set(&self) -> HashSet<&str> {
        self.scopes.split_whitespace().collect()
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Parameters for [`TokenStore::create`].
pub struct NewToken<'a> {
    pub kind: TokenKind,
    pub application: Option<&'a str>,
    pub user: &'a str,
    pub uid: u32,
    pub gid: Vec<u32>,
    pub scopes: &'a str,
    pub challenge: Option<&'a str>,
}

/// Reader/writer-locked store of live tokens: `Find` takes a read lock,
/// `Create`/`Delete`/expiry sweeps take a write lock.
pub struct TokenStore {
    tokens: RwLock<HashMap<String, Token>>,
    server_secret: Vec<u8>,
    max_grant_life: i64,
    max_token_life: i64,
}

impl TokenStore {
    pub fn new(server_secret: Vec<u8>, max_grant_life: i64, max_token_life: i64) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            server_secret,
            max_grant_life,
            max_token_life,
        }
    }

    pub fn create(&self, new: NewToken<'_>) -> Token {
        let lifetime = if new.kind == TokenKind::Grant {
            self.max_grant_life
        } else {
            self.max_token_life
        };
        let created_at = Utc::now();
        let mut guard = self.tokens.write().expect("token store lock poisoned");
        let id = loop {
            let candidate = generate_token_id(&self.server_secret);
            if !guard.contains_key(&candidate) {
                break candidate;
            }
        };
        let token = Token {
            id: id.clone(),
            kind: new.kind,
            application: new.application.map(|s| s.to_string()),
            user: new.user.to_string(),
            uid: new.uid,
            gid: new.gid,
            scopes: new.scopes.to_string(),
            challenge: new.challenge.map(|s| s.to_string()),
            created_at,
            expires_at: created_at + chrono::Duration::seconds(lifetime),
        };
        guard.insert(id, token.clone());
        token
    }

    /// Finds a live token. An expired entry found on read is upgraded to
    /// a write lock and removed rather than left to the sweeper.
    pub fn find(&self, id: &str) -> Option<Token> {
        {
            let guard = self.tokens.read().expect("token store lock poisoned");
            match guard.get(id) {
                Some(token) if !token.is_expired() => return Some(token.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        let mut guard = self.tokens.write().expect("token store lock poisoned");
        guard.remove(id);
        None
    }

    /// Atomically looks up, validates, and removes a token (used to
    /// consume a grant token exactly once under concurrent redemption).
    pub fn take_if<F>(&self, id: &str, predicate: F) -> Option<Token>
    where
        F: FnOnce(&Token) -> bool,
    {
        let mut guard = self.tokens.write().expect("token store lock poisoned");
        match guard.get(id) {
            Some(token) if !token.is_expired() && predicate(token) => guard.remove(id),
            _ => None,
        }
    }

    pub fn delete(&self, id: &str) {
        let mut guard = self.tokens.write().expect("token store lock poisoned");
        guard.remove(id);
    }

    /// Removes every expired entry. Intended to be driven by a periodic
    /// background task.
    pub fn sweep_expired(&self) -> usize {
        let mut guard = self.tokens.write().expect("token store lock poisoned");
        let before = guard.len();
        guard.retain(|_, token| !token.is_expired());
        before - guard.len()
    }

    pub fn len(&self) -> usize {
        self.tokens.read().expect("token store lock poisoned").len()
    }
}

/// Spawns the background expiry sweep as an ordinary Tokio task woken on
/// an interval, independent of any client request.
pub fn spawn_sweeper(store: std::sync::Arc<TokenStore>, interval: StdDuration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = store.sweep_expired();
            if removed > 0 {
                log::debug!("expired {removed} token(s)");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TokenStore {
        TokenStore::new(b"secret".to_vec(), 300, 604_800)
    }

    fn new_grant<'a>() -> NewToken<'a> {
        NewToken {
            kind: TokenKind::Grant,
            application: Some("app1"),
            user: "alice",
            uid: 1000,
            gid: vec![1000],
            scopes: "private shared",
            challenge: None,
        }
    }

    #[test]
    fn create_then_find_returns_same_entity() {
        let store = store();
        let token = store.create(new_grant());
        let found = store.find(&token.id).unwrap();
        assert_eq!(found.id, token.id);
        assert_eq!(found.user, "alice");
    }

    #[test]
    fn delete_makes_token_unfindable() {
        let store = store();
        let token = store.create(new_grant());
        store.delete(&token.id);
        assert!(store.find(&token.id).is_none());
    }

    #[test]
    fn expired_grant_is_not_found_and_removed() {
        let store = TokenStore::new(b"secret".to_vec(), -1, 604_800);
        let token = store.create(new_grant());
        assert!(store.find(&token.id).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn take_if_consumes_exactly_once_under_concurrency() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let store = Arc::new(store());
        let token = store.create(new_grant());
        let successes = Arc::new(AtomicUsize::new(0));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let store = Arc::clone(&store);
                let successes = Arc::clone(&successes);
                let id = token.id.clone();
                scope.spawn(move || {
                    if store.take_if(&id, |_| true).is_some() {
                        successes.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(successes.load(Ordering::SeqCst), 1);
        assert!(store.find(&token.id).is_none());
    }
}
