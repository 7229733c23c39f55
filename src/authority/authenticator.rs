// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Authenticator (C6): given a username/password pair, returns success
//! plus the numeric user id and group id list at the time of issuance.
//!
//! This capability is external per the specification's scope — a real
//! deployment wires in the host's account database (PAM on the source
//! platform). Two implementations are provided: [`SystemAuthenticator`],
//! which consults the Unix user/shadow databases, and
//! [`TestPasswordAuthenticator`], which backs the `TestPassword`
//! directive used to bypass the system database in tests.

use async_trait::async_trait;

use crate::crypto::constant_time_eq;

/// Identity returned by a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub uid: u32,
    pub gid: Vec<u32>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> Option<AuthenticatedUser>;
}

/// Bypasses the system database: any username authenticates as long as
/// the supplied password equals the configured `TestPassword`.
pub struct TestPasswordAuthenticator {
    password: String,
}

impl TestPasswordAuthenticator {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }
}

#[async_trait]
impl Authenticator for TestPasswordAuthenticator {
    async fn authenticate(&self, _username: &str, password: &str) -> Option<AuthenticatedUser> {
        if constant_time_eq(password.as_bytes(), self.password.as_bytes()) {
            Some(AuthenticatedUser {
                uid: 1000,
                gid: vec![1000],
            })
        } else {
            None
        }
    }
}

/// Maximum number of supplementary group ids resolved per user.
pub const MAX_GROUPS: usize = 100;

#[cfg(unix)]
mod unix_lookup {
    use std::ffi::{CStr, CString};

    /// Looks up a user's uid and primary gid by name via `getpwnam`.
    pub fn lookup_passwd(username: &str) -> Option<(u32, u32, String)> {
        let cname = CString::new(username).ok()?;
        unsafe {
            let entry = libc::getpwnam(cname.as_ptr());
            if entry.is_null() {
                return None;
            }
            let pw = *entry;
            let hash_ptr = pw.pw_passwd;
            let hash = if hash_ptr.is_null() {
                String::new()
            } else {
                CStr::from_ptr(hash_ptr).to_string_lossy().into_owned()
            };
            Some((pw.pw_uid, pw.pw_gid, hash))
        }
    }

    /// Resolves the supplementary group list for `username`, capped at
    /// [`super::MAX_GROUPS`].
    pub fn lookup_groups(username: &str, primary_gid: u32) -> Vec<u32> {
        let cname = match CString::new(username) {
            Ok(c) => c,
            Err(_) => return vec![primary_gid],
        };
        let mut ngroups: i32 = super::MAX_GROUPS as i32;
        let mut groups: Vec<libc::gid_t> = vec![0; super::MAX_GROUPS];
        unsafe {
            libc::getgrouplist(
                cname.as_ptr(),
                primary_gid as libc::gid_t,
                groups.as_mut_ptr(),
                &mut ngroups,
            );
        }
        let ngroups = ngroups.max(0) as usize;
        groups.truncate(ngroups.min(super::MAX_GROUPS));
        groups.into_iter().map(|g| g as u32).collect()
    }
}

/// Authenticates against the host's user and shadow-password databases.
///
/// The shadow password (when readable — typically requires elevated
/// privileges) is verified with [`pwhash`]'s crypt-compatible hash
/// comparison, matching the `$1$`/`$5$`/`$6$`/`$apr1$` formats produced
/// by `openssl passwd`/`mkpasswd`.
#[cfg(unix)]
pub struct SystemAuthenticator;

#[cfg(unix)]
#[async_trait]
impl Authenticator for SystemAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> Option<AuthenticatedUser> {
        let username = username.to_string();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || {
            let (uid, gid, passwd_hash) = unix_lookup::lookup_passwd(&username)?;
            let hash = if passwd_hash == "x" || passwd_hash.is_empty() {
                read_shadow_hash(&username)?
            } else {
                passwd_hash
            };
            if !pwhash::unix::verify(&password, &hash) {
                return None;
            }
            let groups = unix_lookup::lookup_groups(&username, gid);
            Some(AuthenticatedUser { uid, gid: groups })
        })
        .await
        .ok()
        .flatten()
    }
}

/// Resolves a group reference (`IntrospectGroup`, `RegisterGroup`, or a
/// shared resource's group) to a numeric gid. A purely numeric reference
/// is taken as the gid directly; anything else is looked up by name via
/// `getgrnam`.
#[cfg(unix)]
pub fn resolve_group_id(reference: &str) -> Option<u32> {
    if let Ok(gid) = reference.parse::<u32>() {
        return Some(gid);
    }
    let cname = std::ffi::CString::new(reference).ok()?;
    unsafe {
        let entry = libc::getgrnam(cname.as_ptr());
        if entry.is_null() {
            return None;
        }
        Some((*entry).gr_gid)
    }
}

#[cfg(not(unix))]
pub fn resolve_group_id(reference: &str) -> Option<u32> {
    reference.parse::<u32>().ok()
}

#[cfg(unix)]
fn read_shadow_hash(username: &str) -> Option<String> {
    let contents = std::fs::read_to_string("/etc/shadow").ok()?;
    for line in contents.lines() {
        let mut fields = line.split(':');
        if fields.next() == Some(username) {
            return fields.next().map(|s| s.to_string());
        }
    }
    None
}

#[cfg(not(unix))]
pub struct SystemAuthenticator;

#[cfg(not(unix))]
#[async_trait]
impl Authenticator for SystemAuthenticator {
    async fn authenticate(&self, _username: &str, _password: &str) -> Option<AuthenticatedUser> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_password_authenticator_accepts_matching_password() {
        let auth = TestPasswordAuthenticator::new("hunter2");
        assert!(auth.authenticate("anyone", "hunter2").await.is_some());
        assert!(auth.authenticate("anyone", "wrong").await.is_none());
    }

    /// Any code that takes `&dyn Authenticator` (the token routes, the
    /// `Identity` guard) can be driven from a mock instead of standing up
    /// a real Unix account, independent of whichever host this runs on.
    #[tokio::test]
    async fn callers_work_against_a_mocked_authenticator() {
        let mut mock = MockAuthenticator::new();
        mock.expect_authenticate()
            .withf(|username, password| username == "alice" && password == "correct-horse")
            .returning(|_, _| {
                Some(AuthenticatedUser {
                    uid: 4242,
                    gid: vec![4242, 100],
                })
            });
        mock.expect_authenticate().returning(|_, _| None);

        let identity = mock.authenticate("alice", "correct-horse").await;
        assert_eq!(identity, Some(AuthenticatedUser { uid: 4242, gid: vec![4242, 100] }));
        assert!(mock.authenticate("alice", "wrong").await.is_none());
    }
}
