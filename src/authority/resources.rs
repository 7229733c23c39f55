// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Resource Registry (C5): scope-tagged static resources, looked up by
//! longest matching `remote_path` prefix.

use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::config::resources::{ResourceDirective, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    ExplicitDirectory,
    UserWildcardDirectory,
    ExplicitFile,
    CachedFile,
    StaticBlob,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceScope {
    Public,
    Private,
    Shared { group: String },
}

#[derive(Debug, Clone)]
pub struct Resource {
    pub kind: ResourceKind,
    pub remote_path: String,
    pub local_path: String,
    pub content_type: Option<String>,
    pub scope: ResourceScope,
}

impl From<ResourceDirective> for Resource {
    fn from(d: ResourceDirective) -> Self {
        let kind = if d.local_path.contains("{user}") {
            ResourceKind::UserWildcardDirectory
        } else if d.local_path.ends_with('/') {
            ResourceKind::ExplicitDirectory
        } else {
            ResourceKind::ExplicitFile
        };
        let scope = match d.visibility {
            Visibility::Public => ResourceScope::Public,
            Visibility::Private => ResourceScope::Private,
            Visibility::Shared => ResourceScope::Shared {
                group: d.group.expect("validated at config load time"),
            },
        };
        Resource {
            kind,
            remote_path: d.remote_path,
            local_path: d.local_path,
            content_type: None,
            scope,
        }
    }
}

/// A match against the registry: the matching resource, the resolved
/// local filesystem path (with any `{user}` wildcard substituted), and
/// the `stat()` result when the resource is filesystem-backed.
pub struct ResourceMatch {
    pub resource: Resource,
    pub resolved_local_path: Option<PathBuf>,
    pub file_info: Option<fs::Metadata>,
}

/// Joins the request-path suffix left over after the longest-prefix match
/// onto a directory resource's `local_path` (spec §4.3/§4.7: resolved
/// local name is `local_path + (request_path - remote_path)`).
fn join_remaining(local_path: &str, remote_path: &str, path: &str) -> PathBuf {
    let suffix = path[remote_path.len()..].trim_start_matches('/');
    if suffix.is_empty() {
        PathBuf::from(local_path)
    } else {
        PathBuf::from(local_path).join(suffix)
    }
}

/// Reader/writer-locked, read-dominated registry.
pub struct ResourceRegistry {
    resources: RwLock<Vec<Resource>>,
}

impl ResourceRegistry {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self {
            resources: RwLock::new(resources),
        }
    }

    pub fn add(&self, resource: Resource) {
        self.resources.write().expect("resource registry lock poisoned").push(resource);
    }

    /// Longest-prefix match on `remote_path`, ties broken by insertion
    /// order (the first-seen entry among equally long prefixes wins).
    pub fn find(&self, path: &str, authenticated_user: Option<&str>) -> Option<ResourceMatch> {
        let guard = self.resources.read().expect("resource registry lock poisoned");
        let best = guard
            .iter()
            .enumerate()
            .filter(|(_, r)| path.starts_with(r.remote_path.as_str()))
            .max_by_key(|(idx, r)| (r.remote_path.len(), std::cmp::Reverse(*idx)))
            .map(|(_, r)| r.clone())?;

        let resolved_local_path = match best.kind {
            ResourceKind::UserWildcardDirectory => authenticated_user.map(|user| {
                let local = best.local_path.replace("{user}", user);
                join_remaining(&local, &best.remote_path, path)
            }),
            ResourceKind::ExplicitDirectory => Some(join_remaining(&best.local_path, &best.remote_path, path)),
            _ => Some(PathBuf::from(&best.local_path)),
        };
        let file_info = resolved_local_path
            .as_ref()
            .and_then(|p| fs::metadata(p).ok());

        Some(ResourceMatch {
            resource: best,
            resolved_local_path,
            file_info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(remote: &str) -> Resource {
        Resource {
            kind: ResourceKind::ExplicitFile,
            remote_path: remote.to_string(),
            local_path: "/tmp/does-not-matter".to_string(),
            content_type: None,
            scope: ResourceScope::Public,
        }
    }

    #[test]
    fn longest_prefix_wins() {
        let registry = ResourceRegistry::new(vec![resource("/p"), resource("/p/sub")]);
        let found = registry.find("/p/sub/file", None).unwrap();
        assert_eq!(found.resource.remote_path, "/p/sub");
    }

    #[test]
    fn no_match_returns_none() {
        let registry = ResourceRegistry::new(vec![resource("/p")]);
        assert!(registry.find("/other", None).is_none());
    }

    #[test]
    fn explicit_directory_joins_remaining_path_suffix() {
        let dir_resource = Resource {
            kind: ResourceKind::ExplicitDirectory,
            remote_path: "/p".to_string(),
            local_path: "/srv/p/".to_string(),
            content_type: None,
            scope: ResourceScope::Public,
        };
        let registry = ResourceRegistry::new(vec![dir_resource]);
        let found = registry.find("/p/a.txt", None).unwrap();
        assert_eq!(found.resolved_local_path.unwrap(), PathBuf::from("/srv/p/a.txt"));
    }

    #[test]
    fn explicit_directory_with_no_suffix_resolves_to_directory_itself() {
        let dir_resource = Resource {
            kind: ResourceKind::ExplicitDirectory,
            remote_path: "/p".to_string(),
            local_path: "/srv/p/".to_string(),
            content_type: None,
            scope: ResourceScope::Public,
        };
        let registry = ResourceRegistry::new(vec![dir_resource]);
        let found = registry.find("/p", None).unwrap();
        assert_eq!(found.resolved_local_path.unwrap(), PathBuf::from("/srv/p/"));
    }

    #[test]
    fn user_wildcard_directory_substitutes_user_then_joins_suffix() {
        let dir_resource = Resource {
            kind: ResourceKind::UserWildcardDirectory,
            remote_path: "/home".to_string(),
            local_path: "/srv/users/{user}/".to_string(),
            content_type: None,
            scope: ResourceScope::Private,
        };
        let registry = ResourceRegistry::new(vec![dir_resource]);
        let found = registry.find("/home/docs/report.pdf", Some("alice")).unwrap();
        assert_eq!(
            found.resolved_local_path.unwrap(),
            PathBuf::from("/srv/users/alice/docs/report.pdf")
        );
    }
}
