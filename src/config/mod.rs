// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Server configuration: the typed [`Config`] tree, its directive-grammar
//! loader, and validation rules.

pub mod applications;
pub mod directives;
pub mod log;
pub mod resources;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub use applications::Application;
use log::{LogLevel, LogSink};
use resources::ResourceDirective;

/// Parsed `ServerName <host>[:<port>]` directive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerNameDirective {
    pub host: String,
    pub port: Option<u16>,
}

impl Default for ServerNameDirective {
    fn default() -> Self {
        Self {
            host: default_host_name(),
            port: None,
        }
    }
}

fn default_host_name() -> String {
    hostname_from_env().unwrap_or_else(|| "localhost".to_string())
}

fn hostname_from_env() -> Option<String> {
    std::env::var("HOSTNAME")
        .ok()
        .map(|h| h.trim_end_matches('.').to_string())
        .filter(|h| !h.is_empty())
}

/// Default listener port, `9000 + (uid mod 1000)`, per the process's own
/// effective user id.
#[cfg(unix)]
pub fn default_port() -> u16 {
    let uid = unsafe { libc::getuid() };
    9000 + (uid % 1000) as u16
}

#[cfg(not(unix))]
pub fn default_port() -> u16 {
    9000
}

fn default_key_file() -> PathBuf {
    PathBuf::from("rauthd.key")
}

/// The full server configuration tree, overlaying directives onto these
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub applications: Vec<Application>,
    #[serde(default)]
    pub log_sink: LogSink,
    #[serde(default)]
    pub log_level: LogLevel,
    pub introspect_group: Option<String>,
    pub register_group: Option<String>,
    pub max_grant_life: i64,
    pub max_token_life: i64,
    #[serde(default)]
    pub basic_auth: bool,
    #[serde(default)]
    pub resources: Vec<ResourceDirective>,
    #[serde(default)]
    pub server_name: ServerNameDirective,
    pub test_password: Option<String>,
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            applications: Vec::new(),
            log_sink: LogSink::default(),
            log_level: LogLevel::default(),
            introspect_group: None,
            register_group: None,
            max_grant_life: 300,
            max_token_life: 604_800,
            basic_auth: false,
            resources: Vec::new(),
            server_name: ServerNameDirective::default(),
            test_password: None,
            key_file: default_key_file(),
            tls_cert: None,
            tls_key: None,
        }
    }
}

impl Config {
    /// Loads a configuration file. `.yaml`/`.yml` files are parsed as a
    /// YAML rendering of [`Config`]; every other extension (including
    /// none) is parsed with the native directive grammar.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let mut config = if is_yaml {
            serde_yml::from_str(&text).context("parsing YAML configuration")?
        } else {
            Config::default()
        };
        if !is_yaml {
            directives::parse_into(&text, &mut config)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Overlays CLI overrides onto a loaded configuration. Each argument
    /// only overrides the field when `Some`.
    pub fn apply_args(
        &mut self,
        server_name: Option<String>,
        port: Option<u16>,
        log_level: Option<LogLevel>,
        test_password: Option<String>,
        key_file: Option<PathBuf>,
    ) {
        if let Some(name) = server_name {
            self.server_name = match name.rsplit_once(':') {
                Some((host, p)) if p.chars().all(|c| c.is_ascii_digit()) => ServerNameDirective {
                    host: host.to_string(),
                    port: p.parse().ok(),
                },
                _ => ServerNameDirective {
                    host: name,
                    port: None,
                },
            };
        }
        if let Some(port) = port {
            self.server_name.port = Some(port);
        }
        if let Some(level) = log_level {
            self.log_level = level;
        }
        if test_password.is_some() {
            self.test_password = test_password;
        }
        if let Some(key_file) = key_file {
            self.key_file = key_file;
        }
    }

    /// Resolves the effective listener port, applying the `9000 +
    /// (uid mod 1000)` default when no `ServerName` port was configured.
    pub fn effective_port(&self) -> u16 {
        self.server_name.port.unwrap_or_else(default_port)
    }

    /// Structural validation beyond what the directive parser already
    /// enforces: client_id uniqueness-with-redirect_uri, resource group
    /// presence, and life-time ordering.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for app in &self.applications {
            if app.client_id.is_empty() {
                bail!("Application client_id must not be empty");
            }
            if app.redirect_uri.is_empty() {
                bail!("Application {} is missing a redirect_uri", app.client_id);
            }
            let key = (app.client_id.clone(), app.redirect_uri.clone());
            if !seen.insert(key) {
                continue; // duplicates collapse per the data model invariant
            }
        }
        for resource in &self.resources {
            if resource.visibility == resources::Visibility::Shared && resource.group.is_none() {
                bail!(
                    "shared resource {} is missing its group",
                    resource.remote_path
                );
            }
        }
        if self.max_grant_life <= 0 {
            bail!("MaxGrantLife must be positive");
        }
        if self.max_token_life <= 0 {
            bail!("MaxTokenLife must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn shared_resource_without_group_is_rejected() {
        let mut config = Config::default();
        config.resources.push(ResourceDirective {
            visibility: resources::Visibility::Shared,
            remote_path: "/p".into(),
            local_path: "/srv/p".into(),
            group: None,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_file_parses_directive_grammar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rauthd.conf");
        std::fs::write(
            &path,
            "Application app1 https://app/cb\nMaxGrantLife 5m\n",
        )
        .unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.applications.len(), 1);
        assert_eq!(config.max_grant_life, 300);
    }
}
