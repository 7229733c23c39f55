// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Parser for the server's native, line-oriented directive grammar.
//!
//! One directive per line, case-insensitive keyword, space-separated
//! value. Blank lines and lines starting with `#` are ignored. This is
//! the normative configuration format; [`super::Config::from_file`] also
//! accepts a YAML rendering of the same [`super::Config`] tree as a
//! secondary convenience loader.

use std::str::FromStr;

use anyhow::{bail, Context, Result};

use super::log::{LogLevel, LogSink};
use super::resources::{ResourceDirective, Visibility};
use super::{Config, ServerNameDirective};

/// Parses a duration written as `<N>` (seconds) or `<N>{m,h,d,w}`.
pub fn parse_duration_seconds(raw: &str) -> Result<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("empty duration");
    }
    let (digits, unit) = match raw.chars().last().filter(|c| c.is_ascii_alphabetic()) {
        Some(c) => (&raw[..raw.len() - 1], Some(c)),
        None => (raw, None),
    };
    let n: i64 = digits
        .parse()
        .with_context(|| format!("invalid duration '{raw}'"))?;
    let seconds = match unit {
        None => n,
        Some('m') => n * 60,
        Some('h') => n * 3600,
        Some('d') => n * 86_400,
        Some('w') => n * 604_800,
        Some(other) => bail!("unknown duration unit '{other}' in '{raw}'"),
    };
    Ok(seconds)
}

fn parse_resource_line(fields: &[&str]) -> Result<ResourceDirective> {
    if fields.len() < 3 {
        bail!("Resource directive requires <scope> <remote> <local>");
    }
    let visibility = match fields[0].to_ascii_lowercase().as_str() {
        "public" => Visibility::Public,
        "private" => Visibility::Private,
        "shared" => Visibility::Shared,
        other => bail!("unknown resource scope '{other}'"),
    };
    let group = fields.get(3).map(|s| s.to_string());
    if visibility == Visibility::Shared && group.is_none() {
        bail!("Resource shared directive requires a trailing <group>");
    }
    Ok(ResourceDirective {
        visibility,
        remote_path: fields[1].to_string(),
        local_path: fields[2].to_string(),
        group,
    })
}

fn parse_server_name(raw: &str) -> ServerNameDirective {
    match raw.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) && !port.is_empty() => {
            ServerNameDirective {
                host: host.to_string(),
                port: port.parse().ok(),
            }
        }
        _ => ServerNameDirective {
            host: raw.to_string(),
            port: None,
        },
    }
}

/// Parses the directive grammar from `text` into `config`, overlaying
/// whatever directives are present (a directive file need not set every
/// field; unset fields keep [`Config::default`]'s values).
pub fn parse_into(text: &str, config: &mut Config) -> Result<()> {
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let keyword = fields
            .next()
            .context("unreachable: non-empty line with no first field")?;
        let rest: Vec<&str> = fields.collect();
        apply_directive(config, keyword, &rest, line)
            .with_context(|| format!("line {}: {line}", lineno + 1))?;
    }
    Ok(())
}

fn apply_directive(config: &mut Config, keyword: &str, rest: &[&str], full_line: &str) -> Result<()> {
    match keyword.to_ascii_lowercase().as_str() {
        "application" => {
            if rest.len() < 2 {
                bail!("Application directive requires <client_id> <redirect_uri> [name...]");
            }
            let mut app = super::applications::Application::new(rest[0], rest[1]);
            if rest.len() > 2 {
                app.client_name = Some(rest[2..].join(" "));
            }
            config.applications.push(app);
        }
        "logfile" => {
            let value = rest.join(" ");
            config.log_sink = match value.to_ascii_lowercase().as_str() {
                "stderr" => LogSink::Stderr,
                "syslog" => LogSink::Syslog,
                "none" => LogSink::None,
                _ => LogSink::File(value.into()),
            };
        }
        "loglevel" => {
            let value = rest.join(" ").to_ascii_lowercase();
            config.log_level = match value.as_str() {
                "error" => LogLevel::Error,
                "info" => LogLevel::Info,
                "debug" => LogLevel::Debug,
                other => bail!("unknown log level '{other}'"),
            };
        }
        "introspectgroup" => {
            config.introspect_group = rest.first().map(|s| s.to_string());
        }
        "registergroup" => {
            config.register_group = rest.first().map(|s| s.to_string());
        }
        "maxgrantlife" => {
            let raw = rest.first().context("MaxGrantLife requires a value")?;
            config.max_grant_life = parse_duration_seconds(raw)?;
        }
        "maxtokenlife" => {
            let raw = rest.first().context("MaxTokenLife requires a value")?;
            config.max_token_life = parse_duration_seconds(raw)?;
        }
        "option" => {
            let value = rest.first().map(|s| s.to_ascii_lowercase());
            match value.as_deref() {
                Some("basicauth") => config.basic_auth = true,
                _ => bail!("unknown Option '{full_line}'"),
            }
        }
        "resource" => {
            config.resources.push(parse_resource_line(rest)?);
        }
        "servername" => {
            let raw = rest.join(" ");
            config.server_name = parse_server_name(&raw);
        }
        "testpassword" => {
            config.test_password = Some(rest.join(" "));
        }
        other => bail!("unknown directive '{other}'"),
    }
    Ok(())
}

impl FromStr for Visibility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            "shared" => Ok(Visibility::Shared),
            other => bail!("unknown resource scope '{other}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_parse_bare_and_suffixed() {
        assert_eq!(parse_duration_seconds("300").unwrap(), 300);
        assert_eq!(parse_duration_seconds("1s").is_err(), true);
        assert_eq!(parse_duration_seconds("5m").unwrap(), 300);
        assert_eq!(parse_duration_seconds("2h").unwrap(), 7200);
        assert_eq!(parse_duration_seconds("1d").unwrap(), 86_400);
        assert_eq!(parse_duration_seconds("1w").unwrap(), 604_800);
    }

    #[test]
    fn full_config_round_trips() {
        let text = "\
Application app1 https://app/cb Example App
LogFile stderr
LogLevel debug
IntrospectGroup admin
MaxGrantLife 1m
MaxTokenLife 1w
Option BasicAuth
Resource public /p/public /srv/public
Resource shared /p/shared /srv/shared ops
ServerName auth.example.com:9443
TestPassword hunter2
";
        let mut config = Config::default();
        parse_into(text, &mut config).unwrap();
        assert_eq!(config.applications.len(), 1);
        assert_eq!(config.applications[0].client_id, "app1");
        assert_eq!(config.applications[0].client_name.as_deref(), Some("Example App"));
        assert_eq!(config.log_sink, LogSink::Stderr);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.introspect_group.as_deref(), Some("admin"));
        assert_eq!(config.max_grant_life, 60);
        assert_eq!(config.max_token_life, 604_800);
        assert!(config.basic_auth);
        assert_eq!(config.resources.len(), 2);
        assert_eq!(config.server_name.host, "auth.example.com");
        assert_eq!(config.server_name.port, Some(9443));
        assert_eq!(config.test_password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn unknown_directive_is_rejected() {
        let mut config = Config::default();
        assert!(parse_into("Bogus x y\n", &mut config).is_err());
    }
}
