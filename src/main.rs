// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the rauthd OAuth 2.0 authorization server.

mod authority;
mod client;
mod config;
mod crypto;
mod http;
mod utility;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use config::log::LogLevel;
use config::Config;
use log::info;
use rocket::figment::Figment;
use tokio::signal;

/// rauthd: an OAuth 2.0 Authorization Server and OpenID Connect 1.0
/// Provider backed by the local operating-system account database.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the directive-grammar (or YAML) configuration file.
    #[arg(long, default_value = "rauthd.conf")]
    config: PathBuf,

    /// Overrides `ServerName` (accepts `host` or `host:port`).
    #[arg(long)]
    server_name: Option<String>,

    /// Overrides the listener port regardless of `ServerName`.
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Overrides `TestPassword`, bypassing the Authenticator for tests.
    #[arg(long)]
    test_password: Option<String>,

    /// Overrides the path to the persisted RS256 signing key.
    #[arg(long)]
    key_file: Option<PathBuf>,

    /// Parses and validates a configuration file, then exits.
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Enable verbose logging (debug level), overriding `LogLevel`.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output, overriding `LogLevel`.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[rocket::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(validate_path) = args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "configuration file does not exist: {}",
                validate_path.display()
            ));
        }
        Config::from_file(&validate_path)
            .with_context(|| format!("configuration validation failed for {}", validate_path.display()))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    // Initialize the default crypto provider for rustls before any TLS
    // operation (certificate generation, key persistence, or Rocket's
    // own TLS listener) touches it.
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        rustls::crypto::aws_lc_rs::default_provider()
            .install_default()
            .map_err(|_| anyhow::anyhow!("failed to install a rustls crypto provider"))?;
    }

    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;

    let log_level_override = if args.quiet {
        Some(LogLevel::Error)
    } else if args.verbose {
        Some(LogLevel::Debug)
    } else {
        None
    };
    config.apply_args(
        args.server_name,
        args.port,
        log_level_override,
        args.test_password,
        args.key_file,
    );

    config::log::init(&config.log_sink, config.log_level).context("initializing log sink")?;

    let port = config.effective_port();
    info!(
        "starting rauthd on {}:{port}",
        config.server_name.host
    );

    let (tls_cert, tls_key) = resolve_tls_material(&config)?;

    let state = authority::AuthorityState::bootstrap(config)
        .context("bootstrapping authorization-server state")?;

    let sweeper = authority::tokens::spawn_sweeper(Arc::clone(&state.tokens), Duration::from_secs(60));

    let figment = Figment::from(rocket::Config::default())
        .merge(("address", "0.0.0.0"))
        .merge(("port", port))
        .merge(("ident", "rauthd"))
        .merge(("tls.certs", tls_cert))
        .merge(("tls.key", tls_key));

    let rocket = http::build_rocket(figment, Arc::clone(&state));
    let ignited = rocket.ignite().await.context("igniting Rocket")?;
    let shutdown = ignited.shutdown();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("received shutdown signal, terminating");
            shutdown.notify();
        }
    });

    ignited.launch().await.context("launching Rocket")?;
    sweeper.abort();

    Ok(())
}

/// Resolves the PEM-encoded certificate and key bytes Rocket's TLS
/// listener needs: the configured `TlsCert`/`TlsKey` paths when present,
/// or a freshly generated self-signed pair for the configured server
/// name (TLS is mandatory per the server's external interface; there is
/// no plaintext fallback).
fn resolve_tls_material(config: &Config) -> Result<(Vec<u8>, Vec<u8>)> {
    if let (Some(cert_path), Some(key_path)) = (&config.tls_cert, &config.tls_key) {
        let cert = std::fs::read(cert_path)
            .with_context(|| format!("reading TLS certificate at {}", cert_path.display()))?;
        let key = std::fs::read(key_path)
            .with_context(|| format!("reading TLS key at {}", key_path.display()))?;
        return Ok((cert, key));
    }

    let dir = config
        .key_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let cert_path = dir.join("rauthd-selfsigned.crt");
    let key_path = dir.join("rauthd-selfsigned.key");
    if !cert_path.exists() || !key_path.exists() {
        utility::certificate_utilities::create_self_signed_cert(
            365,
            cert_path.to_str().context("certificate path is not valid UTF-8")?,
            key_path.to_str().context("key path is not valid UTF-8")?,
            &config.server_name.host,
            None,
            None,
        )
        .context("generating self-signed TLS certificate")?;
    }
    let cert = std::fs::read(&cert_path).context("reading generated self-signed certificate")?;
    let key = std::fs::read(&key_path).context("reading generated self-signed key")?;
    Ok((cert, key))
}
