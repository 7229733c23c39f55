// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # OAuth Client Helper
//!
//! A small CLI front-end for [`rauthd::client`] (C12): discovers an
//! authorization server's endpoints from a root URL and opens the
//! PKCE-protected authorization URL in the user's browser.
//!
//! ## Usage
//!
//! ```text
//! oauth-client --server https://auth.example.com --client-id app1 \
//!     --redirect-uri https://app/cb [--scope "private shared"] [--no-pkce]
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use rauthd::client::{self, AuthorizeRequest};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Discover an OAuth2 server and open its authorization URL")]
struct Args {
    /// Root URL of the authorization server (discovery is attempted at
    /// the RFC 8414 / OpenID well-known paths).
    #[clap(long)]
    server: String,

    /// Registered client_id to authorize as.
    #[clap(long)]
    client_id: String,

    /// Registered redirect_uri for this client.
    #[clap(long)]
    redirect_uri: String,

    /// Opaque state value echoed back by the server.
    #[clap(long)]
    state: Option<String>,

    /// Space-separated scopes to request.
    #[clap(long)]
    scope: Option<String>,

    /// Skip PKCE code_challenge generation (not recommended).
    #[clap(long, default_value_t = false)]
    no_pkce: bool,

    /// Print the assembled authorization URL instead of opening a browser.
    #[clap(long, default_value_t = false)]
    print_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let endpoints = client::connect(&args.server)
        .await
        .with_context(|| format!("discovering endpoints at {}", args.server))?;
    log::info!("discovered issuer {}", endpoints.issuer);

    let code_verifier = if args.no_pkce {
        None
    } else {
        Some(client::generate_code_verifier())
    };

    let request = AuthorizeRequest {
        client_id: &args.client_id,
        redirect_uri: &args.redirect_uri,
        state: args.state.as_deref(),
        code_verifier: code_verifier.as_deref(),
        scope: args.scope.as_deref(),
    };
    let url = client::authorize_url(&endpoints, &request)?;

    if let Some(verifier) = &code_verifier {
        println!("code_verifier (retain this to redeem the code at the token endpoint): {verifier}");
    }

    if args.print_only {
        println!("{url}");
    } else {
        client::open_authorize_url(&url)?;
        println!("Opened authorization URL in your browser:\n{url}");
    }

    Ok(())
}
